//! クライアント設定
//!
//! 既定値はテスト対象サーバーのローカル構成に合わせてある。
//! 環境変数 (または `.env`) で個別に上書きできる。

use std::time::Duration;

use tracing::warn;

use crate::error::ClientError;
use crate::state::Scenario;

pub const ENV_BASE_URL: &str = "BATTLE_CLIENT_BASE_URL";
pub const ENV_PROMPT: &str = "BATTLE_CLIENT_PROMPT";
pub const ENV_OLLAMA_TEST_TIMEOUT: &str = "BATTLE_CLIENT_OLLAMA_TEST_TIMEOUT";
pub const ENV_CHAT_TIMEOUT: &str = "BATTLE_CLIENT_CHAT_TIMEOUT";
pub const ENV_COMMAND_TIMEOUT: &str = "BATTLE_CLIENT_COMMAND_TIMEOUT";
pub const ENV_SCENARIOS: &str = "BATTLE_CLIENT_SCENARIOS";

/// クライアント設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// サーバーのベースURL (末尾の `/` なし)
    pub base_url: String,
    /// GET エンドポイントへ送るプロンプト
    pub prompt: String,
    /// `/ollama_test` のタイムアウト（秒）
    pub ollama_test_timeout_secs: u64,
    /// `/chat` のタイムアウト（秒）
    pub chat_timeout_secs: u64,
    /// `/command` のタイムアウト（秒）
    pub command_timeout_secs: u64,
    /// `/command` へ順に送るシナリオ
    pub scenarios: Vec<Scenario>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888".to_string(),
            prompt: "just say hi".to_string(),
            // NOTE: Keep in sync with tests/config_tests.rs.
            ollama_test_timeout_secs: 30,
            chat_timeout_secs: 10,
            command_timeout_secs: 30,
            scenarios: vec![Scenario::Case1],
        }
    }
}

impl Config {
    /// 既定値で設定を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// `.env` を読み込んだうえで環境変数から設定を作る。
    ///
    /// 不正な値を含む項目は既定値のまま残し、その項目のエラーを返す。
    /// エラーは致命的ではないので呼び出し側は報告だけして続行してよい。
    pub fn from_env() -> (Self, Vec<ClientError>) {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を作る（テスト用に分離）
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<ClientError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(url) = lookup(ENV_BASE_URL) {
            let trimmed = url.trim().trim_end_matches('/');
            if trimmed.is_empty() {
                errors.push(ClientError::Config(format!("{ENV_BASE_URL} is empty")));
            } else {
                config.base_url = trimmed.to_string();
            }
        }
        if let Some(prompt) = lookup(ENV_PROMPT) {
            config.prompt = prompt;
        }

        let timeouts = [
            (ENV_OLLAMA_TEST_TIMEOUT, &mut config.ollama_test_timeout_secs),
            (ENV_CHAT_TIMEOUT, &mut config.chat_timeout_secs),
            (ENV_COMMAND_TIMEOUT, &mut config.command_timeout_secs),
        ];
        for (key, slot) in timeouts {
            let Some(raw) = lookup(key) else { continue };
            match parse_timeout(&raw) {
                Ok(secs) => *slot = secs,
                Err(msg) => errors.push(ClientError::Config(format!("{key}: {msg}"))),
            }
        }

        if let Some(raw) = lookup(ENV_SCENARIOS) {
            match parse_scenarios(&raw) {
                Ok(list) => config.scenarios = list,
                Err(msg) => errors.push(ClientError::Config(format!("{ENV_SCENARIOS}: {msg}"))),
            }
        }

        for e in &errors {
            warn!(target: "config", error = %e, "config_value_ignored");
        }
        (config, errors)
    }

    pub fn ollama_test_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama_test_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn parse_timeout(raw: &str) -> Result<u64, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("timeout must be at least 1 second".to_string()),
        Ok(secs) => Ok(secs),
        Err(e) => Err(format!("invalid number {raw:?}: {e}")),
    }
}

fn parse_scenarios(raw: &str) -> Result<Vec<Scenario>, String> {
    let list = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .ok()
                .and_then(Scenario::from_number)
                .ok_or_else(|| format!("unknown scenario {s:?} (expected 1-4)"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if list.is_empty() {
        return Err("no scenarios listed".to_string());
    }
    Ok(list)
}
