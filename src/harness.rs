//! テストハーネス: エンドポイントごとの1回の呼び出しと、その一連の実行
//!
//! 各関数は自分のエラーをその場で Reporter に出力してから返す。
//! 1つの呼び出しが失敗しても [`run_all`] は次の呼び出しへ進む。

use std::io::Write;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::report::Reporter;
use crate::request::{PreparedRequest, ENDPOINT_CHAT, ENDPOINT_OLLAMA_TEST};
use crate::state::{BattleState, Scenario};
use crate::transport::Transport;
use crate::unwrap::{unwrap_chat_reply, unwrap_decision, ChatReply, DecisionResult};

/// `GET /ollama_test`: 応答を取り出し、フェンス付きなら JSON として解釈
#[instrument(name = "run_ollama_test", skip(transport, reporter))]
pub fn run_ollama_test<O: Write, E: Write>(
    transport: &Transport,
    reporter: &mut Reporter<O, E>,
    base_url: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<ChatReply, ClientError> {
    let label = format!("GET /{ENDPOINT_OLLAMA_TEST}");
    let mut body = None;
    let result = PreparedRequest::get_prompt(base_url, ENDPOINT_OLLAMA_TEST, prompt, timeout)
        .and_then(|req| transport.send(&req))
        .and_then(|resp| {
            let reply = unwrap_chat_reply(&resp.body);
            body = Some(resp.body);
            reply
        });
    match &result {
        Ok(reply) => reporter.chat_reply(&label, reply),
        Err(e) => report_failure(reporter, &label, e, body.as_deref()),
    }
    result
}

/// `GET /chat`: 本文をそのまま表示する（JSON として解釈しない）
#[instrument(name = "run_chat", skip(transport, reporter))]
pub fn run_chat<O: Write, E: Write>(
    transport: &Transport,
    reporter: &mut Reporter<O, E>,
    base_url: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<Vec<u8>, ClientError> {
    let label = format!("GET /{ENDPOINT_CHAT}");
    let result = PreparedRequest::get_prompt(base_url, ENDPOINT_CHAT, prompt, timeout)
        .and_then(|req| transport.send(&req))
        .map(|resp| resp.body);
    match &result {
        Ok(body) => reporter.raw_text(&label, body),
        Err(e) => report_failure(reporter, &label, e, None),
    }
    result
}

/// `POST /command`: 戦況を送り、判断結果を JSON として取り出す
#[instrument(name = "run_command", skip(transport, reporter, state))]
pub fn run_command<O: Write, E: Write>(
    transport: &Transport,
    reporter: &mut Reporter<O, E>,
    base_url: &str,
    label: &str,
    state: BattleState,
    timeout: Duration,
) -> Result<DecisionResult, ClientError> {
    let allowed = state.possible_responses.clone();
    let req = PreparedRequest::post_command(base_url, state, timeout);
    let mut body = None;
    let result = transport.send(&req).and_then(|resp| {
        let decision = unwrap_decision(&resp.body);
        body = Some(resp.body);
        decision
    });
    match &result {
        Ok(decision) => {
            reporter.decision(label, decision);
            for (robot, action) in decision.unknown_actions(&allowed[..]) {
                warn!(target: "harness", robot, action, "action_not_in_possible_responses");
                reporter.warning(label, &format!("{robot}: {action:?} is not a possible response"));
            }
        }
        Err(e) => report_failure(reporter, label, e, body.as_deref()),
    }
    result
}

/// `run_command` for a reference scenario, then compare the decision with
/// the scenario's worked answer. Differences are reported, not failures.
pub fn run_scenario<O: Write, E: Write>(
    transport: &Transport,
    reporter: &mut Reporter<O, E>,
    base_url: &str,
    scenario: Scenario,
    timeout: Duration,
) -> Result<DecisionResult, ClientError> {
    let label = command_label(scenario);
    let result = run_command(transport, reporter, base_url, &label, scenario.battle_state(), timeout);
    if let Ok(decision) = &result {
        let expected = DecisionResult::new(scenario.expected_decision());
        for (robot, got, want) in decision.action_mismatches(&expected) {
            info!(target: "harness", %scenario, robot, got, want, "decision_differs_from_reference");
            reporter.warning(
                &label,
                &format!(
                    "{robot}: got {:?}, reference answer {:?}",
                    got.unwrap_or("-"),
                    want.unwrap_or("-")
                ),
            );
        }
    }
    result
}

fn report_failure<O: Write, E: Write>(
    reporter: &mut Reporter<O, E>,
    label: &str,
    error: &ClientError,
    body: Option<&[u8]>,
) {
    warn!(target: "harness", label, stage = error.stage(), error = %error, "call_failed");
    reporter.failure(label, error, body);
}

/// 実行結果の集計
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record<T>(&mut self, result: &Result<T, ClientError>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// 設定された呼び出しを順に実行する。失敗しても途中で止めない。
///
/// 順序: `/ollama_test`, `/chat`, `/command` (シナリオごと)
pub fn run_all<O: Write, E: Write>(config: &Config, reporter: &mut Reporter<O, E>) -> RunSummary {
    let transport = Transport::new();
    let mut summary = RunSummary::default();

    let r = run_ollama_test(&transport, reporter, &config.base_url, &config.prompt, config.ollama_test_timeout());
    summary.record(&r);

    let r = run_chat(&transport, reporter, &config.base_url, &config.prompt, config.chat_timeout());
    summary.record(&r);

    for scenario in &config.scenarios {
        let r = run_scenario(&transport, reporter, &config.base_url, *scenario, config.command_timeout());
        summary.record(&r);
    }

    reporter.flush();
    info!(target: "harness", succeeded = summary.succeeded, failed = summary.failed, "run_complete");
    summary
}

pub fn command_label(scenario: Scenario) -> String {
    format!("POST /command {scenario}")
}
