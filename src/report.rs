//! 結果の出力
//!
//! 成功は標準出力、失敗は標準エラーへ。テストでは任意の `Write` を渡せる。

use std::io::{self, Stderr, Stdout, Write};

use crate::error::ClientError;
use crate::unwrap::{ChatReply, DecisionResult};

pub struct Reporter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl Reporter<Stdout, Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// 書き込み先を取り出す（テスト用）
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    // 出力の失敗は報告しようがないので無視する

    pub fn chat_reply(&mut self, label: &str, reply: &ChatReply) {
        let kind = match reply {
            ChatReply::Text(_) => "text",
            ChatReply::Json(_) => "json",
        };
        let _ = writeln!(self.out, "[{label}] response ({kind}):");
        let _ = writeln!(self.out, "{reply}");
    }

    /// 本文をそのまま表示（`/chat` 用）
    pub fn raw_text(&mut self, label: &str, body: &[u8]) {
        let _ = writeln!(self.out, "[{label}] server response:");
        let _ = writeln!(self.out, "{}", String::from_utf8_lossy(body));
    }

    pub fn decision(&mut self, label: &str, decision: &DecisionResult) {
        let _ = writeln!(self.out, "[{label}] decision:");
        let _ = writeln!(self.out, "{}", decision.to_pretty());
    }

    pub fn warning(&mut self, label: &str, message: &str) {
        let _ = writeln!(self.err, "[{label}] warning: {message}");
    }

    /// 失敗を表示。`body` はサーバーからの生の応答（届いていれば）。
    pub fn failure(&mut self, label: &str, error: &ClientError, body: Option<&[u8]>) {
        let _ = writeln!(self.err, "[{label}] {} failed: {error}", error.stage());
        match error {
            ClientError::OuterParse { raw, .. } => {
                let _ = writeln!(self.err, "[{label}] raw body:");
                let _ = writeln!(self.err, "{raw}");
            }
            ClientError::InnerParse { raw, .. } => {
                let _ = writeln!(self.err, "[{label}] unwrapped string:");
                let _ = writeln!(self.err, "{raw}");
                if let Some(body) = body {
                    let _ = writeln!(self.err, "[{label}] full server response:");
                    let _ = writeln!(self.err, "{}", String::from_utf8_lossy(body));
                }
            }
            _ => {}
        }
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn buffers() -> Reporter<Vec<u8>, Vec<u8>> {
        Reporter::new(Vec::new(), Vec::new())
    }

    fn split(r: Reporter<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (o, e) = r.into_inner();
        (String::from_utf8(o).unwrap(), String::from_utf8(e).unwrap())
    }

    #[test]
    fn success_goes_to_stdout() {
        let mut r = buffers();
        r.decision("POST /command", &DecisionResult::new(json!({"robot1": "대기"})));
        let (out, err) = split(r);
        assert!(out.contains("\"robot1\": \"대기\""));
        assert!(err.is_empty());
    }

    #[test]
    fn inner_failure_echoes_string_and_body() {
        let mut r = buffers();
        let e = ClientError::InnerParse { message: "expected value".into(), raw: "hello".into() };
        r.failure("POST /command", &e, Some(&br#"{"response":"hello"}"#[..]));
        let (out, err) = split(r);
        assert!(out.is_empty());
        assert!(err.contains("inner_parse failed"));
        assert!(err.contains("\nhello\n"));
        assert!(err.contains(r#"{"response":"hello"}"#));
    }

    #[test]
    fn transport_failure_has_no_raw_echo() {
        let mut r = buffers();
        r.failure("GET /chat", &ClientError::Transport("connection refused".into()), None);
        let (_, err) = split(r);
        assert_eq!(err, "[GET /chat] transport failed: request failed: connection refused\n");
    }
}
