//! Response unwrapping.
//!
//! Bodies look like `{"response": "<string>"}`. The string may hold a fenced
//! block (```` ```json ... ``` ````) produced by the model behind the server.
//!
//! Two strategies exist and they differ on purpose:
//! * [`unwrap_chat_reply`] (`/ollama_test`): only a fenced string is parsed as
//!   JSON, anything else is returned as plain text.
//! * [`unwrap_decision`] (`/command`): the string is always parsed as JSON,
//!   fence or not.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

pub const RESPONSE_FIELD: &str = "response";
pub const FENCE_OPEN: &str = "```json";
pub const FENCE_CLOSE: &str = "```";
pub const DESCRIPTION_FIELD: &str = "description";

/// Stage 1: parse the body and pull out the `response` string.
pub fn extract_response_field(raw: &[u8]) -> Result<String, ClientError> {
    let outer_error = |message: String| ClientError::OuterParse {
        message,
        raw: String::from_utf8_lossy(raw).into_owned(),
    };
    let parsed: Value = serde_json::from_slice(raw).map_err(|e| outer_error(e.to_string()))?;
    match parsed.get(RESPONSE_FIELD) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(outer_error(format!(
            "field `{RESPONSE_FIELD}` is not a string (got {})",
            json_kind(other)
        ))),
        None => Err(outer_error(format!("field `{RESPONSE_FIELD}` is missing"))),
    }
}

/// Strip a leading ```` ```json ```` marker and, if present afterwards, a
/// trailing ```` ``` ````. The opening marker must be an exact prefix.
/// Returns `None` when the string does not start with the marker.
pub fn strip_json_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE_OPEN)?;
    Some(rest.strip_suffix(FENCE_CLOSE).unwrap_or(rest))
}

fn parse_inner(inner: &str, original: &str) -> Result<Value, ClientError> {
    serde_json::from_str(inner).map_err(|e| ClientError::InnerParse {
        message: e.to_string(),
        raw: original.to_string(),
    })
}

/// Result of the `/ollama_test` strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Text(String),
    Json(Value),
}

impl fmt::Display for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatReply::Text(t) => f.write_str(t),
            ChatReply::Json(v) => match serde_json::to_string_pretty(v) {
                Ok(s) => f.write_str(&s),
                Err(_) => write!(f, "{v}"),
            },
        }
    }
}

/// `/ollama_test` strategy: parse only fenced replies.
pub fn unwrap_chat_reply(raw: &[u8]) -> Result<ChatReply, ClientError> {
    let text = extract_response_field(raw)?;
    match strip_json_fence(&text) {
        Some(inner) => {
            debug!(target: "unwrap", len = inner.len(), "chat_reply_fenced");
            parse_inner(inner, &text).map(ChatReply::Json)
        }
        None => Ok(ChatReply::Text(text)),
    }
}

/// `/command` strategy: always parse, stripping the fence when present.
pub fn unwrap_decision(raw: &[u8]) -> Result<DecisionResult, ClientError> {
    let text = extract_response_field(raw)?;
    let fenced = strip_json_fence(&text);
    debug!(target: "unwrap", fenced = fenced.is_some(), "decision_reply");
    parse_inner(fenced.unwrap_or(&text), &text).map(DecisionResult::new)
}

/// Decision recovered from `/command`. Expected to map robot ids to actions
/// plus a free-text `description`, but only JSON validity is enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionResult {
    value: Value,
}

impl DecisionResult {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn description(&self) -> Option<&str> {
        self.value.get(DESCRIPTION_FIELD).and_then(Value::as_str)
    }

    /// `(robot, action)` pairs: every string field except `description`.
    pub fn actions(&self) -> Vec<(&str, &str)> {
        let Some(obj) = self.value.as_object() else {
            return Vec::new();
        };
        obj.iter()
            .filter(|(k, _)| k.as_str() != DESCRIPTION_FIELD)
            .filter_map(|(k, v)| v.as_str().map(|a| (k.as_str(), a)))
            .collect()
    }

    /// Actions outside `allowed`.
    pub fn unknown_actions<S: AsRef<str>>(&self, allowed: &[S]) -> Vec<(&str, &str)> {
        self.actions()
            .into_iter()
            .filter(|(_, action)| !allowed.iter().any(|a| a.as_ref() == *action))
            .collect()
    }

    /// Robots whose action differs from `expected`, as `(robot, got, expected)`.
    /// A robot missing on either side shows up with `None` on that side.
    pub fn action_mismatches<'a>(
        &'a self,
        expected: &'a DecisionResult,
    ) -> Vec<(&'a str, Option<&'a str>, Option<&'a str>)> {
        let got: BTreeMap<&str, &str> = self.actions().into_iter().collect();
        let want: BTreeMap<&str, &str> = expected.actions().into_iter().collect();
        let robots: BTreeSet<&str> = got.keys().chain(want.keys()).copied().collect();
        robots
            .into_iter()
            .map(|robot| (robot, got.get(robot).copied(), want.get(robot).copied()))
            .filter(|(_, g, w)| g != w)
            .collect()
    }

    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.value).unwrap_or_else(|_| self.value.to_string())
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
