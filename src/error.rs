//! Error kinds raised along a single request/response cycle.
//!
//! Every variant is handled at the call site that produced it (see `harness`);
//! none of them is fatal to the process.

use std::error::Error as _;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed.
    #[error("transport init failed: {0}")]
    Init(String),

    /// The prompt could not be placed in a query string.
    #[error("prompt encoding failed: {0}")]
    Encode(String),

    /// Network, DNS or timeout failure while sending or reading the body.
    #[error("request failed: {0}")]
    Transport(String),

    /// The body is not JSON or lacks a string `response` field.
    #[error("response body parse failed: {message}")]
    OuterParse { message: String, raw: String },

    /// The unwrapped `response` string is not JSON.
    #[error("embedded JSON parse failed: {message}")]
    InnerParse { message: String, raw: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Short name of the stage that failed, used in reports and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            ClientError::Init(_) => "init",
            ClientError::Encode(_) => "encode",
            ClientError::Transport(_) => "transport",
            ClientError::OuterParse { .. } => "outer_parse",
            ClientError::InnerParse { .. } => "inner_parse",
            ClientError::Config(_) => "config",
        }
    }

    /// Text the reporter echoes for manual inspection, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ClientError::OuterParse { raw, .. } | ClientError::InnerParse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(describe_reqwest_error(&e))
    }
}

/// reqwest's top-level message hides the cause ("error sending request"),
/// so the source chain is appended.
fn describe_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if e.is_timeout() && !msg.contains("timed out") {
        msg.push_str(" (timed out)");
    }
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
