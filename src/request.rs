//! Outbound request construction.
//!
//! A [`PreparedRequest`] is a plain value: method, URL, optional body, headers
//! and its own timeout budget. Nothing here touches the network.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;

use crate::error::ClientError;
use crate::state::{BattleState, Payload};

pub const ENDPOINT_OLLAMA_TEST: &str = "ollama_test";
pub const ENDPOINT_CHAT: &str = "chat";
pub const ENDPOINT_COMMAND: &str = "command";

pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    /// Sent as compact JSON by the transport.
    pub body: Option<Payload>,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

impl PreparedRequest {
    /// `GET {base}/{endpoint}?prompt=...`
    pub fn get_prompt(
        base: &str,
        endpoint: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let url = prompt_url(base, endpoint, prompt)?;
        Ok(Self {
            method: Method::GET,
            url,
            body: None,
            headers: HeaderMap::new(),
            timeout,
        })
    }

    /// `POST {base}/command` with `{"state": ...}` as the body.
    pub fn post_command(base: &str, state: BattleState, timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        Self {
            method: Method::POST,
            url: endpoint_url(base, ENDPOINT_COMMAND),
            body: Some(Payload::new(state)),
            headers,
            timeout,
        }
    }
}

/// Percent-encode a prompt for use as a query component.
///
/// Everything outside the RFC 3986 unreserved set is escaped, space included
/// (as `%20`, never `+`). The current encoder accepts any string; the
/// `Result` keeps encoding failures reportable apart from transport ones.
pub fn encode_prompt(prompt: &str) -> Result<String, ClientError> {
    Ok(urlencoding::encode(prompt).into_owned())
}

pub fn prompt_url(base: &str, endpoint: &str, prompt: &str) -> Result<String, ClientError> {
    let encoded = encode_prompt(prompt)?;
    Ok(format!("{}?prompt={}", endpoint_url(base, endpoint), encoded))
}

fn endpoint_url(base: &str, endpoint: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/'))
}
