//! Blocking HTTP transport: one attempt per request, body collected in memory.

use std::time::Instant;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::request::PreparedRequest;

const USER_AGENT: &str = concat!("battle_client/", env!("CARGO_PKG_VERSION"));

/// Raw response as received. The status is informational only; callers hand
/// the body to the unwrapper whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body as text, lossy for invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Transport;

impl Transport {
    pub fn new() -> Self {
        Self
    }

    /// Send `req` once. Each call builds its own client, so nothing is pooled
    /// or shared between calls.
    pub fn send(&self, req: &PreparedRequest) -> Result<RawResponse, ClientError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(req.timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        let mut builder = client
            .request(req.method.clone(), &req.url)
            .headers(req.headers.clone());
        if let Some(payload) = &req.body {
            builder = builder.json(payload);
        }

        info!(target: "transport", method = %req.method, url = %req.url, timeout_s = req.timeout.as_secs(), "request_start");
        let started = Instant::now();
        let resp = builder.send()?;
        let status = resp.status();
        let body = resp.bytes()?.to_vec();
        debug!(
            target: "transport",
            status = %status,
            len = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response_raw"
        );
        Ok(RawResponse { status: status.as_u16(), body })
    }
}
