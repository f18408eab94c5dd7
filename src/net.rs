//! Upstream HTTP plumbing: timed JSON fetch and bounded retry.
//!
//! A timeout is a first-class outcome, distinct from transport errors, and
//! cancels the in-flight request (reqwest per-request timeout). The retry
//! wrapper attempts up to `max_retries + 1` calls with linear backoff; only
//! providers configured as retryable use it.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out after {0}ms")]
    Timeout(u64),
    #[error("Upstream returned HTTP {status}")]
    Status { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unparseable upstream response: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Shared HTTP client for all upstream providers. Timeouts are per request,
/// since each provider carries its own limit.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UpstreamClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stacksafe/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build upstream HTTP client");
        Self { http }
    }

    /// Single-shot GET returning parsed JSON.
    pub async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        self.get_json_auth(url, None, timeout).await
    }

    /// Single-shot GET with optional bearer auth. The credential travels in
    /// a header, never in the URL, so it cannot leak through error strings.
    pub async fn get_json_auth(
        &self,
        url: &str,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> Result<Value, FetchError> {
        let mut request = self.http.get(url).timeout(timeout);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| match e.is_timeout() {
                true => FetchError::Timeout(timeout.as_millis() as u64),
                false => FetchError::Parse(e.to_string()),
            })
    }

    /// GET with up to `max_retries` additional attempts and linear backoff
    /// (`backoff_base * attempt` between attempts).
    pub async fn get_json_with_retry(
        &self,
        url: &str,
        timeout: Duration,
        max_retries: u32,
        backoff_base: Duration,
    ) -> Result<Value, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_json(url, timeout).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt > max_retries {
                        return Err(err);
                    }
                    let delay = backoff_base * attempt;
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying upstream call"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Single-shot POST of a JSON body, with optional bearer auth. The
    /// credential travels in a header, never in the URL, so it cannot leak
    /// through error strings.
    pub async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, FetchError> {
        let mut request = self.http.post(url).timeout(timeout).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout.as_millis() as u64)
    } else {
        FetchError::Network(err.to_string())
    }
}
