//! Upstream provider adapters.
//!
//! Each adapter yields a [`ProviderReply`]: data, a typed error, a cached
//! flag, and the elapsed time. `data == None, error == None` is the
//! normalized "looked, found nothing" outcome and is distinct from an
//! error. Adapter failures never propagate; the orchestrator records them
//! as provider statuses and degrades the affected evidence to absent.

pub mod adverse;
pub mod exposure;
pub mod label;
pub mod literature;
pub mod rxnorm;
pub mod supplement;

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::FetchError;

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("Request timed out after {0}ms")]
    Timeout(u64),
    #[error("Upstream returned HTTP {0}")]
    Http(u16),
    #[error("Unparseable upstream response: {0}")]
    Parse(String),
    #[error("API credential not configured")]
    MissingCredential,
    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Short machine-readable kind for the debug trace.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Http(_) => "http",
            ProviderError::Parse(_) => "parse",
            ProviderError::MissingCredential => "missing_credential",
            ProviderError::Network(_) => "network",
        }
    }
}

impl From<FetchError> for ProviderError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(ms) => ProviderError::Timeout(ms),
            FetchError::Status { status } => ProviderError::Http(status),
            FetchError::Network(msg) => ProviderError::Network(msg),
            FetchError::Parse(msg) => ProviderError::Parse(msg),
        }
    }
}

/// Outcome of one provider call.
#[derive(Debug, Clone)]
pub struct ProviderReply<T> {
    pub data: Option<T>,
    pub error: Option<ProviderError>,
    pub cached: bool,
    pub elapsed_ms: u64,
}

impl<T> ProviderReply<T> {
    pub fn found(data: T, started: Instant) -> Self {
        Self {
            data: Some(data),
            error: None,
            cached: false,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// The normalized "looked, found nothing" outcome.
    pub fn not_found(started: Instant) -> Self {
        Self {
            data: None,
            error: None,
            cached: false,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub fn failed(error: ProviderError, started: Instant) -> Self {
        Self {
            data: None,
            error: Some(error),
            cached: false,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub fn from_option(data: Option<T>, started: Instant) -> Self {
        match data {
            Some(data) => Self::found(data, started),
            None => Self::not_found(started),
        }
    }

    /// A reply served from the item cache rather than the upstream.
    pub fn from_cache(data: Option<T>) -> Self {
        Self {
            data,
            error: None,
            cached: true,
            elapsed_ms: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Completed without error (whether or not data was found).
    pub fn completed_clean(&self) -> bool {
        self.error.is_none()
    }
}

// ── Provider data shapes ────────────────────────────────────

/// One interaction edge from the RxNorm interaction graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxnormInteraction {
    pub severity: String,
    pub description: String,
    pub source: String,
}

/// One supplement interaction statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementInteraction {
    pub severity: Option<String>,
    pub description: String,
}

/// Structured product labeling extract for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LabelData {
    pub product_name: Option<String>,
    /// Label set identifier at the upstream authority.
    pub identifier: Option<String>,
    pub warnings: Vec<String>,
}

/// Aggregated adverse-event counts for one drug or one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdverseEventSummary {
    pub total_events: u64,
    pub serious_events: u64,
    /// Top reported reactions, by report count.
    pub outcomes: BTreeMap<String, u64>,
}

/// Beneficiary exposure estimate for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureData {
    pub beneficiaries: u64,
    pub year: i32,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_an_error() {
        let reply: ProviderReply<String> = ProviderReply::not_found(Instant::now());
        assert!(reply.data.is_none());
        assert!(!reply.is_error());
        assert!(reply.completed_clean());
    }

    #[test]
    fn failed_is_an_error() {
        let reply: ProviderReply<String> =
            ProviderReply::failed(ProviderError::Timeout(10_000), Instant::now());
        assert!(reply.is_error());
        assert!(!reply.completed_clean());
        assert_eq!(reply.error.unwrap().kind(), "timeout");
    }

    #[test]
    fn cached_reply_has_zero_elapsed() {
        let reply = ProviderReply::from_cache(Some("123".to_string()));
        assert!(reply.cached);
        assert_eq!(reply.elapsed_ms, 0);
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(ProviderError::MissingCredential.kind(), "missing_credential");
        assert_eq!(ProviderError::Http(500).kind(), "http");
        assert_eq!(ProviderError::Parse("x".into()).kind(), "parse");
        assert_eq!(ProviderError::Network("x".into()).kind(), "network");
    }

    #[test]
    fn fetch_errors_map_onto_provider_errors() {
        let err: ProviderError = FetchError::Status { status: 503 }.into();
        assert!(matches!(err, ProviderError::Http(503)));
        let err: ProviderError = FetchError::Timeout(4_000).into();
        assert!(matches!(err, ProviderError::Timeout(4_000)));
    }
}
