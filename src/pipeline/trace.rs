//! Per-request provider status recorder.
//!
//! `ok` semantics differ by provider family. For interaction providers a
//! clean empty result still means the provider did its job (`ok=true`).
//! For lookup providers the same shape means the identifier is absent
//! (`ok=false`). Error strings carry the error kind and message; they never
//! contain credentials because credentials never enter URLs or errors.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::providers::{ProviderError, ProviderReply};
use crate::report::ProviderStatus;

#[derive(Default)]
pub struct StatusRecorder {
    statuses: Mutex<BTreeMap<String, ProviderStatus>>,
}

impl StatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: impl Into<String>, status: ProviderStatus) {
        if let Ok(mut map) = self.statuses.lock() {
            map.insert(key.into(), status);
        }
    }

    /// A lookup-family reply: `ok` requires data to be present.
    pub fn record_lookup<T>(&self, key: impl Into<String>, reply: &ProviderReply<T>) {
        self.record(
            key,
            ProviderStatus {
                attempted: true,
                ok: reply.completed_clean() && reply.data.is_some(),
                elapsed_ms: reply.elapsed_ms,
                cached: reply.cached,
                error: reply.error.as_ref().map(error_string),
            },
        );
    }

    /// An interaction-family reply: a clean empty result is still `ok`.
    pub fn record_interaction<T>(&self, key: impl Into<String>, reply: &ProviderReply<T>) {
        self.record(
            key,
            ProviderStatus {
                attempted: true,
                ok: reply.completed_clean(),
                elapsed_ms: reply.elapsed_ms,
                cached: reply.cached,
                error: reply.error.as_ref().map(error_string),
            },
        );
    }

    /// A provider skipped cleanly (prerequisite identifier absent or the
    /// feature is off).
    pub fn record_skipped(&self, key: impl Into<String>) {
        self.record(
            key,
            ProviderStatus {
                attempted: false,
                ok: false,
                elapsed_ms: 0,
                cached: false,
                error: None,
            },
        );
    }

    /// A status reconstructed from a cache hit.
    pub fn record_cached(&self, key: impl Into<String>, ok: bool) {
        self.record(
            key,
            ProviderStatus {
                attempted: true,
                ok,
                elapsed_ms: 0,
                cached: true,
                error: None,
            },
        );
    }

    pub fn snapshot(&self) -> BTreeMap<String, ProviderStatus> {
        self.statuses
            .lock()
            .map(|map| map.clone())
            .unwrap_or_default()
    }
}

fn error_string(error: &ProviderError) -> String {
    match error {
        // Keep the machine-readable kind for credential gaps; the message
        // adds nothing.
        ProviderError::MissingCredential => "missing_credential".to_string(),
        other => format!("{}: {other}", other.kind()),
    }
}
