use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Service name used in logs and the health endpoint.
pub const SERVICE_NAME: &str = "stacksafe";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version stamp on pair cache rows. Bumping it invalidates every pair
/// report computed under a prior version.
pub const CALC_VERSION: &str = "v7";

/// Width of the limiter that bounds upstream provider calls.
pub const UPSTREAM_CONCURRENCY: usize = 6;

/// Width of the limiter that bounds concurrent pair computations.
/// Narrower than the upstream limiter so one multi-pair request cannot
/// starve its own child calls.
pub const PAIR_CONCURRENCY: usize = 3;

/// Hours after which a negative item-lookup field (absent identifier)
/// is considered stale and re-fetched.
pub const NEGATIVE_CACHE_TTL_HOURS: i64 = 24;

/// Retry policy for the label provider. All other providers are single-shot.
pub const LABEL_MAX_RETRIES: u32 = 2;
pub const LABEL_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Per-provider request timeouts.
pub mod timeouts {
    use std::time::Duration;

    pub const RXNORM_LOOKUP: Duration = Duration::from_millis(6_000);
    pub const RXNORM_INTERACTIONS: Duration = Duration::from_millis(10_000);
    pub const SUPPLEMENT: Duration = Duration::from_millis(10_000);
    pub const LABEL: Duration = Duration::from_millis(8_000);
    pub const ADVERSE_EVENTS: Duration = Duration::from_millis(10_000);
    pub const EXPOSURE: Duration = Duration::from_millis(4_000);
    pub const LITERATURE: Duration = Duration::from_millis(30_000);
}

pub fn default_log_filter() -> String {
    format!("info,{SERVICE_NAME}=debug")
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("STACKSAFE_DB is required (path to the SQLite database)")]
    MissingDatabase,
    #[error("Invalid bind address in STACKSAFE_BIND: {0}")]
    InvalidBindAddr(String),
}

/// Runtime settings resolved from the environment at startup.
///
/// Optional credentials deterministically disable their provider when
/// absent; they never fail the request.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub supplement_api_key: Option<String>,
    pub literature_api_key: Option<String>,
    pub literature_endpoint: String,
    pub literature_model: String,
    /// Include the provider-status trace in every response, not just
    /// those that ask for it.
    pub debug_default: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let db_path = env_var("STACKSAFE_DB")
            .map(PathBuf::from)
            .ok_or(SettingsError::MissingDatabase)?;

        let bind_addr = match env_var("STACKSAFE_BIND") {
            Some(raw) => raw
                .parse()
                .map_err(|_| SettingsError::InvalidBindAddr(raw))?,
            None => SocketAddr::from(([127, 0, 0, 1], 8700)),
        };

        Ok(Self {
            db_path,
            bind_addr,
            supplement_api_key: env_var("SUPPLEMENT_API_KEY"),
            literature_api_key: env_var("LITERATURE_API_KEY"),
            literature_endpoint: env_var("LITERATURE_API_URL")
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            literature_model: env_var("LITERATURE_MODEL")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            debug_default: env_var("STACKSAFE_DEBUG")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Settings for tests: in-memory-style defaults, no credentials.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            db_path: PathBuf::from(":memory:"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            supplement_api_key: None,
            literature_api_key: None,
            literature_endpoint: "http://127.0.0.1:1".to_string(),
            literature_model: "test-model".to_string(),
            debug_default: false,
        }
    }
}

/// Read an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
