//! Supplement interaction adapters against the supplement evidence API.
//!
//! The upstream requires an API key; when it is not configured both
//! adapters answer with `missing_credential` and the pipeline carries on
//! without them.

use std::time::Instant;

use serde_json::Value;

use crate::config::timeouts;
use crate::net::{FetchError, UpstreamClient};

use super::{ProviderError, ProviderReply, SupplementInteraction};

const SUPPLEMENT_BASE: &str = "https://api.supp.ai/v1";

/// Resolve a canonical name to the upstream concept identifier.
pub async fn lookup_supplement(
    client: &UpstreamClient,
    api_key: Option<&str>,
    name: &str,
) -> ProviderReply<String> {
    let started = Instant::now();
    let Some(key) = api_key else {
        return ProviderReply::failed(ProviderError::MissingCredential, started);
    };

    let url = format!(
        "{SUPPLEMENT_BASE}/agent/search?q={}",
        urlencoding::encode(name)
    );
    match client.get_json_auth(&url, Some(key), timeouts::SUPPLEMENT).await {
        Ok(body) => ProviderReply::from_option(extract_agent_cui(&body), started),
        Err(FetchError::Status { status: 404 }) => ProviderReply::not_found(started),
        Err(err) => ProviderReply::failed(err.into(), started),
    }
}

/// Interaction statements between two resolved concepts.
pub async fn fetch_interactions(
    client: &UpstreamClient,
    api_key: Option<&str>,
    cui_a: &str,
    cui_b: &str,
) -> ProviderReply<Vec<SupplementInteraction>> {
    let started = Instant::now();
    let Some(key) = api_key else {
        return ProviderReply::failed(ProviderError::MissingCredential, started);
    };

    let url = format!(
        "{SUPPLEMENT_BASE}/interactions?agent1={}&agent2={}",
        urlencoding::encode(cui_a),
        urlencoding::encode(cui_b)
    );
    match client.get_json_auth(&url, Some(key), timeouts::SUPPLEMENT).await {
        Ok(body) => {
            let interactions = extract_interactions(&body);
            if interactions.is_empty() {
                ProviderReply::not_found(started)
            } else {
                ProviderReply::found(interactions, started)
            }
        }
        Err(FetchError::Status { status: 404 }) => ProviderReply::not_found(started),
        Err(err) => ProviderReply::failed(err.into(), started),
    }
}

pub(crate) fn extract_agent_cui(body: &Value) -> Option<String> {
    body.pointer("/results/0/cui")
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub(crate) fn extract_interactions(body: &Value) -> Vec<SupplementInteraction> {
    let buckets = body
        .get("interactions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    buckets
        .iter()
        .filter_map(|bucket| {
            let description = bucket
                .get("sentence")
                .or_else(|| bucket.get("description"))
                .and_then(Value::as_str)?
                .to_string();
            let severity = bucket
                .get("severity")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(SupplementInteraction {
                severity,
                description,
            })
        })
        .collect()
}
