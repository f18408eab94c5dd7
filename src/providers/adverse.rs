//! Adverse-event report counts from the openFDA FAERS endpoint, for one
//! drug or for a pair of co-reported drugs.
//!
//! Two count queries per call: seriousness split, then top reactions. The
//! reaction query is best-effort; its failure leaves `outcomes` empty
//! without failing the provider.

use std::collections::BTreeMap;
use std::time::Instant;

use serde_json::Value;

use crate::config::timeouts;
use crate::net::{FetchError, UpstreamClient};

use super::{AdverseEventSummary, ProviderReply};

const OPENFDA_EVENTS: &str = "https://api.fda.gov/drug/event.json";
const TOP_OUTCOMES: usize = 5;

/// Reports mentioning both drugs.
pub async fn fetch_pair_events(
    client: &UpstreamClient,
    a: &str,
    b: &str,
) -> ProviderReply<AdverseEventSummary> {
    fetch_events(client, &[a, b]).await
}

/// Reports mentioning a single drug.
pub async fn fetch_single_events(
    client: &UpstreamClient,
    name: &str,
) -> ProviderReply<AdverseEventSummary> {
    fetch_events(client, &[name]).await
}

async fn fetch_events(
    client: &UpstreamClient,
    names: &[&str],
) -> ProviderReply<AdverseEventSummary> {
    let started = Instant::now();
    let raw_expr = query_expr(names);
    let expr = urlencoding::encode(&raw_expr);

    let counts_url = format!("{OPENFDA_EVENTS}?search={expr}&count=serious");
    let body = match client.get_json(&counts_url, timeouts::ADVERSE_EVENTS).await {
        Ok(body) => body,
        // No reports match the query.
        Err(FetchError::Status { status: 404 }) => return ProviderReply::not_found(started),
        Err(err) => return ProviderReply::failed(err.into(), started),
    };
    let (total_events, serious_events) = parse_serious_counts(&body);
    if total_events == 0 {
        return ProviderReply::not_found(started);
    }

    let outcomes_url = format!(
        "{OPENFDA_EVENTS}?search={expr}&count=patient.reaction.reactionmeddrapt.exact&limit={TOP_OUTCOMES}"
    );
    let outcomes = match client.get_json(&outcomes_url, timeouts::ADVERSE_EVENTS).await {
        Ok(body) => parse_outcomes(&body),
        Err(err) => {
            tracing::debug!(error = %err, "reaction count query failed, keeping totals");
            BTreeMap::new()
        }
    };

    ProviderReply::found(
        AdverseEventSummary {
            total_events,
            serious_events,
            outcomes,
        },
        started,
    )
}

pub(crate) fn query_expr(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("patient.drug.medicinalproduct:\"{name}\""))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// The seriousness facet: term 1 is serious, term 2 is non-serious.
pub(crate) fn parse_serious_counts(body: &Value) -> (u64, u64) {
    let mut total = 0;
    let mut serious = 0;
    let results = body
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for bucket in results {
        let count = bucket.get("count").and_then(Value::as_u64).unwrap_or(0);
        total += count;
        let term = bucket.get("term").and_then(Value::as_u64);
        if term == Some(1) {
            serious += count;
        }
    }
    (total, serious)
}

pub(crate) fn parse_outcomes(body: &Value) -> BTreeMap<String, u64> {
    let mut outcomes = BTreeMap::new();
    let results = body
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for bucket in results.iter().take(TOP_OUTCOMES) {
        let (Some(term), Some(count)) = (
            bucket.get("term").and_then(Value::as_str),
            bucket.get("count").and_then(Value::as_u64),
        ) else {
            continue;
        };
        outcomes.insert(term.to_string(), count);
    }
    outcomes
}
