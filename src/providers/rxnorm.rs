//! RxNorm adapters: identifier lookup and the interaction graph probe.
//!
//! The interaction check queries one RxCUI's full interaction graph and
//! post-filters for the partner RxCUI. The upstream interaction API is
//! deprecated and answers 404 for some concepts; that reads as "no
//! interactions found", not as a failure.

use std::time::Instant;

use serde_json::Value;

use crate::config::timeouts;
use crate::net::{FetchError, UpstreamClient};

use super::{ProviderReply, RxnormInteraction};

const RXNAV_BASE: &str = "https://rxnav.nlm.nih.gov/REST";

/// Resolve a canonical name to an RxCUI. Approximate search (`search=2`)
/// tolerates salt forms and brand spellings.
pub async fn lookup_rxcui(client: &UpstreamClient, name: &str) -> ProviderReply<String> {
    let started = Instant::now();
    let url = format!(
        "{RXNAV_BASE}/rxcui.json?name={}&search=2",
        urlencoding::encode(name)
    );
    match client.get_json(&url, timeouts::RXNORM_LOOKUP).await {
        Ok(body) => ProviderReply::from_option(extract_rxcui(&body), started),
        Err(err) => ProviderReply::failed(err.into(), started),
    }
}

/// Probe `rxcui`'s interaction graph for an edge to `partner_rxcui`.
pub async fn fetch_interaction(
    client: &UpstreamClient,
    rxcui: &str,
    partner_rxcui: &str,
) -> ProviderReply<RxnormInteraction> {
    let started = Instant::now();
    let url = format!(
        "{RXNAV_BASE}/interaction/interaction.json?rxcui={}",
        urlencoding::encode(rxcui)
    );
    match client.get_json(&url, timeouts::RXNORM_INTERACTIONS).await {
        Ok(body) => ProviderReply::from_option(find_partner_edge(&body, partner_rxcui), started),
        Err(FetchError::Status { status: 404 }) => ProviderReply::not_found(started),
        Err(err) => ProviderReply::failed(err.into(), started),
    }
}

pub(crate) fn extract_rxcui(body: &Value) -> Option<String> {
    body.pointer("/idGroup/rxnormId/0")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Walk the interaction graph for an edge whose far concept is `partner`.
/// An absent or unexpected shape reads as no edge; transport-level parse
/// failures were already surfaced by the fetch layer.
pub(crate) fn find_partner_edge(body: &Value, partner: &str) -> Option<RxnormInteraction> {
    let groups = body.get("interactionTypeGroup")?.as_array()?;
    for group in groups {
        let source = group
            .get("sourceName")
            .and_then(Value::as_str)
            .unwrap_or("RxNav");
        let types = group
            .get("interactionType")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for interaction_type in types {
            let pairs = interaction_type
                .get("interactionPair")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for pair in pairs {
                if !pair_mentions(pair, partner) {
                    continue;
                }
                let severity = pair
                    .get("severity")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                let description = pair
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return Some(RxnormInteraction {
                    severity,
                    description,
                    source: source.to_string(),
                });
            }
        }
    }
    None
}

fn pair_mentions(pair: &Value, partner: &str) -> bool {
    pair.get("interactionConcept")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .any(|concept| {
            concept
                .pointer("/minConceptItem/rxcui")
                .and_then(Value::as_str)
                .map(|cui| cui == partner)
                .unwrap_or(false)
        })
}
