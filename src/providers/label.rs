//! Structured product labeling adapter with a tiered query strategy and a
//! strict primary-ingredient post-filter.
//!
//! The broad-phrase fallback can surface labels for a *different* drug of
//! the same class (the NSAID family is the usual offender: a naproxen label
//! matching an ibuprofen query). The class table is consulted only to
//! reject such candidates and warnings, never to infer an interaction.

use std::time::Instant;

use serde_json::Value;

use crate::config::{timeouts, LABEL_BACKOFF_BASE, LABEL_MAX_RETRIES};
use crate::net::{FetchError, UpstreamClient};

use super::{LabelData, ProviderReply};

const OPENFDA_LABEL: &str = "https://api.fda.gov/drug/label.json";

/// Well-known NSAIDs, used as a rejection block-list for cross-class label
/// confusions.
pub const NSAID_CLASS: &[&str] = &[
    "aspirin",
    "celecoxib",
    "diclofenac",
    "etodolac",
    "ibuprofen",
    "indomethacin",
    "ketoprofen",
    "ketorolac",
    "meloxicam",
    "nabumetone",
    "naproxen",
    "oxaprozin",
    "piroxicam",
    "sulindac",
];

/// Label sections harvested as warnings, in precedence order.
const WARNING_SECTIONS: &[&str] = &[
    "boxed_warning",
    "warnings",
    "warnings_and_cautions",
    "drug_interactions",
];

/// Fetch the label for `name`, preferring the authority identifier when
/// known. Tiers: identifier, exact generic name, exact brand name, broad
/// phrase with post-filter. The only retryable provider.
pub async fn fetch_label(
    client: &UpstreamClient,
    name: &str,
    rxcui: Option<&str>,
) -> ProviderReply<LabelData> {
    let started = Instant::now();

    let mut tiers: Vec<(String, usize)> = Vec::new();
    if let Some(cui) = rxcui {
        tiers.push((format!("openfda.rxcui:\"{cui}\""), 1));
    }
    tiers.push((format!("openfda.generic_name:\"{name}\""), 1));
    tiers.push((format!("openfda.brand_name:\"{name}\""), 1));
    tiers.push((format!("\"{name}\""), 5));

    for (query, limit) in tiers {
        let url = format!(
            "{OPENFDA_LABEL}?search={}&limit={limit}",
            urlencoding::encode(&query)
        );
        let body = match client
            .get_json_with_retry(&url, timeouts::LABEL, LABEL_MAX_RETRIES, LABEL_BACKOFF_BASE)
            .await
        {
            Ok(body) => body,
            // openFDA answers 404 for an empty result set; fall through to
            // the next tier.
            Err(FetchError::Status { status: 404 }) => continue,
            Err(err) => return ProviderReply::failed(err.into(), started),
        };
        if let Some(label) = select_candidate(name, &body) {
            return ProviderReply::found(label, started);
        }
    }

    ProviderReply::not_found(started)
}

/// Pick the first candidate that passes the primary-ingredient check and
/// strip cross-class warnings from it.
pub(crate) fn select_candidate(name: &str, body: &Value) -> Option<LabelData> {
    let results = body.get("results")?.as_array()?;
    for candidate in results {
        if !candidate_matches(name, candidate) {
            continue;
        }
        let mut label = extract_label(candidate);
        label.warnings.retain(|w| conflicting_class_member(name, w).is_none());
        return Some(label);
    }
    None
}

/// The primary-ingredient check: the candidate's generic/substance/brand
/// name must contain the queried canonical name, and the candidate must not
/// list a different well-known class member as its primary ingredient.
pub(crate) fn candidate_matches(name: &str, candidate: &Value) -> bool {
    let needle = name.to_lowercase();
    let names = primary_names(candidate);
    if !names.iter().any(|n| n.contains(&needle)) {
        return false;
    }
    names
        .iter()
        .all(|n| conflicting_class_member(&needle, n).is_none())
}

/// A *different* class member mentioned in `text`, if any. Only queries
/// that are themselves class members can have a cross-class confusion; for
/// everything else the block-list does not apply.
pub(crate) fn conflicting_class_member(query: &str, text: &str) -> Option<&'static str> {
    let query = query.to_lowercase();
    if !NSAID_CLASS.iter().any(|member| query.contains(*member)) {
        return None;
    }
    let text = text.to_lowercase();
    NSAID_CLASS
        .iter()
        .find(|member| !query.contains(**member) && text.contains(**member))
        .copied()
}

fn primary_names(candidate: &Value) -> Vec<String> {
    let mut names = Vec::new();
    for field in ["generic_name", "substance_name", "brand_name"] {
        if let Some(values) = candidate
            .pointer(&format!("/openfda/{field}"))
            .and_then(Value::as_array)
        {
            names.extend(
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_lowercase),
            );
        }
    }
    names
}

fn extract_label(candidate: &Value) -> LabelData {
    let product_name = candidate
        .pointer("/openfda/brand_name/0")
        .or_else(|| candidate.pointer("/openfda/generic_name/0"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let identifier = candidate
        .get("set_id")
        .or_else(|| candidate.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut warnings = Vec::new();
    for section in WARNING_SECTIONS {
        if let Some(texts) = candidate.get(*section).and_then(Value::as_array) {
            warnings.extend(
                texts
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string),
            );
        }
    }

    LabelData {
        product_name,
        identifier,
        warnings,
    }
}
