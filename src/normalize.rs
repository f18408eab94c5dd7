//! Item name canonicalization and pair/triple enumeration.
//!
//! Canonicalization is purely lexical: trim, lowercase, collapse internal
//! whitespace, and tighten spacing around `/` so combination products like
//! "amoxicillin / clavulanate" share one spelling. Canonical values drive
//! cache partitioning, so the function must be idempotent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy bound on items per request.
pub const MAX_ITEMS: usize = 10;

/// Separator between the two canonical values of a pair key.
pub const PAIR_KEY_SEPARATOR: &str = "::";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("At least one item is required")]
    Empty,
    #[error("Too many items: {0} (maximum {MAX_ITEMS})")]
    TooMany(usize),
    #[error("Item at position {0} has an empty name")]
    BlankItem(usize),
}

/// An item name in both its canonical and as-entered forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub normalized: String,
    pub original: String,
}

/// Canonicalize a raw item name.
pub fn canonicalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch == '/' {
            while out.ends_with(' ') {
                out.pop();
            }
            out.push('/');
            pending_space = false;
            continue;
        }
        if pending_space && !out.is_empty() && !out.ends_with('/') {
            out.push(' ');
        }
        out.push(ch);
        pending_space = false;
    }
    out
}

/// Validate and canonicalize a request's item names.
pub fn normalize_items(values: &[String]) -> Result<Vec<NormalizedItem>, InputError> {
    if values.is_empty() {
        return Err(InputError::Empty);
    }
    if values.len() > MAX_ITEMS {
        return Err(InputError::TooMany(values.len()));
    }
    let mut items = Vec::with_capacity(values.len());
    for (idx, raw) in values.iter().enumerate() {
        let normalized = canonicalize(raw);
        if normalized.is_empty() {
            return Err(InputError::BlankItem(idx));
        }
        items.push(NormalizedItem {
            normalized,
            original: raw.trim().to_string(),
        });
    }
    Ok(items)
}

/// Order-insensitive identifier for a pair of canonical values.
pub fn pair_key(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}{PAIR_KEY_SEPARATOR}{hi}")
}

/// Unique items by canonical value, first occurrence wins.
pub fn dedupe_by_normalized(items: &[NormalizedItem]) -> Vec<NormalizedItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.normalized.clone()))
        .cloned()
        .collect()
}

/// All unordered pairs over the canonical set, in index order.
pub fn enumerate_pairs(items: &[NormalizedItem]) -> Vec<(NormalizedItem, NormalizedItem)> {
    let mut pairs = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            pairs.push((items[i].clone(), items[j].clone()));
        }
    }
    pairs
}

/// All unordered triples over the canonical set. No two triples share the
/// same canonical set because the input is deduplicated upstream.
pub fn enumerate_triples(
    items: &[NormalizedItem],
) -> Vec<(NormalizedItem, NormalizedItem, NormalizedItem)> {
    let mut triples = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            for k in (j + 1)..items.len() {
                triples.push((items[i].clone(), items[j].clone(), items[k].clone()));
            }
        }
    }
    triples
}
