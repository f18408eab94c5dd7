//! Source merging: fold multiple evidence records with the same origin
//! into one.
//!
//! Per group: severity is the maximum under the total order, confidence is
//! the arithmetic mean (group confidence reflects that origin's evidence
//! quality, not severity escalation), details and stats are key-wise unions
//! with later entries overwriting earlier ones, citations are a set union,
//! the summary is the longest of the group's, and the timestamp is the most
//! recent.

use std::collections::BTreeMap;

use super::{EvidenceRecord, Origin};

/// Fold `records` so the result contains at most one record per origin.
/// Output is ordered by origin; empty input yields empty output.
pub fn merge_by_origin(records: Vec<EvidenceRecord>) -> Vec<EvidenceRecord> {
    let mut groups: BTreeMap<Origin, Vec<EvidenceRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.origin).or_default().push(record);
    }
    groups
        .into_values()
        .map(fold_group)
        .collect()
}

fn fold_group(group: Vec<EvidenceRecord>) -> EvidenceRecord {
    let confidence_sum: f64 = group.iter().map(|r| r.confidence).sum();
    let mean_confidence = confidence_sum / group.len() as f64;

    let mut iter = group.into_iter();
    let mut folded = iter.next().expect("groups are never empty");
    for record in iter {
        folded.severity = folded.severity.max(record.severity);
        for (key, value) in record.details {
            folded.details.insert(key, value);
        }
        match (&mut folded.stats, record.stats) {
            (Some(acc), Some(stats)) => acc.merge_from(&stats),
            (none @ None, Some(stats)) => *none = Some(stats),
            _ => {}
        }
        folded.citations.extend(record.citations);
        if record.summary.len() > folded.summary.len() {
            folded.summary = record.summary;
        }
        folded.observed_at = folded.observed_at.max(record.observed_at);
    }
    folded.confidence = mean_confidence;
    folded
}
