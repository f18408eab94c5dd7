//! Confidence scoring: per-record adjustments and the pair-level aggregate.
//!
//! Confidence is independent of severity. It reflects evidence robustness
//! and is capped below 1.0 so no report ever claims certainty.

use super::{EvidenceRecord, Origin, Severity};

/// Base confidence per source, also used as the record's weight in the
/// aggregate mean.
pub fn base_confidence(origin: Origin) -> f64 {
    match origin {
        Origin::RxnormInteractions => 0.85,
        Origin::LabelWarnings => 0.80,
        Origin::SupplementInteractions => 0.70,
        Origin::PairAdverseEvents => 0.65,
        Origin::LiteratureAi => 0.60,
        Origin::SingleDrugAdverseEvents => 0.65,
    }
}

/// Hard ceiling: confidence never reaches 1.0.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Multiplier applied when a record's severity is unknown.
const UNKNOWN_SEVERITY_FACTOR: f64 = 0.7;

/// Exposure-denominator bonus cap.
const EXPOSURE_BONUS_CAP: f64 = 0.15;

/// Baseline aggregate when the merged set is empty but primary sources ran
/// without error, by count of clean primaries.
pub fn baseline_for_primary_count(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1 => 0.30,
        2 => 0.50,
        _ => 0.70,
    }
}

/// Apply the bounded per-record adjustments to a record's seeded
/// confidence. Clamped to [0, 1].
pub fn adjust_record_confidence(record: &EvidenceRecord) -> f64 {
    let mut value = record.confidence;

    if let Some(stats) = &record.stats {
        if let Some(beneficiaries) = stats.beneficiaries {
            let bonus = ((beneficiaries as f64 + 1.0).log10() / 10.0).min(EXPOSURE_BONUS_CAP);
            value += bonus;
        }
        if stats.event_rate.is_some() && stats.serious_event_rate.is_some() {
            value += 0.05;
        }
        if let Some(total) = stats.total_events {
            if total > 1_000 {
                value += 0.05;
            } else if total > 100 {
                value += 0.02;
            } else if total < 10 {
                value -= 0.05;
            }
        }
    }

    if record.severity == Severity::Unknown {
        value *= UNKNOWN_SEVERITY_FACTOR;
    }

    value.clamp(0.0, 1.0)
}

/// Weighted mean of per-record confidences, each weighted by its origin's
/// base confidence. Empty input yields 0; the result never exceeds
/// [`MAX_CONFIDENCE`].
pub fn aggregate_confidence(records: &[EvidenceRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for record in records {
        let weight = base_confidence(record.origin);
        numerator += weight * adjust_record_confidence(record);
        denominator += weight;
    }
    (numerator / denominator).min(MAX_CONFIDENCE)
}

/// Pair-level aggregate with the guardrails applied.
///
/// `primary_clean_count` is the number of primary providers that were
/// attempted and completed without error; `rxnorm_failed` is true when
/// rxnorm_interactions was attempted and errored.
pub fn pair_confidence(
    records: &[EvidenceRecord],
    primary_clean_count: usize,
    rxnorm_failed: bool,
) -> f64 {
    if primary_clean_count == 0 || rxnorm_failed {
        return 0.0;
    }
    if records.is_empty() {
        return baseline_for_primary_count(primary_clean_count);
    }
    aggregate_confidence(records)
}
