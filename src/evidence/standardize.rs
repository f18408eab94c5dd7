//! Standardizers: pure functions mapping each provider's raw result into
//! the uniform [`EvidenceRecord`] shape. Deterministic in their inputs;
//! the production timestamp is passed in by the caller.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::providers::{
    AdverseEventSummary, LabelData, RxnormInteraction, SupplementInteraction,
};

use super::confidence::base_confidence;
use super::{DenominatorMethod, EvidenceRecord, EvidenceStats, Origin, Severity};

/// Serious-event count thresholds for count-derived severity.
pub const SERIOUS_SEVERE_COUNT: u64 = 1_000;
pub const SERIOUS_MODERATE_COUNT: u64 = 100;

/// Serious-event rate overrides, applied when an exposure denominator is
/// known. Escalate only, never demote.
pub const SERIOUS_SEVERE_RATE: f64 = 1e-2;
pub const SERIOUS_MODERATE_RATE: f64 = 1e-3;

const SUMMARY_EXCERPT_CHARS: usize = 240;

/// Fixed token map from provider severity labels.
pub fn severity_from_label(label: &str) -> Severity {
    match label.trim().to_lowercase().as_str() {
        "major" | "severe" => Severity::Severe,
        "moderate" => Severity::Moderate,
        "minor" | "mild" => Severity::Mild,
        _ => Severity::Unknown,
    }
}

/// Standardize an RxNorm interaction edge.
pub fn standardize_rxnorm(
    interaction: &RxnormInteraction,
    observed_at: DateTime<Utc>,
) -> EvidenceRecord {
    EvidenceRecord::new(
        Origin::RxnormInteractions,
        severity_from_label(&interaction.severity),
        base_confidence(Origin::RxnormInteractions),
        interaction.description.clone(),
        observed_at,
    )
    .with_detail("severityLabel", Value::String(interaction.severity.clone()))
    .with_citation(interaction.source.clone())
}

/// Standardize supplement interaction statements, one record per statement.
/// The merger folds them into a single supplement-origin record.
pub fn standardize_supplement(
    interactions: &[SupplementInteraction],
    observed_at: DateTime<Utc>,
) -> Vec<EvidenceRecord> {
    interactions
        .iter()
        .map(|interaction| {
            let severity = interaction
                .severity
                .as_deref()
                .map(severity_from_label)
                .unwrap_or(Severity::Unknown);
            EvidenceRecord::new(
                Origin::SupplementInteractions,
                severity,
                base_confidence(Origin::SupplementInteractions),
                interaction.description.clone(),
                observed_at,
            )
        })
        .collect()
}

/// Pair-level label evidence: warnings on `subject`'s label that mention
/// `partner`. Returns nothing when no warning does. FDA warnings are always
/// at least moderate.
pub fn standardize_label_overlap(
    subject: &str,
    partner: &str,
    label: &LabelData,
    observed_at: DateTime<Utc>,
) -> Option<EvidenceRecord> {
    let needle = partner.to_lowercase();
    let matched: Vec<&String> = label
        .warnings
        .iter()
        .filter(|w| w.to_lowercase().contains(&needle))
        .collect();
    let first = matched.first()?;

    let product = label.product_name.as_deref().unwrap_or(subject);
    let mut record = EvidenceRecord::new(
        Origin::LabelWarnings,
        Severity::Moderate,
        base_confidence(Origin::LabelWarnings),
        format!(
            "{product} labeling mentions {partner}: {}",
            excerpt(first, SUMMARY_EXCERPT_CHARS)
        ),
        observed_at,
    )
    .with_detail("subject", Value::String(subject.to_string()))
    .with_detail("matchedWarnings", json!(matched.len()));
    if let Some(id) = &label.identifier {
        record = record.with_citation(id.clone());
    }
    Some(record)
}

/// Single-item label evidence: the item's own warnings, regardless of any
/// partner.
pub fn standardize_label_single(
    subject: &str,
    label: &LabelData,
    observed_at: DateTime<Utc>,
) -> Option<EvidenceRecord> {
    let first = label.warnings.first()?;
    let product = label.product_name.as_deref().unwrap_or(subject);
    let mut record = EvidenceRecord::new(
        Origin::LabelWarnings,
        Severity::Moderate,
        base_confidence(Origin::LabelWarnings),
        format!(
            "Label warnings for {product}: {}",
            excerpt(first, SUMMARY_EXCERPT_CHARS)
        ),
        observed_at,
    )
    .with_detail("warningCount", json!(label.warnings.len()));
    if let Some(id) = &label.identifier {
        record = record.with_citation(id.clone());
    }
    Some(record)
}

/// Standardize pair adverse-event counts. When an exposure denominator is
/// known for either drug it contextualizes the counts; when it is unknown,
/// no denominator is fabricated and severity derives from counts alone.
pub fn standardize_pair_adverse(
    a: &str,
    b: &str,
    summary: &AdverseEventSummary,
    exposure_a: Option<u64>,
    exposure_b: Option<u64>,
    observed_at: DateTime<Utc>,
) -> EvidenceRecord {
    let denominator = match (exposure_a, exposure_b) {
        (Some(ea), Some(eb)) => Some((ea.min(eb), DenominatorMethod::MinOfPair)),
        (Some(ea), None) => Some((ea, DenominatorMethod::SingleDrugA)),
        (None, Some(eb)) => Some((eb, DenominatorMethod::SingleDrugB)),
        (None, None) => None,
    };
    let (severity, stats) = adverse_severity_and_stats(summary, denominator);

    let mut record = EvidenceRecord::new(
        Origin::PairAdverseEvents,
        severity,
        base_confidence(Origin::PairAdverseEvents),
        format!(
            "{} adverse event reports mention both {a} and {b} ({} serious).",
            summary.total_events, summary.serious_events
        ),
        observed_at,
    )
    .with_stats(stats);
    if !summary.outcomes.is_empty() {
        record = record.with_detail("topOutcomes", json!(summary.outcomes));
    }
    record
}

/// Standardize single-drug adverse-event counts.
pub fn standardize_single_adverse(
    name: &str,
    summary: &AdverseEventSummary,
    exposure: Option<u64>,
    observed_at: DateTime<Utc>,
) -> EvidenceRecord {
    let denominator = exposure.map(|e| (e, DenominatorMethod::SingleDrugA));
    let (severity, stats) = adverse_severity_and_stats(summary, denominator);

    let mut record = EvidenceRecord::new(
        Origin::SingleDrugAdverseEvents,
        severity,
        base_confidence(Origin::SingleDrugAdverseEvents),
        format!(
            "{} adverse event reports mention {name} ({} serious).",
            summary.total_events, summary.serious_events
        ),
        observed_at,
    )
    .with_stats(stats);
    if !summary.outcomes.is_empty() {
        record = record.with_detail("topOutcomes", json!(summary.outcomes));
    }
    record
}

fn adverse_severity_and_stats(
    summary: &AdverseEventSummary,
    denominator: Option<(u64, DenominatorMethod)>,
) -> (Severity, EvidenceStats) {
    let mut severity = if summary.serious_events > SERIOUS_SEVERE_COUNT {
        Severity::Severe
    } else if summary.serious_events > SERIOUS_MODERATE_COUNT {
        Severity::Moderate
    } else if summary.serious_events > 0 {
        Severity::Mild
    } else {
        Severity::None
    };

    let mut stats = EvidenceStats {
        total_events: Some(summary.total_events),
        serious_events: Some(summary.serious_events),
        ..Default::default()
    };

    if let Some((beneficiaries, method)) = denominator {
        if beneficiaries > 0 {
            let event_rate = summary.total_events as f64 / beneficiaries as f64;
            let serious_rate = summary.serious_events as f64 / beneficiaries as f64;
            stats.beneficiaries = Some(beneficiaries);
            stats.event_rate = Some(event_rate);
            stats.serious_event_rate = Some(serious_rate);
            stats.denominator_method = Some(method);

            if serious_rate > SERIOUS_SEVERE_RATE {
                severity = severity.max(Severity::Severe);
            } else if serious_rate > SERIOUS_MODERATE_RATE {
                severity = severity.max(Severity::Moderate);
            }
        }
    }

    (severity, stats)
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{cut}…")
}
