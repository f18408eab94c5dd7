//! Evidence model shared by the standardizers, merger, consensus, and
//! confidence engines.
//!
//! Every provider result is reduced to an [`EvidenceRecord`], the single
//! shape that flows through the reduction stages. `Severity::None` and
//! `Severity::Unknown` are deliberately distinct: "none" means a primary
//! source looked and found nothing, "unknown" means the evidence was
//! insufficient to decide.

pub mod confidence;
pub mod consensus;
pub mod merge;
pub mod standardize;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Interaction severity. The derived `Ord` is the total order used by the
/// merger and consensus engine: unknown < none < mild < moderate < severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Unknown,
    None,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::None => "none",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logical source family of an evidence record. A closed enumeration:
/// the merger, consensus, and confidence tables are all keyed on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    RxnormInteractions,
    LabelWarnings,
    PairAdverseEvents,
    SupplementInteractions,
    LiteratureAi,
    SingleDrugAdverseEvents,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::RxnormInteractions => "rxnorm_interactions",
            Origin::LabelWarnings => "label_warnings",
            Origin::PairAdverseEvents => "pair_adverse_events",
            Origin::SupplementInteractions => "supplement_interactions",
            Origin::LiteratureAi => "literature_ai",
            Origin::SingleDrugAdverseEvents => "single_drug_adverse_events",
        }
    }

    /// Primary sources directly test for an interaction between the pair.
    /// Label warnings and literature are secondary.
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            Origin::RxnormInteractions
                | Origin::PairAdverseEvents
                | Origin::SupplementInteractions
        )
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the exposure denominator for a rate was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorMethod {
    MinOfPair,
    SingleDrugA,
    SingleDrugB,
}

/// Count and rate facts attached to adverse-event evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_events: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serious_events: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiaries: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serious_event_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denominator_method: Option<DenominatorMethod>,
}

impl EvidenceStats {
    /// Key-wise union: fields set on `other` overwrite this record's.
    pub fn merge_from(&mut self, other: &EvidenceStats) {
        if other.total_events.is_some() {
            self.total_events = other.total_events;
        }
        if other.serious_events.is_some() {
            self.serious_events = other.serious_events;
        }
        if other.beneficiaries.is_some() {
            self.beneficiaries = other.beneficiaries;
        }
        if other.event_rate.is_some() {
            self.event_rate = other.event_rate;
        }
        if other.serious_event_rate.is_some() {
            self.serious_event_rate = other.serious_event_rate;
        }
        if other.denominator_method.is_some() {
            self.denominator_method = other.denominator_method;
        }
    }
}

/// The uniform evidence shape produced by the standardizers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub origin: Origin,
    pub severity: Severity,
    /// In [0, 1]. Seeded from the per-source base table, adjusted by the
    /// confidence engine.
    pub confidence: f64,
    pub summary: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub citations: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<EvidenceStats>,
    pub observed_at: DateTime<Utc>,
}

impl EvidenceRecord {
    pub fn new(
        origin: Origin,
        severity: Severity,
        confidence: f64,
        summary: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            origin,
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            summary: summary.into(),
            details: serde_json::Map::new(),
            citations: BTreeSet::new(),
            stats: None,
            observed_at,
        }
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn with_citation(mut self, citation: impl Into<String>) -> Self {
        self.citations.insert(citation.into());
        self
    }

    pub fn with_stats(mut self, stats: EvidenceStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_total_order() {
        assert!(Severity::Unknown < Severity::None);
        assert!(Severity::None < Severity::Mild);
        assert!(Severity::Mild < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Severe);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Severe).unwrap(), "\"severe\"");
        assert_eq!(serde_json::to_string(&Severity::None).unwrap(), "\"none\"");
        let parsed: Severity = serde_json::from_str("\"moderate\"").unwrap();
        assert_eq!(parsed, Severity::Moderate);
    }

    #[test]
    fn origin_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Origin::PairAdverseEvents).unwrap(),
            "\"pair_adverse_events\""
        );
        assert_eq!(Origin::LiteratureAi.as_str(), "literature_ai");
    }

    #[test]
    fn primary_sources_are_the_interaction_testers() {
        assert!(Origin::RxnormInteractions.is_primary());
        assert!(Origin::PairAdverseEvents.is_primary());
        assert!(Origin::SupplementInteractions.is_primary());
        assert!(!Origin::LabelWarnings.is_primary());
        assert!(!Origin::LiteratureAi.is_primary());
        assert!(!Origin::SingleDrugAdverseEvents.is_primary());
    }

    #[test]
    fn record_confidence_is_clamped_at_construction() {
        let now = Utc::now();
        let r = EvidenceRecord::new(Origin::LiteratureAi, Severity::Mild, 1.7, "x", now);
        assert_eq!(r.confidence, 1.0);
        let r = EvidenceRecord::new(Origin::LiteratureAi, Severity::Mild, -0.2, "x", now);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn stats_merge_is_keywise_with_later_overwriting() {
        let mut a = EvidenceStats {
            total_events: Some(10),
            serious_events: Some(1),
            ..Default::default()
        };
        let b = EvidenceStats {
            serious_events: Some(5),
            beneficiaries: Some(1_000),
            ..Default::default()
        };
        a.merge_from(&b);
        assert_eq!(a.total_events, Some(10));
        assert_eq!(a.serious_events, Some(5));
        assert_eq!(a.beneficiaries, Some(1_000));
    }

    #[test]
    fn record_round_trips_through_json() {
        let now = Utc::now();
        let record = EvidenceRecord::new(
            Origin::RxnormInteractions,
            Severity::Severe,
            0.85,
            "Increased bleeding risk.",
            now,
        )
        .with_citation("ONCHigh")
        .with_detail("partner", Value::String("5640".into()));
        let json = serde_json::to_string(&record).unwrap();
        let back: EvidenceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!(json.contains("\"observedAt\""));
    }
}
