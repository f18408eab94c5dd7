//! Report and response types for the analysis pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::{EvidenceRecord, Severity};
use crate::normalize::NormalizedItem;

/// Per-pair interaction report. `sources` is the merged evidence list, at
/// most one record per origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairReport {
    pub a_original: String,
    pub b_original: String,
    pub severity: Severity,
    pub confidence: f64,
    pub sources: Vec<EvidenceRecord>,
    pub summary: String,
    pub key_notes: Vec<String>,
}

/// Per-item safety report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleReport {
    pub original: String,
    pub normalized: String,
    pub severity: Severity,
    pub confidence: f64,
    pub sources: Vec<EvidenceRecord>,
    pub summary: String,
    pub key_notes: Vec<String>,
}

/// Per-triple report, derived entirely from the constituent pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripleReport {
    pub a_original: String,
    pub b_original: String,
    pub c_original: String,
    pub severity: Severity,
    pub confidence: f64,
    pub sources: Vec<EvidenceRecord>,
    pub summary: String,
    pub key_notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisResults {
    pub singles: Vec<SingleReport>,
    pub pairs: Vec<PairReport>,
    pub triples: Vec<TripleReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub med_lookup_hits: u32,
    pub med_lookup_misses: u32,
    pub pair_cache_hits: u32,
    pub pair_cache_misses: u32,
    pub cms_cache_hits: u32,
    pub cms_cache_misses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub total_ms: u64,
    pub lookup_ms: u64,
    pub pair_processing_ms: u64,
    pub triple_processing_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    pub calc_version: String,
    pub cache_stats: CacheStats,
    pub timing: Timing,
}

/// One provider attempt, for the debug trace. `ok` semantics differ by
/// provider family: for interaction providers a clean empty result is
/// `ok=true`; for lookup providers the same shape is `ok=false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub attempted: bool,
    pub ok: bool,
    pub elapsed_ms: u64,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub provider_statuses: BTreeMap<String, ProviderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rxcui_resolutions: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub items: Vec<NormalizedItem>,
    pub results: AnalysisResults,
    pub meta: MetaInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Origin;
    use chrono::Utc;

    #[test]
    fn pair_report_serializes_camel_case() {
        let report = PairReport {
            a_original: "Warfarin".into(),
            b_original: "Ibuprofen".into(),
            severity: Severity::Severe,
            confidence: 0.85,
            sources: vec![EvidenceRecord::new(
                Origin::RxnormInteractions,
                Severity::Severe,
                0.85,
                "Increased risk of bleeding.",
                Utc::now(),
            )],
            summary: "Increased risk of bleeding.".into(),
            key_notes: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["aOriginal"], "Warfarin");
        assert_eq!(json["severity"], "severe");
        assert_eq!(json["sources"][0]["origin"], "rxnorm_interactions");
        assert!(json.get("keyNotes").is_some());
    }

    #[test]
    fn cache_stats_keys_match_the_wire_contract() {
        let json = serde_json::to_value(CacheStats::default()).unwrap();
        for key in [
            "medLookupHits",
            "medLookupMisses",
            "pairCacheHits",
            "pairCacheMisses",
            "cmsCacheHits",
            "cmsCacheMisses",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn timing_keys_match_the_wire_contract() {
        let json = serde_json::to_value(Timing::default()).unwrap();
        for key in ["totalMs", "lookupMs", "pairProcessingMs", "tripleProcessingMs"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn pair_report_round_trips() {
        let report = PairReport {
            a_original: "a".into(),
            b_original: "b".into(),
            severity: Severity::None,
            confidence: 0.5,
            sources: vec![],
            summary: "No significant interactions found between a and b.".into(),
            key_notes: vec!["note".into()],
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: PairReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
