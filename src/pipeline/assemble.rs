//! Pure assembly of reports from standardized evidence: merge, consensus,
//! confidence, summary selection, and key notes. No I/O happens here; the
//! orchestrator feeds provider outcomes in and persists what comes out.

use std::collections::HashMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::evidence::confidence::aggregate_confidence;
use crate::evidence::consensus::{consensus_severity, reliability_weight};
use crate::evidence::merge::merge_by_origin;
use crate::evidence::{confidence, EvidenceRecord, Severity};
use crate::normalize::{pair_key, NormalizedItem};
use crate::report::{PairReport, SingleReport, TripleReport};

const MAX_KEY_NOTES: usize = 3;
const NOTE_MAX_CHARS: usize = 160;

/// Reduce a pair's standardized evidence to its report.
///
/// `primary_clean_count` is how many primary providers were attempted and
/// completed without error; `rxnorm_failed` is true when the
/// rxnorm_interactions probe was attempted and errored.
pub fn assemble_pair_report(
    a: &NormalizedItem,
    b: &NormalizedItem,
    records: Vec<EvidenceRecord>,
    primary_clean_count: usize,
    rxnorm_failed: bool,
) -> PairReport {
    let merged = merge_by_origin(records);
    let mut severity = consensus_severity(&merged);
    if merged.is_empty() && primary_clean_count > 0 && severity == Severity::Unknown {
        // At least one primary looked and found nothing.
        severity = Severity::None;
    }
    let confidence = confidence::pair_confidence(&merged, primary_clean_count, rxnorm_failed);
    let summary = pair_summary(&a.original, &b.original, &merged, primary_clean_count);
    let key_notes = extract_key_notes(&merged);

    PairReport {
        a_original: a.original.clone(),
        b_original: b.original.clone(),
        severity,
        confidence,
        sources: merged,
        summary,
        key_notes,
    }
}

/// Reduce one item's evidence (single-drug adverse events plus its own
/// label warnings) to a single report. `adverse_clean` is whether the
/// adverse-event fetch completed without error.
pub fn assemble_single_report(
    item: &NormalizedItem,
    records: Vec<EvidenceRecord>,
    adverse_clean: bool,
) -> SingleReport {
    let merged = merge_by_origin(records);
    let mut severity = consensus_severity(&merged);
    if merged.is_empty() && adverse_clean && severity == Severity::Unknown {
        severity = Severity::None;
    }
    let confidence = if merged.is_empty() {
        if adverse_clean {
            confidence::baseline_for_primary_count(1)
        } else {
            0.0
        }
    } else {
        aggregate_confidence(&merged)
    };
    let summary = match best_source(&merged) {
        Some(record) => record.summary.clone(),
        None if adverse_clean => {
            format!("No significant safety signals found for {}.", item.original)
        }
        None => format!("Limited evidence available for {}.", item.original),
    };
    let key_notes = extract_key_notes(&merged);

    SingleReport {
        original: item.original.clone(),
        normalized: item.normalized.clone(),
        severity,
        confidence,
        sources: merged,
        summary,
        key_notes,
    }
}

/// Reduce a triple from its three constituent pair reports. No new
/// upstream evidence exists at this stage: the source union is re-merged
/// and re-scored.
pub fn assemble_triple_report(
    a: &NormalizedItem,
    b: &NormalizedItem,
    c: &NormalizedItem,
    pairs_by_key: &HashMap<String, PairReport>,
) -> TripleReport {
    let keys = [
        pair_key(&a.normalized, &b.normalized),
        pair_key(&a.normalized, &c.normalized),
        pair_key(&b.normalized, &c.normalized),
    ];
    let constituents: Vec<&PairReport> =
        keys.iter().filter_map(|key| pairs_by_key.get(key)).collect();

    let union: Vec<EvidenceRecord> = constituents
        .iter()
        .flat_map(|pair| pair.sources.iter().cloned())
        .collect();
    let merged = merge_by_origin(union);

    let names = format!("{}, {}, and {}", a.original, b.original, c.original);
    let (severity, confidence, summary) = if merged.is_empty() {
        // All three pairs came up empty; carry their verdicts forward.
        let severity = constituents
            .iter()
            .map(|pair| pair.severity)
            .max()
            .unwrap_or(Severity::Unknown);
        let confidence = constituents
            .iter()
            .map(|pair| pair.confidence)
            .fold(f64::INFINITY, f64::min);
        let confidence = if confidence.is_finite() { confidence } else { 0.0 };
        let summary = if severity == Severity::None {
            format!("No significant interactions found among {names}.")
        } else {
            format!("Limited evidence available for {names}.")
        };
        (severity, confidence, summary)
    } else {
        let severity = consensus_severity(&merged);
        let confidence = aggregate_confidence(&merged);
        let summary = best_source(&merged)
            .map(|record| record.summary.clone())
            .unwrap_or_else(|| format!("Combined evidence review for {names}."));
        (severity, confidence, summary)
    };
    let key_notes = extract_key_notes(&merged);

    TripleReport {
        a_original: a.original.clone(),
        b_original: b.original.clone(),
        c_original: c.original.clone(),
        severity,
        confidence,
        sources: merged,
        summary,
        key_notes,
    }
}

/// Stable content hash over the merged source list, for cheap change
/// detection on pair cache rows.
pub fn sources_hash(sources: &[EvidenceRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in sources {
        hasher.update(record.origin.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(record.severity.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(record.summary.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn pair_summary(
    a_original: &str,
    b_original: &str,
    merged: &[EvidenceRecord],
    primary_clean_count: usize,
) -> String {
    if let Some(best) = best_source(merged) {
        return best.summary.clone();
    }
    if primary_clean_count > 0 {
        format!("No significant interactions found between {a_original} and {b_original}.")
    } else {
        format!("Limited evidence available for {a_original} and {b_original}.")
    }
}

/// The most reliable source; ties keep the merge order (which lists
/// origins in enum order, most reliable families first).
fn best_source(merged: &[EvidenceRecord]) -> Option<&EvidenceRecord> {
    let mut best: Option<&EvidenceRecord> = None;
    for record in merged {
        let better = match best {
            Some(current) => {
                reliability_weight(record.origin) > reliability_weight(current.origin)
            }
            None => true,
        };
        if better {
            best = Some(record);
        }
    }
    best
}

/// Up to three short notes, most reliable origins first.
pub fn extract_key_notes(merged: &[EvidenceRecord]) -> Vec<String> {
    let mut ordered: Vec<&EvidenceRecord> = merged.iter().collect();
    ordered.sort_by(|x, y| {
        reliability_weight(y.origin).total_cmp(&reliability_weight(x.origin))
    });

    let mut notes: Vec<String> = Vec::new();
    for record in ordered {
        let note = match record.details.get("topOutcomes") {
            Some(Value::Object(outcomes)) if !outcomes.is_empty() => {
                let reactions: Vec<&str> =
                    outcomes.keys().take(3).map(String::as_str).collect();
                format!("Most reported reactions: {}.", reactions.join(", "))
            }
            _ => first_sentence(&record.summary),
        };
        if note.is_empty() || notes.contains(&note) {
            continue;
        }
        notes.push(note);
        if notes.len() == MAX_KEY_NOTES {
            break;
        }
    }
    notes
}

fn first_sentence(text: &str) -> String {
    let sentence = match text.find(". ") {
        Some(idx) => &text[..=idx],
        None => text,
    };
    let sentence = sentence.trim();
    if sentence.chars().count() <= NOTE_MAX_CHARS {
        return sentence.to_string();
    }
    let cut: String = sentence.chars().take(NOTE_MAX_CHARS).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::confidence::base_confidence;
    use crate::evidence::standardize::{
        standardize_label_overlap, standardize_pair_adverse, standardize_rxnorm,
    };
    use crate::evidence::Origin;
    use crate::normalize::canonicalize;
    use crate::providers::{AdverseEventSummary, LabelData, RxnormInteraction};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn item(name: &str) -> NormalizedItem {
        NormalizedItem {
            normalized: canonicalize(name),
            original: name.to_string(),
        }
    }

    fn rxnorm_severe() -> EvidenceRecord {
        standardize_rxnorm(
            &RxnormInteraction {
                severity: "major".into(),
                description: "Increased risk of bleeding.".into(),
                source: "ONCHigh".into(),
            },
            Utc::now(),
        )
    }

    fn literature_severe() -> EvidenceRecord {
        EvidenceRecord::new(
            Origin::LiteratureAi,
            Severity::Severe,
            base_confidence(Origin::LiteratureAi),
            "Case reports describe severe potentiation.",
            Utc::now(),
        )
    }

    #[test]
    fn rxnorm_only_severe_pair() {
        let report = assemble_pair_report(
            &item("warfarin"),
            &item("ibuprofen"),
            vec![rxnorm_severe()],
            2,
            false,
        );
        assert_eq!(report.severity, Severity::Severe);
        assert!((report.confidence - 0.85).abs() < 1e-9);
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].origin, Origin::RxnormInteractions);
        assert_eq!(report.summary, "Increased risk of bleeding.");
    }

    #[test]
    fn clean_empty_pair_is_none_with_baseline_confidence() {
        let report = assemble_pair_report(
            &item("metformin"),
            &item("ibuprofen"),
            Vec::new(),
            3,
            false,
        );
        assert_eq!(report.severity, Severity::None);
        assert!((0.30..=0.70).contains(&report.confidence));
        assert!(report
            .summary
            .starts_with("No significant interactions found"));
        assert!(report.sources.is_empty());
    }

    #[test]
    fn no_clean_primary_is_unknown_with_zero_confidence() {
        let report =
            assemble_pair_report(&item("drug a"), &item("drug b"), Vec::new(), 0, false);
        assert_eq!(report.severity, Severity::Unknown);
        assert_eq!(report.confidence, 0.0);
        assert!(report.summary.starts_with("Limited evidence available"));
    }

    #[test]
    fn rxnorm_failure_zeroes_confidence_even_with_evidence() {
        let label = LabelData {
            product_name: Some("Coumadin".into()),
            identifier: None,
            warnings: vec!["Do not combine with ibuprofen.".into()],
        };
        let overlap =
            standardize_label_overlap("warfarin", "ibuprofen", &label, Utc::now()).unwrap();
        let report = assemble_pair_report(
            &item("warfarin"),
            &item("ibuprofen"),
            vec![overlap],
            1,
            true,
        );
        assert_eq!(report.confidence, 0.0);
        // The evidence itself is still reported.
        assert_eq!(report.sources.len(), 1);
    }

    #[test]
    fn high_reliability_disagreement_demotes_to_moderate() {
        let adverse = standardize_pair_adverse(
            "warfarin",
            "ibuprofen",
            &AdverseEventSummary {
                total_events: 4_000,
                serious_events: 1_500,
                outcomes: BTreeMap::new(),
            },
            None,
            None,
            Utc::now(),
        );
        assert_eq!(adverse.severity, Severity::Severe);
        let label = LabelData {
            product_name: None,
            identifier: None,
            warnings: vec!["Monitor when combined with ibuprofen.".into()],
        };
        let overlap =
            standardize_label_overlap("warfarin", "ibuprofen", &label, Utc::now()).unwrap();

        let report = assemble_pair_report(
            &item("warfarin"),
            &item("ibuprofen"),
            vec![adverse, overlap],
            2,
            false,
        );
        assert_eq!(report.severity, Severity::Moderate);
    }

    #[test]
    fn literature_alone_cannot_drive_severe() {
        let report = assemble_pair_report(
            &item("st john's wort"),
            &item("sertraline"),
            vec![literature_severe()],
            1,
            false,
        );
        assert_eq!(report.severity, Severity::Moderate);
    }

    #[test]
    fn summary_prefers_the_most_reliable_source() {
        let label = LabelData {
            product_name: Some("Coumadin".into()),
            identifier: None,
            warnings: vec!["Mentions ibuprofen at length with lots of words.".into()],
        };
        let overlap =
            standardize_label_overlap("warfarin", "ibuprofen", &label, Utc::now()).unwrap();
        let report = assemble_pair_report(
            &item("warfarin"),
            &item("ibuprofen"),
            vec![overlap, rxnorm_severe()],
            2,
            false,
        );
        // rxnorm (weight 1.0) beats label (0.9) regardless of length.
        assert_eq!(report.summary, "Increased risk of bleeding.");
    }

    #[test]
    fn key_notes_cap_at_three_and_summarize_outcomes() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert("NAUSEA".to_string(), 50_u64);
        outcomes.insert("RASH".to_string(), 20_u64);
        let adverse = standardize_pair_adverse(
            "a",
            "b",
            &AdverseEventSummary {
                total_events: 300,
                serious_events: 10,
                outcomes,
            },
            None,
            None,
            Utc::now(),
        );
        let label = LabelData {
            product_name: None,
            identifier: None,
            warnings: vec!["Warning one about b. More detail here.".into()],
        };
        let overlap = standardize_label_overlap("a", "b", &label, Utc::now()).unwrap();
        let report = assemble_pair_report(
            &item("a"),
            &item("b"),
            vec![adverse, overlap, rxnorm_severe(), literature_severe()],
            2,
            false,
        );
        assert!(report.key_notes.len() <= 3);
        assert!(report
            .key_notes
            .iter()
            .any(|note| note.starts_with("Most reported reactions:")));
        // Most reliable first: rxnorm's sentence leads.
        assert_eq!(report.key_notes[0], "Increased risk of bleeding.");
    }

    #[test]
    fn single_report_without_sources_reflects_fetch_health() {
        let clean = assemble_single_report(&item("metformin"), Vec::new(), true);
        assert_eq!(clean.severity, Severity::None);
        assert!((clean.confidence - 0.30).abs() < 1e-12);
        assert!(clean.summary.starts_with("No significant safety signals"));

        let failed = assemble_single_report(&item("metformin"), Vec::new(), false);
        assert_eq!(failed.severity, Severity::Unknown);
        assert_eq!(failed.confidence, 0.0);
        assert!(failed.summary.starts_with("Limited evidence available"));
    }

    #[test]
    fn triple_unions_its_pairs_without_new_fetches() {
        let a = item("warfarin");
        let b = item("ibuprofen");
        let c = item("fish oil");

        let ab = assemble_pair_report(&a, &b, vec![rxnorm_severe()], 2, false);
        let ac_label = standardize_label_overlap(
            "warfarin",
            "fish oil",
            &LabelData {
                product_name: None,
                identifier: None,
                warnings: vec!["Monitor with fish oil supplements.".into()],
            },
            Utc::now(),
        )
        .unwrap();
        let ac = assemble_pair_report(&a, &c, vec![ac_label], 1, false);
        let bc_adverse = standardize_pair_adverse(
            "ibuprofen",
            "fish oil",
            &AdverseEventSummary {
                total_events: 40,
                serious_events: 2,
                outcomes: BTreeMap::new(),
            },
            None,
            None,
            Utc::now(),
        );
        let bc = assemble_pair_report(&b, &c, vec![bc_adverse], 1, false);

        assert_eq!(ab.severity, Severity::Severe);
        assert_eq!(ac.severity, Severity::Moderate);
        assert_eq!(bc.severity, Severity::Mild);

        let mut pairs_by_key = HashMap::new();
        pairs_by_key.insert(pair_key(&a.normalized, &b.normalized), ab);
        pairs_by_key.insert(pair_key(&a.normalized, &c.normalized), ac);
        pairs_by_key.insert(pair_key(&b.normalized, &c.normalized), bc);

        let triple = assemble_triple_report(&a, &b, &c, &pairs_by_key);
        // The high-reliability severe vote from the AB pair carries.
        assert_eq!(triple.severity, Severity::Severe);
        assert_eq!(triple.sources.len(), 3);
        assert!(triple.confidence > 0.0);
        assert!(triple.confidence <= 0.95);
    }

    #[test]
    fn triple_of_empty_pairs_carries_the_pair_verdicts() {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let mut pairs_by_key = HashMap::new();
        for (x, y) in [(&a, &b), (&a, &c), (&b, &c)] {
            pairs_by_key.insert(
                pair_key(&x.normalized, &y.normalized),
                assemble_pair_report(x, y, Vec::new(), 2, false),
            );
        }
        let triple = assemble_triple_report(&a, &b, &c, &pairs_by_key);
        assert_eq!(triple.severity, Severity::None);
        assert!((triple.confidence - 0.50).abs() < 1e-12);
        assert!(triple
            .summary
            .starts_with("No significant interactions found among"));
    }

    #[test]
    fn sources_hash_is_stable_and_content_sensitive() {
        let records = vec![rxnorm_severe()];
        let one = sources_hash(&records);
        let two = sources_hash(&records);
        assert_eq!(one, two);
        assert_eq!(one.len(), 64);

        let different = sources_hash(&[literature_severe()]);
        assert_ne!(one, different);
        assert_eq!(sources_hash(&[]).len(), 64);
    }
}
