//! Consensus severity: weighted-vote selection with reliability guardrails.
//!
//! A severe verdict requires either a high-reliability severe vote or
//! enough combined severe weight without high-reliability opposition. A
//! lone low-weight severe vote (the literature adapter in particular) can
//! never drive the pair to severe on its own.

use super::{EvidenceRecord, Origin, Severity};

/// Fixed per-origin reliability weights.
pub fn reliability_weight(origin: Origin) -> f64 {
    match origin {
        Origin::RxnormInteractions => 1.0,
        Origin::LabelWarnings => 0.9,
        Origin::PairAdverseEvents => 0.7,
        Origin::SupplementInteractions => 0.6,
        Origin::LiteratureAi => 0.5,
        Origin::SingleDrugAdverseEvents => 0.7,
    }
}

/// Records at or above this weight are high-reliability.
pub const HIGH_RELIABILITY_THRESHOLD: f64 = 0.8;

/// Combined severe weight needed to carry severe without a
/// high-reliability severe vote.
pub const SEVERE_WEIGHT_FLOOR: f64 = 1.5;

/// When a high-reliability record opposes severe, moderate wins if its
/// tally exceeds this share of the severe tally.
pub const MODERATE_VS_SEVERE_RATIO: f64 = 0.8;

fn is_high_reliability(record: &EvidenceRecord) -> bool {
    reliability_weight(record.origin) >= HIGH_RELIABILITY_THRESHOLD
}

/// Derive the consensus severity from a merged evidence list.
pub fn consensus_severity(records: &[EvidenceRecord]) -> Severity {
    if records.is_empty() {
        return Severity::Unknown;
    }

    let tally_for = |severity: Severity| -> f64 {
        records
            .iter()
            .filter(|r| r.severity == severity)
            .map(|r| reliability_weight(r.origin))
            .sum()
    };

    let severe_tally = tally_for(Severity::Severe);
    let moderate_tally = tally_for(Severity::Moderate);

    let high_voted_severe = records
        .iter()
        .any(|r| is_high_reliability(r) && r.severity == Severity::Severe);
    let high_opposed_severe = records.iter().any(|r| {
        is_high_reliability(r)
            && r.severity != Severity::Severe
            && r.severity != Severity::Unknown
    });

    if severe_tally > 0.0 {
        if high_voted_severe {
            return Severity::Severe;
        }
        if severe_tally >= SEVERE_WEIGHT_FLOOR {
            if !high_opposed_severe {
                return Severity::Severe;
            }
            if moderate_tally > MODERATE_VS_SEVERE_RATIO * severe_tally {
                return Severity::Moderate;
            }
            return Severity::Severe;
        }
        if high_opposed_severe {
            return Severity::Moderate;
        }
        if moderate_tally > 0.0 {
            return Severity::Moderate;
        }
        // An unsupported severe tally falls through to the lower classes;
        // with no weight there the listed tie order lands on moderate.
    }

    // Greatest weight among the remaining classes, ties broken in the
    // listed order.
    let mut winner = Severity::Moderate;
    let mut winner_tally = moderate_tally;
    for severity in [Severity::Mild, Severity::None, Severity::Unknown] {
        let tally = tally_for(severity);
        if tally > winner_tally {
            winner = severity;
            winner_tally = tally;
        }
    }
    winner
}
