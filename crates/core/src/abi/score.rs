use std::collections::BTreeSet;

use crate::db::{Selector, SignatureRecord};

/// Bonus for signatures whose parameters all carry real names.
const NAMED_PARAMS_BONUS: f64 = 100.0;

/// Weight of the observed-side overlap term.
const OBSERVED_OVERLAP_WEIGHT: f64 = 10.0;

/// Relevance of `candidate` given every selector observed in the same target.
///
/// Sum of three terms:
/// - `10 * |cooccurs ∩ observed| / |observed|`
/// - `|cooccurs ∩ observed| / |cooccurs|` (0 when the candidate has no co-occurrences)
/// - `100` when no parameter has a generic `param<N>` name
pub fn match_score(candidate: &SignatureRecord, observed: &BTreeSet<Selector>) -> f64 {
    let shared = observed.iter().filter(|s| candidate.cooccurs.contains(*s)).count() as f64;

    let observed_term = if observed.is_empty() {
        0.0
    } else {
        OBSERVED_OVERLAP_WEIGHT * shared / observed.len() as f64
    };

    let candidate_term = if candidate.cooccurs.is_empty() {
        0.0
    } else {
        shared / candidate.cooccurs.len() as f64
    };

    let naming_term = if candidate.has_placeholder_params() { 0.0 } else { NAMED_PARAMS_BONUS };

    observed_term + candidate_term + naming_term
}

/// Pick the highest scoring candidate. Only a strictly greater score displaces
/// the current best, so ties go to the earliest candidate; nothing is picked
/// unless some score is positive.
pub fn best_candidate<'a>(
    candidates: &'a [SignatureRecord],
    observed: &BTreeSet<Selector>,
) -> Option<(&'a SignatureRecord, f64)> {
    let mut best: Option<(&SignatureRecord, f64)> = None;
    let mut best_score = 0.0;
    for candidate in candidates {
        let score = match_score(candidate, observed);
        if score > best_score {
            best_score = score;
            best = Some((candidate, score));
        }
    }
    best
}
