//! Greedy monotone matching of predicted beats to onsets.
//!
//! The matcher walks predictions left to right while a cursor moves
//! forward over the reference onsets, never resetting. For each
//! prediction the cursor advances while the next reference is strictly
//! closer, then the prediction is matched to the cursor. A reference
//! onset can therefore serve several predictions when predictions are
//! denser than onsets; that reuse is deliberate and downstream scoring
//! depends on it. If the lookahead runs off the end of the reference,
//! the current prediction is matched against the final onset and the
//! walk stops.
//!
//! Complexity: O(|predictions| + |reference|).

use serde::{Deserialize, Serialize};

/// A prediction matched to its closest-not-passed reference onset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Hypothesis-local beat index of the prediction.
    pub index: i64,
    /// Predicted beat time.
    pub predicted: f64,
    /// Matched reference onset.
    pub matched: f64,
}

/// Matches `predictions` (ordered by time) against `reference`
/// (ordered onsets). Returns no matches when the reference is empty.
pub fn project(predictions: &[(i64, f64)], reference: &[f64]) -> Vec<Match> {
    if reference.is_empty() {
        return Vec::new();
    }
    let mut matches = Vec::with_capacity(predictions.len());
    let mut cursor = 0;
    for &(index, predicted) in predictions {
        let mut dist = (reference[cursor] - predicted).abs();
        loop {
            match reference.get(cursor + 1) {
                Some(&next) => {
                    let next_dist = (next - predicted).abs();
                    if next_dist < dist {
                        cursor += 1;
                        dist = next_dist;
                    } else {
                        break;
                    }
                }
                None => {
                    // Reference exhausted mid-lookahead: close out here.
                    matches.push(Match {
                        index,
                        predicted,
                        matched: reference[cursor],
                    });
                    return matches;
                }
            }
        }
        matches.push(Match {
            index,
            predicted,
            matched: reference[cursor],
        });
    }
    matches
}

/// Like [`project`], but never drops predictions: once the reference
/// is exhausted, every remaining prediction is matched against the
/// final onset. Guarantees one match per prediction for a non-empty
/// reference; the confidence evaluator relies on that.
pub fn project_saturating(predictions: &[(i64, f64)], reference: &[f64]) -> Vec<Match> {
    let mut matches = project(predictions, reference);
    if let Some(&last) = reference.last() {
        for &(index, predicted) in &predictions[matches.len()..] {
            matches.push(Match {
                index,
                predicted,
                matched: last,
            });
        }
    }
    matches
}
