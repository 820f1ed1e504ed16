//! Property-based tests for the greedy matcher.

use proptest::prelude::*;
use tactus_core::{project, project_saturating};

fn sorted_vec(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0..10_000.0f64, 1..max_len).prop_map(|mut v| {
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    })
}

fn indexed(values: &[f64]) -> Vec<(i64, f64)> {
    values.iter().enumerate().map(|(i, &v)| (i as i64, v)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Matched onsets never go backwards.
    #[test]
    fn matches_are_monotone(preds in sorted_vec(20), reference in sorted_vec(20)) {
        let matches = project(&indexed(&preds), &reference);
        prop_assert!(matches.windows(2).all(|w| w[0].matched <= w[1].matched));
    }

    /// Every matched value is an actual reference onset.
    #[test]
    fn matches_come_from_the_reference(preds in sorted_vec(20), reference in sorted_vec(20)) {
        let matches = project(&indexed(&preds), &reference);
        for m in &matches {
            prop_assert!(reference.iter().any(|&r| r == m.matched));
        }
    }

    /// The saturating form matches every prediction exactly once.
    #[test]
    fn saturating_preserves_length(preds in sorted_vec(20), reference in sorted_vec(20)) {
        let matches = project_saturating(&indexed(&preds), &reference);
        prop_assert_eq!(matches.len(), preds.len());
        let indices: Vec<i64> = matches.iter().map(|m| m.index).collect();
        let expected: Vec<i64> = (0..preds.len() as i64).collect();
        prop_assert_eq!(indices, expected);
    }

    /// No reference onset strictly between a prediction and its match
    /// sits behind the cursor: the match is the closest onset not yet
    /// passed.
    #[test]
    fn matches_are_greedily_optimal(preds in sorted_vec(12), reference in sorted_vec(12)) {
        let matches = project(&indexed(&preds), &reference);
        let mut floor = 0usize;
        for m in &matches {
            let cursor = reference[floor..]
                .iter()
                .position(|&r| r == m.matched)
                .map(|p| p + floor)
                .unwrap();
            for (i, &r) in reference.iter().enumerate().skip(floor) {
                if i > cursor {
                    break;
                }
                prop_assert!(
                    (r - m.predicted).abs() >= (m.matched - m.predicted).abs() - 1e-9
                );
            }
            floor = cursor;
        }
    }
}
