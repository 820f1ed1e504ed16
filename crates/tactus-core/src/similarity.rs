//! Similarity between competing hypotheses.
//!
//! The engine prunes a hypothesis when it is nearly indistinguishable
//! from an older one. The production measure compares periods and
//! phases modulo the period at their closest point; two alternates
//! (exact equivalence, projection confidence) are kept for analysis.

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceEvaluator;
use crate::hypothesis::Hypothesis;
use crate::playback::{Playback, PlaybackView};

/// A configured similarity measure in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    /// Relative closeness of periods and phases (mod period). The
    /// production default.
    MinDist,
    /// 1 iff periods are equal and phases differ by a whole number of
    /// periods.
    Identity,
    /// Confidence of one hypothesis over the other's projections.
    ProjConf,
    /// Always 0; disables pruning.
    Disabled,
}

impl SimilarityMeasure {
    /// Similarity of `i` (the newer hypothesis) to `h` under the
    /// current playback.
    pub fn similarity<P: PlaybackView>(&self, h: &Hypothesis, i: &Hypothesis, play: &P) -> f64 {
        match self {
            SimilarityMeasure::MinDist => min_dist_similarity(h, i),
            SimilarityMeasure::Identity => {
                let whole_periods = ((h.rho - i.rho) / i.delta).fract() == 0.0;
                if h.delta == i.delta && whole_periods {
                    1.0
                } else {
                    0.0
                }
            }
            SimilarityMeasure::ProjConf => {
                let times = i.project_times(play.min(), play.max());
                match Playback::new(times) {
                    Ok(projected) => ConfidenceEvaluator::all_history()
                        .evaluate(h, &projected)
                        .unwrap_or(0.0),
                    Err(_) => 0.0,
                }
            }
            SimilarityMeasure::Disabled => 0.0,
        }
    }
}

/// Relative similarity at the closest point of two hypotheses.
///
/// The phase distance `R` is folded into `[0, delta/2]` so that phases
/// a whole period apart count as identical.
fn min_dist_similarity(h: &Hypothesis, i: &Hypothesis) -> f64 {
    let period_gap = (h.delta - i.delta).abs();
    let d_delta = period_gap / h.delta.max(i.delta);
    let r = (i.rho - h.rho).abs() % h.delta;
    let half = h.delta / 2.0;
    let d_rho = (half - (r - half).abs()) / half;
    1.0 - d_delta.max(d_rho)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::OngoingPlayback;

    fn min_dist(h: (f64, f64), i: (f64, f64)) -> f64 {
        let play = OngoingPlayback::new(vec![0.0]).unwrap();
        SimilarityMeasure::MinDist.similarity(
            &Hypothesis::new(h.0, h.1),
            &Hypothesis::new(i.0, i.1),
            &play,
        )
    }

    #[test]
    fn self_similarity_is_one() {
        assert_eq!(min_dist((0.0, 500.0), (0.0, 500.0)), 1.0);
        assert_eq!(min_dist((37.0, 613.0), (37.0, 613.0)), 1.0);
    }

    #[test]
    fn phase_shift_by_whole_periods_is_invisible() {
        assert_eq!(min_dist((0.0, 500.0), (500.0, 500.0)), 1.0);
        assert_eq!(min_dist((0.0, 500.0), (1500.0, 500.0)), 1.0);
    }

    #[test]
    fn half_period_phase_shift_is_maximally_different() {
        assert_eq!(min_dist((0.0, 500.0), (250.0, 500.0)), 0.0);
    }

    #[test]
    fn double_period_differs_by_half() {
        assert_eq!(min_dist((0.0, 500.0), (0.0, 250.0)), 0.5);
    }

    #[test]
    fn stays_in_unit_interval() {
        let cases = [
            ((0.0, 500.0), (130.0, 730.0)),
            ((10.0, 187.5), (900.0, 1500.0)),
            ((5.0, 300.0), (5.0, 301.0)),
        ];
        for (h, i) in cases {
            let s = min_dist(h, i);
            assert!((0.0..=1.0).contains(&s), "sim {s} out of range");
        }
    }

    #[test]
    fn nearly_symmetric_for_close_hypotheses() {
        let a = (3.0, 500.0);
        let b = (7.0, 502.0);
        let forward = min_dist(a, b);
        let backward = min_dist(b, a);
        assert!((forward - backward).abs() < 0.01);
    }

    #[test]
    fn identity_measure_requires_exact_equivalence() {
        let play = OngoingPlayback::new(vec![0.0]).unwrap();
        let m = SimilarityMeasure::Identity;
        let base = Hypothesis::new(0.0, 500.0);
        assert_eq!(m.similarity(&base, &Hypothesis::new(1000.0, 500.0), &play), 1.0);
        assert_eq!(m.similarity(&base, &Hypothesis::new(250.0, 500.0), &play), 0.0);
        assert_eq!(m.similarity(&base, &Hypothesis::new(0.0, 499.0), &play), 0.0);
    }

    #[test]
    fn proj_conf_scores_matching_hypotheses_high() {
        let mut play = OngoingPlayback::new(vec![0.0, 500.0, 1000.0, 1500.0]).unwrap();
        while play.advance() {}
        let m = SimilarityMeasure::ProjConf;
        let h = Hypothesis::new(0.0, 500.0);
        let same = m.similarity(&h, &Hypothesis::new(0.0, 500.0), &play);
        let offset = m.similarity(&h, &Hypothesis::new(250.0, 500.0), &play);
        assert!(same > 0.99);
        assert!(offset < same);
    }

    #[test]
    fn disabled_measure_never_matches() {
        let play = OngoingPlayback::new(vec![0.0]).unwrap();
        assert_eq!(
            SimilarityMeasure::Disabled.similarity(
                &Hypothesis::new(0.0, 500.0),
                &Hypothesis::new(0.0, 500.0),
                &play
            ),
            0.0
        );
    }
}
