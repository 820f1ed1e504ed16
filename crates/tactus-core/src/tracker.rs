//! Per-hypothesis tracking records.
//!
//! A tracker is born from a pair of onset indices, carries the initial
//! hypothesis those onsets define, and accumulates one correction and
//! one confidence per processed step. The correction always runs
//! first: the recorded confidence scores the already-corrected
//! hypothesis.

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceEvaluator;
use crate::correction::{Correction, CorrectionMethod};
use crate::error::{Error, Result};
use crate::hypothesis::Hypothesis;
use crate::playback::OngoingPlayback;

/// Evolution record of a single hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisTracker {
    origin: (usize, usize),
    beta: Hypothesis,
    current: Hypothesis,
    corrections: Vec<(usize, Correction)>,
    confidences: Vec<(usize, f64)>,
    onset_times: Vec<f64>,
}

impl HypothesisTracker {
    /// Seeds a tracker from the onset pair `(a, b)`, `a < b`.
    pub fn new(a: usize, b: usize, onset_times: &[f64]) -> Result<Self> {
        if a >= b || b >= onset_times.len() {
            return Err(Error::Config {
                field: "origin",
                message: format!(
                    "origin pair ({a}, {b}) out of range for {} onsets",
                    onset_times.len()
                ),
            });
        }
        let beta = Hypothesis::new(onset_times[a], onset_times[b] - onset_times[a]);
        Ok(Self {
            origin: (a, b),
            beta,
            current: beta,
            corrections: Vec::new(),
            confidences: Vec::new(),
            onset_times: onset_times.to_vec(),
        })
    }

    /// The seeding onset indices.
    pub fn origin(&self) -> (usize, usize) {
        self.origin
    }

    /// Tracker name, `"a-b"` from the origin indices.
    pub fn name(&self) -> String {
        format!("{}-{}", self.origin.0, self.origin.1)
    }

    /// The initial hypothesis.
    pub fn beta(&self) -> Hypothesis {
        self.beta
    }

    /// The hypothesis after the latest correction.
    pub fn current(&self) -> Hypothesis {
        self.current
    }

    /// Correction timeline as `(onset_index, correction)` entries.
    pub fn corrections(&self) -> &[(usize, Correction)] {
        &self.corrections
    }

    /// Confidence timeline as `(onset_index, score)` entries.
    pub fn confidences(&self) -> &[(usize, f64)] {
        &self.confidences
    }

    /// The full onset sequence the tracker was seeded from.
    pub fn onset_times(&self) -> &[f64] {
        &self.onset_times
    }

    /// The seeding onset times `(first, second)`.
    pub fn origin_onsets(&self) -> (f64, f64) {
        (self.beta.rho, self.beta.rho + self.beta.delta)
    }

    /// Most recently recorded confidence.
    pub fn latest_confidence(&self) -> Option<f64> {
        self.confidences.last().map(|&(_, score)| score)
    }

    /// Confidence recorded at `onset_index`, if any.
    pub fn confidence_at(&self, onset_index: usize) -> Option<f64> {
        self.confidences
            .binary_search_by_key(&onset_index, |&(idx, _)| idx)
            .ok()
            .map(|pos| self.confidences[pos].1)
    }

    /// Correction recorded at `onset_index`, if any.
    pub fn correction_at(&self, onset_index: usize) -> Option<&Correction> {
        self.corrections
            .binary_search_by_key(&onset_index, |&(idx, _)| idx)
            .ok()
            .map(|pos| &self.corrections[pos].1)
    }

    /// Advances the tracker one step: correct, then score the
    /// corrected hypothesis.
    pub fn update(
        &mut self,
        play: &OngoingPlayback,
        eval: &ConfidenceEvaluator,
        corr: &CorrectionMethod,
    ) -> Result<()> {
        let index = play.discovered_index();
        debug_assert!(
            self.corrections.last().map_or(true, |&(last, _)| last < index),
            "timeline must advance strictly"
        );
        let correction = corr.apply(&self.current, play);
        self.corrections.push((index, correction));
        self.current = correction.new_hypothesis();

        let score = eval.evaluate(&self.current, play)?;
        self.confidences.push((index, score));
        Ok(())
    }

    /// Appends a pre-computed step. View and export tests build
    /// timelines directly through this.
    #[cfg(test)]
    pub(crate) fn record_step(&mut self, onset_index: usize, correction: Correction, score: f64) {
        self.corrections.push((onset_index, correction));
        self.current = correction.new_hypothesis();
        self.confidences.push((onset_index, score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(count: usize) -> Vec<f64> {
        (0..count).map(|k| k as f64 * 500.0).collect()
    }

    #[test]
    fn seeds_from_onset_pair() {
        let onsets = pulse(6);
        let ht = HypothesisTracker::new(1, 3, &onsets).unwrap();
        assert_eq!(ht.name(), "1-3");
        assert_eq!(ht.origin(), (1, 3));
        assert_eq!(ht.beta(), Hypothesis::new(500.0, 1000.0));
        assert_eq!(ht.current(), ht.beta());
        assert_eq!(ht.origin_onsets(), (500.0, 1500.0));
    }

    #[test]
    fn rejects_malformed_origins() {
        let onsets = pulse(4);
        assert!(HypothesisTracker::new(2, 2, &onsets).is_err());
        assert!(HypothesisTracker::new(3, 1, &onsets).is_err());
        assert!(HypothesisTracker::new(0, 4, &onsets).is_err());
    }

    #[test]
    fn update_appends_aligned_timelines() {
        let onsets = pulse(6);
        let mut play = OngoingPlayback::new(onsets.clone()).unwrap();
        play.advance();
        play.advance();
        let mut ht = HypothesisTracker::new(0, 2, &onsets).unwrap();
        let eval = ConfidenceEvaluator::all_history();
        let corr = CorrectionMethod::Identity;

        ht.update(&play, &eval, &corr).unwrap();
        play.advance();
        ht.update(&play, &eval, &corr).unwrap();

        assert_eq!(ht.corrections().len(), 2);
        assert_eq!(ht.confidences().len(), 2);
        let corr_indices: Vec<usize> = ht.corrections().iter().map(|&(i, _)| i).collect();
        let conf_indices: Vec<usize> = ht.confidences().iter().map(|&(i, _)| i).collect();
        assert_eq!(corr_indices, vec![2, 3]);
        assert_eq!(conf_indices, corr_indices);
    }

    #[test]
    fn current_tracks_the_last_correction() {
        let onsets = vec![0.0, 490.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0];
        let mut play = OngoingPlayback::new(onsets.clone()).unwrap();
        let mut ht = HypothesisTracker::new(0, 1, &onsets).unwrap();
        let eval = ConfidenceEvaluator::all_history();
        let corr = CorrectionMethod::Smoothed {
            mult: 1.0,
            weight: crate::confidence::WeightKind::Gaussian { decay: 1e-4 },
        };
        while play.advance() {
            ht.update(&play, &eval, &corr).unwrap();
        }
        let (_, last) = ht.corrections().last().copied().unwrap();
        assert_eq!(ht.current(), last.new_hypothesis());
        // The period drifted toward the true 500 ms pulse
        assert!((ht.current().delta - 500.0).abs() < (ht.beta().delta - 500.0).abs());
    }

    #[test]
    fn confidence_scores_the_corrected_hypothesis() {
        // A correction that lands exactly on the pulse must yield the
        // perfect confidence for the same step.
        let onsets = pulse(6);
        let mut play = OngoingPlayback::new(onsets.clone()).unwrap();
        let mut ht = HypothesisTracker::new(0, 1, &onsets).unwrap();
        let eval = ConfidenceEvaluator::all_history();
        let corr = CorrectionMethod::Identity;
        while play.advance() {
            ht.update(&play, &eval, &corr).unwrap();
        }
        for &(_, score) in ht.confidences() {
            assert!((score - 1.0).abs() < 1e-12);
        }
    }
}
