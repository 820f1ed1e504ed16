//! Confidence evaluation of a hypothesis against discovered onsets.
//!
//! A hypothesis is scored by projecting its beats over a reference
//! window, matching each projection to the closest onset, and weighing
//! the prediction errors:
//!
//! ```text
//! err_i  = matched_i - predicted_i
//! conf_i = mult * w(err_i / delta)
//! S      = sum(conf_i)
//! score  = (S / |P|) * (S / |R|)
//! ```
//!
//! The score is the product of two coverage ratios: how well the
//! projections land on onsets and how much of the reference the
//! projections explain. A hypothesis twice or half the true tempo is
//! penalized by one factor while the other stays high.
//!
//! The evaluator is a small pipeline: window restrictions narrow the
//! reference before projection, entry modifiers reweigh individual
//! matches, end modifiers rescale the reduced score. Non-finite scores
//! are sanitized to zero.

use serde::{Deserialize, Serialize};
use tracing::warn;

use tactus_math::{gaussian_weight, power_weight, truncnorm_pdf};

use crate::accent::{accented_onsets, is_accented};
use crate::error::{Error, Result};
use crate::hypothesis::Hypothesis;
use crate::matching::project_saturating;
use crate::playback::PlaybackView;

/// Default decay for the Gaussian confidence weight.
pub const CONFIDENCE_DECAY: f64 = 5.0;
/// Base of the legacy exponential confidence weight.
pub const LEGACY_WEIGHT_BASE: f64 = 0.01;
/// Default recency window for time-restricted evaluation, in ms.
pub const TIME_WINDOW_MS: f64 = 1000.0;

/// Kernel applied to a relative prediction error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightKind {
    /// `exp(-(decay * err / delta)^2)`; the production default.
    Gaussian { decay: f64 },
    /// `base^(|err| / delta)`; the legacy variant.
    Exponential { base: f64 },
}

impl WeightKind {
    /// Weight of a prediction error for a hypothesis of period `delta`.
    pub fn weight(&self, err: f64, delta: f64) -> f64 {
        match *self {
            WeightKind::Gaussian { decay } => gaussian_weight(decay * err / delta),
            WeightKind::Exponential { base } => power_weight(base, (err / delta).abs()),
        }
    }
}

/// Narrows the reference window before projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowRestriction {
    /// Keep only the last `count` discovered onsets.
    PrevOnsets { count: usize },
    /// Keep onsets within `millis` of the latest one.
    TimeWindow { millis: f64 },
}

impl WindowRestriction {
    fn apply<'a>(&self, reference: &'a [f64]) -> &'a [f64] {
        match *self {
            WindowRestriction::PrevOnsets { count } => {
                &reference[reference.len().saturating_sub(count)..]
            }
            WindowRestriction::TimeWindow { millis } => match reference.last() {
                Some(&last) => {
                    let start = reference.partition_point(|&o| o <= last - millis);
                    &reference[start..]
                }
                None => reference,
            },
        }
    }
}

/// Reweighs individual matched entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryModifier {
    /// Multiplies the confidence of matches landing on accented onsets
    /// (Povel 1985, computed over the full discovered prefix).
    Accent { gain: f64 },
}

/// Rescales the reduced score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndModifier {
    /// Multiplies by a truncated-normal prior over the period.
    DeltaPrior { mu: f64, sigma: f64, lo: f64, hi: f64 },
}

impl EndModifier {
    /// The standard period prior: mean 600 ms, sigma 400 ms, clipped
    /// to the trackable range [187, 1500] ms.
    pub fn delta_prior() -> Self {
        EndModifier::DeltaPrior {
            mu: 600.0,
            sigma: 400.0,
            lo: 187.0,
            hi: 1500.0,
        }
    }

    fn apply(&self, score: f64, delta: f64) -> f64 {
        match *self {
            EndModifier::DeltaPrior { mu, sigma, lo, hi } => {
                score * truncnorm_pdf(delta, mu, sigma, lo, hi)
            }
        }
    }
}

/// Configurable confidence evaluation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEvaluator {
    pub weight: WeightKind,
    pub mult: f64,
    pub restrictions: Vec<WindowRestriction>,
    pub modifiers: Vec<EntryModifier>,
    pub end_modifiers: Vec<EndModifier>,
}

impl ConfidenceEvaluator {
    /// Evaluation over the whole discovered history with the Gaussian
    /// weight. This is the production default.
    pub fn all_history() -> Self {
        Self {
            weight: WeightKind::Gaussian {
                decay: CONFIDENCE_DECAY,
            },
            mult: 1.0,
            restrictions: Vec::new(),
            modifiers: Vec::new(),
            end_modifiers: Vec::new(),
        }
    }

    /// All-history evaluation with the legacy exponential weight.
    pub fn exponential(base: f64) -> Self {
        Self {
            weight: WeightKind::Exponential { base },
            ..Self::all_history()
        }
    }

    /// Restricts evaluation to the last `count` onsets.
    pub fn with_prev_onsets(mut self, count: usize) -> Self {
        self.restrictions.push(WindowRestriction::PrevOnsets { count });
        self
    }

    /// Restricts evaluation to onsets within `millis` of the latest.
    pub fn with_time_window(mut self, millis: f64) -> Self {
        self.restrictions.push(WindowRestriction::TimeWindow { millis });
        self
    }

    /// Boosts matches on accented onsets by `gain`.
    pub fn with_accent(mut self, gain: f64) -> Self {
        self.modifiers.push(EntryModifier::Accent { gain });
        self
    }

    /// Multiplies the score by the standard period prior.
    pub fn with_delta_prior(mut self) -> Self {
        self.end_modifiers.push(EndModifier::delta_prior());
        self
    }

    /// Scores `hypothesis` against the visible part of `play`.
    ///
    /// Degenerate projections yield 0. An empty reference window is a
    /// structural error: the engine never evaluates before the first
    /// onset is discovered.
    pub fn evaluate<P: PlaybackView>(&self, hypothesis: &Hypothesis, play: &P) -> Result<f64> {
        let discovered = play.discovered();
        let mut reference = discovered;
        for restriction in &self.restrictions {
            reference = restriction.apply(reference);
        }
        if reference.is_empty() {
            return Err(Error::EmptyReference);
        }

        let predictions =
            hypothesis.project_range(reference[0], reference[reference.len() - 1]);
        if predictions.is_empty() {
            return Ok(0.0);
        }

        let matches = project_saturating(&predictions, reference);
        let mut confs: Vec<f64> = matches
            .iter()
            .map(|m| self.mult * self.weight.weight(m.matched - m.predicted, hypothesis.delta))
            .collect();

        for modifier in &self.modifiers {
            match *modifier {
                EntryModifier::Accent { gain } => {
                    let accents = accented_onsets(discovered);
                    for (conf, m) in confs.iter_mut().zip(&matches) {
                        if is_accented(&accents, m.matched) {
                            *conf *= gain;
                        }
                    }
                }
            }
        }

        let sum: f64 = confs.iter().sum();
        let mut score =
            (sum / predictions.len() as f64) * (sum / reference.len() as f64);
        for end in &self.end_modifiers {
            score = end.apply(score, hypothesis.delta);
        }

        if !score.is_finite() {
            warn!(
                hypothesis = %hypothesis,
                score,
                "sanitizing non-finite confidence to 0"
            );
            return Ok(0.0);
        }
        Ok(score)
    }
}

impl Default for ConfidenceEvaluator {
    fn default() -> Self {
        Self::all_history()
    }
}
