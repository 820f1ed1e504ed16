//! Hypothesis correction by regression over smoothed errors.
//!
//! Each step a hypothesis is corrected by projecting its beats over
//! the discovered window, matching projections to onsets, and fitting
//! a line through the smoothed prediction errors against the beat
//! index:
//!
//! ```text
//! err_i = matched_i - predicted_i
//! y_i   = mult * err_i * w(err_i / delta)
//! y ~ slope * x + intercept    =>    delta += slope, rho += intercept
//! ```
//!
//! The weight kernel tones down outliers so a single off-beat onset
//! cannot drag the whole line. An underdetermined fit (fewer than two
//! matched points) leaves the hypothesis untouched.

use serde::{Deserialize, Serialize};

use tactus_math::{linear_regression, LinearFit};

use crate::confidence::WeightKind;
use crate::hypothesis::Hypothesis;
use crate::matching::project;
use crate::playback::PlaybackView;

/// Default error multiplier for the smoothed correction.
pub const CORRECTION_MULT: f64 = 2.0;
/// Default decay for the correction weight kernel.
pub const CORRECTION_DECAY: f64 = 1e-4;
/// Default iteration count for the iterated correction.
pub const ITERATED_TIMES: usize = 5;

/// Regression quality indicators recorded with a correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub r_value: f64,
    pub p_value: f64,
    pub stderr: f64,
}

impl From<LinearFit> for FitDiagnostics {
    fn from(fit: LinearFit) -> Self {
        Self {
            r_value: fit.r_value,
            p_value: fit.p_value,
            stderr: fit.stderr,
        }
    }
}

/// One correction event: the hypothesis before, after, and the applied
/// shift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub old_rho: f64,
    pub old_delta: f64,
    pub new_rho: f64,
    pub new_delta: f64,
    pub d_rho: f64,
    pub d_delta: f64,
    pub diagnostics: Option<FitDiagnostics>,
}

impl Correction {
    /// A correction that leaves the hypothesis unchanged.
    pub fn identity(h: &Hypothesis) -> Self {
        Self {
            old_rho: h.rho,
            old_delta: h.delta,
            new_rho: h.rho,
            new_delta: h.delta,
            d_rho: 0.0,
            d_delta: 0.0,
            diagnostics: None,
        }
    }

    fn shifted(h: &Hypothesis, fit: LinearFit) -> Self {
        Self {
            old_rho: h.rho,
            old_delta: h.delta,
            new_rho: h.rho + fit.intercept,
            new_delta: h.delta + fit.slope,
            d_rho: fit.intercept,
            d_delta: fit.slope,
            diagnostics: Some(fit.into()),
        }
    }

    /// The corrected hypothesis.
    pub fn new_hypothesis(&self) -> Hypothesis {
        Hypothesis::new(self.new_rho, self.new_delta)
    }

    /// Whether this correction changed anything.
    pub fn is_identity(&self) -> bool {
        self.d_rho == 0.0 && self.d_delta == 0.0 && self.diagnostics.is_none()
    }
}

/// Fit a line through the smoothed errors of `h` over `reference`.
fn smoothed_fit(
    h: &Hypothesis,
    reference: &[f64],
    mult: f64,
    weight: WeightKind,
) -> Option<LinearFit> {
    if reference.is_empty() {
        return None;
    }
    let predictions = h.project_range(reference[0], reference[reference.len() - 1]);
    let matches = project(&predictions, reference);
    if matches.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = matches.iter().map(|m| m.index as f64).collect();
    let ys: Vec<f64> = matches
        .iter()
        .map(|m| {
            let err = m.matched - m.predicted;
            mult * err * weight.weight(err, h.delta)
        })
        .collect();
    linear_regression(&xs, &ys)
}

/// A configured correction operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectionMethod {
    /// Regression over weighted errors across the whole discovered
    /// window. The production default.
    Smoothed { mult: f64, weight: WeightKind },
    /// Smoothed correction whose multiplier scales with the period:
    /// `mult = -delta / ln(decay)`, exponential kernel.
    Peaked { decay: f64 },
    /// Applies the smoothed correction repeatedly, feeding each
    /// result into the next fit.
    Iterated {
        mult: f64,
        weight: WeightKind,
        times: usize,
    },
    /// Smoothed correction over a recency window, re-anchored at its
    /// own last projections.
    Windowed { mult: f64, decay: f64, window: f64 },
    /// No correction. Regression fallback and test stand-in.
    Identity,
}

impl CorrectionMethod {
    /// Production default: Gaussian smoothing, `mult = 2`,
    /// `decay = 1e-4`.
    pub fn smoothed_default() -> Self {
        CorrectionMethod::Smoothed {
            mult: CORRECTION_MULT,
            weight: WeightKind::Gaussian {
                decay: CORRECTION_DECAY,
            },
        }
    }

    /// Period-scaled variant with the default decay.
    pub fn peaked_default() -> Self {
        CorrectionMethod::Peaked {
            decay: CORRECTION_DECAY,
        }
    }

    /// Iterated variant with the default parameters.
    pub fn iterated_default() -> Self {
        CorrectionMethod::Iterated {
            mult: CORRECTION_MULT,
            weight: WeightKind::Gaussian {
                decay: CORRECTION_DECAY,
            },
            times: ITERATED_TIMES,
        }
    }

    /// Corrects `h` against the visible part of `play`.
    ///
    /// Always returns a correction; failure modes (empty windows,
    /// underdetermined fits) degrade to the identity.
    pub fn apply<P: PlaybackView>(&self, h: &Hypothesis, play: &P) -> Correction {
        let discovered = play.discovered();
        match *self {
            CorrectionMethod::Identity => Correction::identity(h),

            CorrectionMethod::Smoothed { mult, weight } => {
                match smoothed_fit(h, discovered, mult, weight) {
                    Some(fit) => Correction::shifted(h, fit),
                    None => Correction::identity(h),
                }
            }

            CorrectionMethod::Peaked { decay } => {
                let mult = -h.delta / decay.ln();
                let weight = WeightKind::Exponential { base: decay };
                match smoothed_fit(h, discovered, mult, weight) {
                    Some(fit) => Correction::shifted(h, fit),
                    None => Correction::identity(h),
                }
            }

            CorrectionMethod::Iterated { mult, weight, times } => {
                let mut current = *h;
                let mut last_fit = None;
                for _ in 0..times {
                    match smoothed_fit(&current, discovered, mult, weight) {
                        Some(fit) => {
                            current =
                                Hypothesis::new(current.rho + fit.intercept, current.delta + fit.slope);
                            last_fit = Some(fit);
                        }
                        None => break,
                    }
                }
                match last_fit {
                    Some(fit) => Correction {
                        old_rho: h.rho,
                        old_delta: h.delta,
                        new_rho: current.rho,
                        new_delta: current.delta,
                        d_rho: current.rho - h.rho,
                        d_delta: current.delta - h.delta,
                        diagnostics: Some(fit.into()),
                    },
                    None => Correction::identity(h),
                }
            }

            CorrectionMethod::Windowed { mult, decay, window } => {
                if discovered.is_empty() {
                    return Correction::identity(h);
                }
                let last = discovered[discovered.len() - 1];
                let start = discovered.partition_point(|&o| o <= last - window);
                let reference = &discovered[start..];
                if reference.is_empty() {
                    return Correction::identity(h);
                }
                let lo = reference[0];
                let hi = reference[reference.len() - 1];
                if h.project_range(lo, hi).len() < 3 {
                    return Correction::identity(h);
                }
                let weight = WeightKind::Gaussian { decay };
                let Some(fit) = smoothed_fit(h, reference, mult, weight) else {
                    return Correction::identity(h);
                };
                let shifted = Hypothesis::new(h.rho + fit.intercept, h.delta + fit.slope);
                let anchored = shifted.project_times(lo, hi);
                if anchored.len() < 2 {
                    return Correction::identity(h);
                }
                let next_to_last = anchored[anchored.len() - 2];
                let last_beat = anchored[anchored.len() - 1];
                Correction {
                    old_rho: h.rho,
                    old_delta: h.delta,
                    new_rho: next_to_last,
                    new_delta: last_beat - next_to_last,
                    d_rho: fit.intercept,
                    d_delta: fit.slope,
                    diagnostics: Some(fit.into()),
                }
            }
        }
    }
}

impl Default for CorrectionMethod {
    fn default() -> Self {
        Self::smoothed_default()
    }
}
