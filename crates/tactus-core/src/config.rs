//! Engine configuration and validation.

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceEvaluator;
use crate::correction::CorrectionMethod;
use crate::error::{Error, Result};
use crate::similarity::SimilarityMeasure;

/// Shortest trackable period: 320 bpm.
pub const MIN_DELTA_MS: f64 = 60_000.0 / 320.0;
/// Longest trackable period: 40 bpm.
pub const MAX_DELTA_MS: f64 = 60_000.0 / 40.0;
/// Default pruning threshold.
pub const SIMILARITY_EPSILON: f64 = 0.005;
/// Default cap on concurrently tracked hypotheses.
pub const MAX_HYPOTHESES: usize = 30;

/// Full configuration of a tracking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Confidence evaluator applied after each correction.
    pub eval: ConfidenceEvaluator,
    /// Correction operator applied each step.
    pub corr: CorrectionMethod,
    /// Similarity measure used for pruning.
    pub sim: SimilarityMeasure,
    /// Two hypotheses with similarity above `1 - epsilon` are
    /// duplicates; must lie in (0, 1).
    pub similarity_epsilon: f64,
    /// Smallest admissible seed period, ms.
    pub min_delta: f64,
    /// Largest admissible seed period, ms.
    pub max_delta: f64,
    /// Optional cap: keep only the best-scored hypotheses each step.
    pub max_hypotheses: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            eval: ConfidenceEvaluator::all_history(),
            corr: CorrectionMethod::smoothed_default(),
            sim: SimilarityMeasure::MinDist,
            similarity_epsilon: SIMILARITY_EPSILON,
            min_delta: MIN_DELTA_MS,
            max_delta: MAX_DELTA_MS,
            max_hypotheses: Some(MAX_HYPOTHESES),
        }
    }
}

impl TrackerConfig {
    /// Semantic validation, run once at engine construction.
    pub fn validate(&self) -> Result<()> {
        if !self.min_delta.is_finite() || self.min_delta <= 0.0 {
            return Err(Error::Config {
                field: "min_delta",
                message: format!("must be a positive period in ms, got {}", self.min_delta),
            });
        }
        if !self.max_delta.is_finite() || self.max_delta <= 0.0 {
            return Err(Error::Config {
                field: "max_delta",
                message: format!("must be a positive period in ms, got {}", self.max_delta),
            });
        }
        if self.min_delta > self.max_delta {
            return Err(Error::Config {
                field: "min_delta",
                message: format!(
                    "must not exceed max_delta ({} > {})",
                    self.min_delta, self.max_delta
                ),
            });
        }
        if !(self.similarity_epsilon > 0.0 && self.similarity_epsilon < 1.0) {
            return Err(Error::Config {
                field: "similarity_epsilon",
                message: format!("must lie in (0, 1), got {}", self.similarity_epsilon),
            });
        }
        if self.max_hypotheses == Some(0) {
            return Err(Error::Config {
                field: "max_hypotheses",
                message: "cap must be positive; use None to disable".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
        assert!((TrackerConfig::default().min_delta - 187.5).abs() < 1e-12);
        assert_eq!(TrackerConfig::default().max_delta, 1500.0);
    }

    #[test]
    fn rejects_inverted_period_bounds() {
        let config = TrackerConfig {
            min_delta: 800.0,
            max_delta: 400.0,
            ..TrackerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { field: "min_delta", .. }));
    }

    #[test]
    fn rejects_non_positive_periods() {
        let config = TrackerConfig {
            min_delta: 0.0,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
        let config = TrackerConfig {
            max_delta: -5.0,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_epsilon() {
        for eps in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let config = TrackerConfig {
                similarity_epsilon: eps,
                ..TrackerConfig::default()
            };
            assert!(config.validate().is_err(), "epsilon {eps} should be rejected");
        }
    }

    #[test]
    fn rejects_zero_cap() {
        let config = TrackerConfig {
            max_hypotheses: Some(0),
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = TrackerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
