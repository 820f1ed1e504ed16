//! Beat hypotheses.
//!
//! A hypothesis is an affine predictor of beat times: `t_k = rho +
//! delta * k` for integer `k`, where `rho` is a phase offset and
//! `delta` a beat period, both in milliseconds. Projection over an
//! interval includes beats up to half a period outside it, so a beat
//! whose nearest onset sits at the boundary is still considered.

use serde::{Deserialize, Serialize};

use crate::playback::PlaybackView;

/// An affine beat predictor `(rho, delta)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Phase offset in milliseconds.
    pub rho: f64,
    /// Beat period in milliseconds.
    pub delta: f64,
}

impl Hypothesis {
    pub fn new(rho: f64, delta: f64) -> Self {
        Self { rho, delta }
    }

    /// Tempo in beats per minute.
    pub fn bpm(&self) -> f64 {
        60_000.0 / self.delta
    }

    /// Beat indices whose projections fall within `[lo - delta/2,
    /// hi + delta/2]`, as an inclusive range. `None` when the interval
    /// admits no projection.
    pub fn index_range(&self, lo: f64, hi: f64) -> Option<(i64, i64)> {
        let k_min = ((lo - self.delta / 2.0 - self.rho) / self.delta).ceil();
        let k_max = ((hi + self.delta / 2.0 - self.rho) / self.delta).floor();
        if !k_min.is_finite() || !k_max.is_finite() || k_min > k_max {
            return None;
        }
        Some((k_min as i64, k_max as i64))
    }

    /// Projections over `[lo, hi]` as `(index, time)` pairs.
    pub fn project_range(&self, lo: f64, hi: f64) -> Vec<(i64, f64)> {
        match self.index_range(lo, hi) {
            Some((k_min, k_max)) => (k_min..=k_max)
                .map(|k| (k, self.rho + self.delta * k as f64))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Projected beat times over `[lo, hi]`.
    pub fn project_times(&self, lo: f64, hi: f64) -> Vec<f64> {
        self.project_range(lo, hi).into_iter().map(|(_, t)| t).collect()
    }

    /// Projections over the visible part of a playback.
    pub fn project<P: PlaybackView>(&self, play: &P) -> Vec<(i64, f64)> {
        self.project_range(play.min(), play.max())
    }
}

impl std::fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "H({:.2}, {:.2})", self.rho, self.delta)
    }
}
