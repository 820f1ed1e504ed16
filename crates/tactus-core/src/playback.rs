//! Playback views over an onset sequence.
//!
//! A playback wraps an ordered list of onset times (milliseconds). The
//! engine consumes an [`OngoingPlayback`], which reveals the sequence
//! one onset at a time; evaluators only ever see the discovered prefix.
//! A static [`Playback`] exposes the whole sequence at once and is used
//! to restrict an evaluation to a sub-window.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Read access to the currently visible part of a playback.
pub trait PlaybackView {
    /// The onsets discovered so far, in order.
    fn discovered(&self) -> &[f64];

    /// First visible onset. NaN when nothing is visible.
    fn min(&self) -> f64 {
        self.discovered().first().copied().unwrap_or(f64::NAN)
    }

    /// Last visible onset. NaN when nothing is visible.
    fn max(&self) -> f64 {
        self.discovered().last().copied().unwrap_or(f64::NAN)
    }
}

fn validate_onsets(onset_times: &[f64]) -> Result<()> {
    for (index, window) in onset_times.windows(2).enumerate() {
        if window[1] < window[0] {
            return Err(Error::UnorderedOnsets { index: index + 1 });
        }
    }
    if let Some(index) = onset_times.iter().position(|o| !o.is_finite()) {
        return Err(Error::NonFiniteOnset { index });
    }
    Ok(())
}

/// A fully visible onset sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playback {
    onset_times: Vec<f64>,
}

impl Playback {
    /// Wraps an ordered onset sequence, rejecting decreasing or
    /// non-finite values.
    pub fn new(onset_times: Vec<f64>) -> Result<Self> {
        validate_onsets(&onset_times)?;
        Ok(Self { onset_times })
    }

    pub fn onset_times(&self) -> &[f64] {
        &self.onset_times
    }
}

impl PlaybackView for Playback {
    fn discovered(&self) -> &[f64] {
        &self.onset_times
    }
}

/// A playback discovered one onset at a time.
///
/// Starts with a single visible onset; each [`advance`] reveals the
/// next one. The discovered count only ever grows.
///
/// [`advance`]: OngoingPlayback::advance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OngoingPlayback {
    onset_times: Vec<f64>,
    discovered_count: usize,
}

impl OngoingPlayback {
    pub fn new(onset_times: Vec<f64>) -> Result<Self> {
        validate_onsets(&onset_times)?;
        let discovered_count = onset_times.len().min(1);
        Ok(Self {
            onset_times,
            discovered_count,
        })
    }

    /// Discover the next onset. Returns whether the view moved.
    pub fn advance(&mut self) -> bool {
        if self.discovered_count < self.onset_times.len() {
            self.discovered_count += 1;
            true
        } else {
            false
        }
    }

    /// Index of the last discovered onset.
    pub fn discovered_index(&self) -> usize {
        self.discovered_count.saturating_sub(1)
    }

    /// The last discovered onset, if any.
    pub fn discovered_onset(&self) -> Option<f64> {
        self.discovered().last().copied()
    }

    /// The full underlying sequence, including undiscovered onsets.
    pub fn onset_times(&self) -> &[f64] {
        &self.onset_times
    }
}

impl PlaybackView for OngoingPlayback {
    fn discovered(&self) -> &[f64] {
        &self.onset_times[..self.discovered_count]
    }
}
