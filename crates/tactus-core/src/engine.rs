//! The online tracking loop.
//!
//! For every newly discovered onset the engine: seeds a hypothesis
//! from each admissible pairing of the new onset with an older one,
//! updates every live tracker (correction, then confidence), prunes
//! near-duplicate hypotheses keeping the oldest of each equivalence
//! class, and optionally caps the pool at the best-scored trackers.
//!
//! The loop is strictly sequential and deterministic: the same onsets
//! and configuration reproduce the same pool and timelines bit for
//! bit.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::playback::OngoingPlayback;
use crate::tracker::HypothesisTracker;

/// The surviving pool of a tracking run, in generation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracking {
    onset_times: Vec<f64>,
    trackers: Vec<HypothesisTracker>,
}

impl Tracking {
    /// The tracked onset sequence.
    pub fn onset_times(&self) -> &[f64] {
        &self.onset_times
    }

    /// Surviving trackers, oldest first.
    pub fn trackers(&self) -> &[HypothesisTracker] {
        &self.trackers
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Looks a tracker up by its `"a-b"` name.
    pub fn get(&self, name: &str) -> Option<&HypothesisTracker> {
        self.trackers.iter().find(|ht| ht.name() == name)
    }

    /// Tracker names in generation order.
    pub fn names(&self) -> Vec<String> {
        self.trackers.iter().map(|ht| ht.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HypothesisTracker> {
        self.trackers.iter()
    }

    /// Assembles a tracking result from hand-built trackers. View and
    /// analysis tests use this.
    #[cfg(test)]
    pub(crate) fn from_parts(onset_times: Vec<f64>, trackers: Vec<HypothesisTracker>) -> Self {
        Self {
            onset_times,
            trackers,
        }
    }
}

/// FIFO queue-walk deduplication.
///
/// Pops the oldest item as a survivor, removes everything similar to
/// it (similarity above `1 - epsilon`), and repeats on the remainder.
/// Survivors end up pairwise dissimilar, and the oldest member of each
/// equivalence class is the one kept. Trimmed items are returned with
/// the index of their survivor in the kept list.
pub fn trim_similar<T>(
    items: Vec<T>,
    mut similarity: impl FnMut(&T, &T) -> f64,
    epsilon: f64,
) -> (Vec<T>, Vec<(T, usize)>) {
    let mut remaining: VecDeque<T> = items.into();
    let mut kept: Vec<T> = Vec::new();
    let mut trimmed: Vec<(T, usize)> = Vec::new();
    while let Some(survivor) = remaining.pop_front() {
        kept.push(survivor);
        let survivor_index = kept.len() - 1;
        let survivor = &kept[survivor_index];
        let mut next_round = VecDeque::with_capacity(remaining.len());
        while let Some(candidate) = remaining.pop_front() {
            if similarity(survivor, &candidate) > 1.0 - epsilon {
                trimmed.push((candidate, survivor_index));
            } else {
                next_round.push_back(candidate);
            }
        }
        remaining = next_round;
    }
    (kept, trimmed)
}

/// Splits `items` into the `k` best by `key` and the rest.
///
/// Selection is by descending key, stable for ties; both halves keep
/// their original relative order.
pub fn split_k_best<T>(items: Vec<T>, k: usize, key: impl Fn(&T) -> f64) -> (Vec<T>, Vec<T>) {
    if items.len() <= k {
        return (items, Vec::new());
    }
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        key(&items[b])
            .partial_cmp(&key(&items[a]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut selected = vec![false; items.len()];
    for &index in &order[..k] {
        selected[index] = true;
    }
    let mut best = Vec::with_capacity(k);
    let mut rest = Vec::with_capacity(items.len() - k);
    for (index, item) in items.into_iter().enumerate() {
        if selected[index] {
            best.push(item);
        } else {
            rest.push(item);
        }
    }
    (best, rest)
}

/// Configurable tactus tracking engine.
#[derive(Debug, Clone)]
pub struct TactusTracker {
    config: TrackerConfig,
}

impl TactusTracker {
    /// Builds an engine, validating the configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine with the production defaults.
    pub fn with_defaults() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Runs the online loop over a full onset sequence.
    ///
    /// Sequences shorter than two onsets produce an empty pool.
    pub fn run(&self, onset_times: &[f64]) -> Result<Tracking> {
        let mut play = OngoingPlayback::new(onset_times.to_vec())?;
        let mut pool: Vec<HypothesisTracker> = Vec::new();

        while play.advance() {
            let born = self.generate(&play)?;
            if !born.is_empty() {
                debug!(
                    step = play.discovered_index(),
                    born = born.len(),
                    pool = pool.len() + born.len(),
                    "seeded hypotheses"
                );
            }
            pool.extend(born);

            for tracker in &mut pool {
                tracker.update(&play, &self.config.eval, &self.config.corr)?;
            }

            let epsilon = self.config.similarity_epsilon;
            let sim = self.config.sim;
            let (kept, trimmed) = trim_similar(
                pool,
                |a, b| sim.similarity(&a.current(), &b.current(), &play),
                epsilon,
            );
            for (gone, survivor) in &trimmed {
                trace!(
                    trimmed = %gone.name(),
                    survivor = %kept[*survivor].name(),
                    "pruned near-duplicate hypothesis"
                );
            }
            pool = kept;

            if let Some(cap) = self.config.max_hypotheses {
                let (best, rest) =
                    split_k_best(pool, cap, |ht| ht.latest_confidence().unwrap_or(0.0));
                if !rest.is_empty() {
                    trace!(dropped = rest.len(), cap, "capped hypothesis pool");
                }
                pool = best;
            }
        }

        Ok(Tracking {
            onset_times: onset_times.to_vec(),
            trackers: pool,
        })
    }

    /// Seeds trackers pairing the newest onset with every older one
    /// whose implied period falls inside the configured band.
    fn generate(&self, play: &OngoingPlayback) -> Result<Vec<HypothesisTracker>> {
        let newest = play.discovered_index();
        let onsets = play.onset_times();
        let mut born = Vec::new();
        for older in 0..newest {
            let delta = onsets[newest] - onsets[older];
            if delta >= self.config.min_delta && delta <= self.config.max_delta {
                born.push(HypothesisTracker::new(older, newest, onsets)?);
            }
        }
        Ok(born)
    }
}

impl Default for TactusTracker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
