//! Analysis of a finished tracking run.
//!
//! The engine's pool answers "which hypotheses survived"; this module
//! answers "what was the beat". The top-hypothesis stream picks the
//! best-scored tracker at every step, beat production projects those
//! winners over the gaps between steps, and the rank views expose how
//! tracker standings evolved.

use std::collections::BTreeMap;

use crate::config::TrackerConfig;
use crate::engine::{TactusTracker, Tracking};
use crate::error::Result;
use crate::tracker::HypothesisTracker;

/// Earliest onset index eligible for top-hypothesis selection: before
/// this the pool has seen too little evidence to rank.
const FIRST_RANKED_ONSET: usize = 3;

/// The best-scored tracker at each onset index, as `(onset_index,
/// tracker)` pairs.
///
/// Steps where no tracker recorded a confidence are skipped; ties go
/// to the earliest-generated tracker.
pub fn top_hypotheses(tracking: &Tracking) -> Vec<(usize, &HypothesisTracker)> {
    let mut top = Vec::new();
    for index in FIRST_RANKED_ONSET..tracking.onset_times().len() {
        let mut best: Option<(&HypothesisTracker, f64)> = None;
        for tracker in tracking.trackers() {
            if let Some(confidence) = tracker.confidence_at(index) {
                let better = match best {
                    Some((_, incumbent)) => confidence > incumbent,
                    None => true,
                };
                if better {
                    best = Some((tracker, confidence));
                }
            }
        }
        if let Some((tracker, _)) = best {
            top.push((index, tracker));
        }
    }
    top
}

/// Synthesizes beat times from the top-hypothesis stream.
///
/// For each consecutive pair of top steps, the winner's
/// correction-yielded hypothesis at the earlier step is projected over
/// the onset interval between them; every projection but the first is
/// emitted. The result is a strictly increasing sequence of beat
/// times.
pub fn produce_beats(
    onset_times: &[f64],
    top: &[(usize, &HypothesisTracker)],
) -> Vec<f64> {
    let mut beats = Vec::new();
    for pair in top.windows(2) {
        let (step, tracker) = pair[0];
        let (next_step, _) = pair[1];
        let Some(correction) = tracker.correction_at(step) else {
            continue;
        };
        let hypothesis = correction.new_hypothesis();
        let projected = hypothesis.project_times(onset_times[step], onset_times[next_step]);
        beats.extend(projected.into_iter().skip(1));
    }
    beats
}

/// Runs the engine over `onset_times` and produces the tracked beats.
pub fn track_beats(onset_times: &[f64], config: TrackerConfig) -> Result<Vec<f64>> {
    let tracking = TactusTracker::new(config)?.run(onset_times)?;
    let top = top_hypotheses(&tracking);
    Ok(produce_beats(onset_times, &top))
}

/// Every tracker with a confidence at each onset index, sorted by
/// descending confidence (stable). Indices with no records map to an
/// empty ranking.
pub fn hypothesis_ranks_overtime(
    tracking: &Tracking,
) -> Vec<(usize, Vec<(&HypothesisTracker, f64)>)> {
    let mut ranks = Vec::with_capacity(tracking.onset_times().len());
    for index in 0..tracking.onset_times().len() {
        let mut ranking: Vec<(&HypothesisTracker, f64)> = tracking
            .trackers()
            .iter()
            .filter_map(|t| t.confidence_at(index).map(|c| (t, c)))
            .collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranks.push((index, ranking));
    }
    ranks
}

/// A contiguous stretch of onset indices a tracker spent in the top
/// ranks, with its confidences over that stretch.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub onset_indices: Vec<usize>,
    pub confidences: Vec<f64>,
}

/// Groups the rank view into per-tracker segments of consecutive
/// onset indices spent within the top `top_n`.
pub fn tracker_segments<'a>(
    ranks: &[(usize, Vec<(&'a HypothesisTracker, f64)>)],
    top_n: usize,
) -> BTreeMap<String, Vec<Segment>> {
    let mut segments: BTreeMap<String, Vec<Segment>> = BTreeMap::new();
    for (index, ranking) in ranks {
        for (tracker, confidence) in ranking.iter().take(top_n) {
            let entry = segments.entry(tracker.name()).or_default();
            match entry.last_mut() {
                Some(segment)
                    if *index > 0 && segment.onset_indices.last() == Some(&(index - 1)) =>
                {
                    segment.onset_indices.push(*index);
                    segment.confidences.push(*confidence);
                }
                _ => entry.push(Segment {
                    onset_indices: vec![*index],
                    confidences: vec![*confidence],
                }),
            }
        }
    }
    segments
}
