//! Step-indexed view of a tracking result.
//!
//! Inverts the per-tracker timelines into a per-onset index: for each
//! onset at which any tracker recorded a step, the view lists every
//! tracker's correction and confidence at that step. Iteration is by
//! onset time, optionally confidence-sorted within each time.

use std::collections::BTreeMap;

use crate::correction::Correction;
use crate::engine::Tracking;
use crate::hypothesis::Hypothesis;
use crate::tracker::HypothesisTracker;

/// One tracker's state at one step.
#[derive(Debug, Clone, Copy)]
pub struct HypothesisAtTime<'a> {
    pub tracker: &'a HypothesisTracker,
    pub onset_index: usize,
    pub correction: &'a Correction,
    pub confidence: f64,
}

impl<'a> HypothesisAtTime<'a> {
    /// The hypothesis the correction yielded at this step.
    pub fn hypothesis(&self) -> Hypothesis {
        self.correction.new_hypothesis()
    }
}

/// Time-indexed traversal over all tracker timelines.
#[derive(Debug)]
pub struct OvertimeTracking<'a> {
    onset_times: &'a [f64],
    slots: BTreeMap<usize, Vec<HypothesisAtTime<'a>>>,
}

impl<'a> OvertimeTracking<'a> {
    pub fn new(tracking: &'a Tracking) -> Self {
        let mut slots: BTreeMap<usize, Vec<HypothesisAtTime<'a>>> = BTreeMap::new();
        for tracker in tracking.trackers() {
            debug_assert_eq!(
                tracker.corrections().len(),
                tracker.confidences().len(),
                "correction and confidence timelines must align"
            );
            for ((index, correction), &(conf_index, confidence)) in
                tracker.corrections().iter().zip(tracker.confidences())
            {
                debug_assert_eq!(*index, conf_index);
                slots.entry(*index).or_default().push(HypothesisAtTime {
                    tracker,
                    onset_index: *index,
                    correction,
                    confidence,
                });
            }
        }
        Self {
            onset_times: tracking.onset_times(),
            slots,
        }
    }

    /// Steps in time order, each with its tracker records in
    /// generation order.
    pub fn hypotheses_by_time(
        &self,
    ) -> impl Iterator<Item = (f64, &[HypothesisAtTime<'a>])> + '_ {
        self.slots
            .iter()
            .map(|(&index, records)| (self.onset_times[index], records.as_slice()))
    }

    /// Steps in time order, records sorted by descending confidence
    /// (stable, so generation order breaks ties).
    pub fn hypotheses_sorted_by_confidence(
        &self,
    ) -> impl Iterator<Item = (f64, Vec<HypothesisAtTime<'a>>)> + '_ {
        self.hypotheses_by_time().map(|(time, records)| {
            let mut sorted = records.to_vec();
            sorted.sort_by(|a, b| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            (time, sorted)
        })
    }
}
