//! Online tactus hypothesis tracking.
//!
//! Given a monotonic sequence of musical onset times (milliseconds),
//! the engine infers the listener's beat as a pool of competing
//! affine predictors `t_k = rho + delta * k`, refined incrementally as
//! onsets are revealed one at a time:
//!
//! 1. every new onset seeds hypotheses by pairing it with older ones;
//! 2. every live hypothesis is corrected by regressing its prediction
//!    errors, then re-scored against the discovered history;
//! 3. near-duplicate hypotheses are pruned, oldest survivor first.
//!
//! # Example
//!
//! ```
//! use tactus_core::{TactusTracker, TrackerConfig};
//!
//! // A steady 500 ms pulse (120 bpm)
//! let onsets: Vec<f64> = (0..16).map(|k| k as f64 * 500.0).collect();
//! let tracking = TactusTracker::with_defaults().run(&onsets).unwrap();
//! assert!(!tracking.is_empty());
//!
//! let beats = tactus_core::track_beats(&onsets, TrackerConfig::default()).unwrap();
//! assert!(beats.windows(2).all(|w| w[0] < w[1]));
//! ```

pub mod accent;
pub mod analysis;
pub mod config;
pub mod confidence;
pub mod correction;
pub mod engine;
pub mod error;
pub mod export;
pub mod hypothesis;
pub mod matching;
pub mod overtime;
pub mod playback;
pub mod similarity;
pub mod tracker;

pub use accent::accented_onsets;
pub use analysis::{
    hypothesis_ranks_overtime, produce_beats, top_hypotheses, track_beats, tracker_segments,
    Segment,
};
pub use config::{
    TrackerConfig, MAX_DELTA_MS, MAX_HYPOTHESES, MIN_DELTA_MS, SIMILARITY_EPSILON,
};
pub use confidence::{
    ConfidenceEvaluator, EndModifier, EntryModifier, WeightKind, WindowRestriction,
    CONFIDENCE_DECAY, LEGACY_WEIGHT_BASE, TIME_WINDOW_MS,
};
pub use correction::{
    Correction, CorrectionMethod, FitDiagnostics, CORRECTION_DECAY, CORRECTION_MULT,
    ITERATED_TIMES,
};
pub use engine::{split_k_best, trim_similar, TactusTracker, Tracking};
pub use error::{Error, Result};
pub use export::{write_csv, write_tracker, TrackerDump};
pub use hypothesis::Hypothesis;
pub use matching::{project, project_saturating, Match};
pub use overtime::{HypothesisAtTime, OvertimeTracking};
pub use playback::{OngoingPlayback, Playback, PlaybackView};
pub use similarity::SimilarityMeasure;
pub use tracker::HypothesisTracker;
