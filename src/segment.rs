use serde::{Deserialize, Serialize};

use crate::types::{EpisodeId, StepCount};

/// Coordinates of one training window inside one episode.
///
/// The window is the half-open step range `[start, stop)`. `continuation_flag`
/// is `true` for windows drawn from a fresh random anchor and `false` for
/// windows produced by sliding a previous window forward; what a consumer does
/// with that distinction (padding policy, chain bookkeeping) is up to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    /// Episode the window belongs to.
    pub episode_id: EpisodeId,
    /// First step of the window (inclusive).
    pub start: StepCount,
    /// One past the last step of the window.
    pub stop: StepCount,
    /// `true` for fresh draws, `false` for advanced continuations.
    pub continuation_flag: bool,
}

/// One batch of segment coordinates, in batch-slot order.
pub type SegmentBatch = Vec<SegmentId>;

impl SegmentId {
    /// Fresh window `[start, stop)` in `episode_id`.
    pub fn fresh(episode_id: EpisodeId, start: StepCount, stop: StepCount) -> Self {
        Self {
            episode_id,
            start,
            stop,
            continuation_flag: true,
        }
    }

    /// Number of steps covered by the window.
    pub fn len(&self) -> StepCount {
        self.stop - self.start
    }

    /// True when the window covers no steps.
    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    /// True when this window came from a fresh draw.
    pub fn is_fresh(&self) -> bool {
        self.continuation_flag
    }

    /// Next page of the chain: starts where this window stops and spans `stride` steps.
    pub fn advanced(&self, stride: StepCount) -> Self {
        Self {
            episode_id: self.episode_id,
            start: self.stop,
            stop: self.stop + stride,
            continuation_flag: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advanced_window_starts_at_previous_stop() {
        let first = SegmentId::fresh(3, 6, 10);
        assert!(first.is_fresh());
        assert_eq!(first.len(), 4);

        let next = first.advanced(2);
        assert_eq!(next.episode_id, 3);
        assert_eq!(next.start, 10);
        assert_eq!(next.stop, 12);
        assert!(!next.is_fresh());
        assert!(!next.is_empty());

        let third = next.advanced(2);
        assert_eq!((third.start, third.stop), (12, 14));
        assert!(!third.continuation_flag);
    }
}
