//! Episode length index interfaces.
//!
//! Ownership model:
//! - `EpisodeIndex` is the sampler-facing, read-only view of an episode store:
//!   per-episode lengths plus aggregate counts.
//! - `EpisodeLengths` is the in-memory implementation; file-backed manifests
//!   load into it (see [`sources::manifest`]).

use std::sync::Arc;

use crate::errors::SamplerError;
use crate::types::{EpisodeId, StepCount};

/// Source implementation modules.
pub mod sources;

pub use sources::manifest::EpisodeManifest;

/// Read-only length index over a stored episode collection.
///
/// Ids are dense: every `id` in `0..episode_count()` must resolve. For a fixed
/// dataset the answers must not change between calls.
pub trait EpisodeIndex {
    /// Number of stored episodes.
    fn episode_count(&self) -> usize;

    /// Length in steps of episode `id`, or `None` when `id` is out of range.
    fn episode_length(&self, id: EpisodeId) -> Option<StepCount>;

    /// Sum of all episode lengths.
    fn total_steps(&self) -> StepCount {
        (0..self.episode_count())
            .filter_map(|id| self.episode_length(id))
            .sum()
    }

    /// Gather the lengths of an arbitrary, possibly non-contiguous, id list.
    fn lengths_of(&self, ids: &[EpisodeId]) -> Result<Vec<StepCount>, SamplerError> {
        ids.iter()
            .map(|&id| {
                self.episode_length(id)
                    .ok_or_else(|| SamplerError::UnknownEpisode {
                        episode_id: id,
                        episode_count: self.episode_count(),
                    })
            })
            .collect()
    }

    /// Lengths of every episode in id order.
    fn lengths(&self) -> Result<Vec<StepCount>, SamplerError> {
        let ids: Vec<EpisodeId> = (0..self.episode_count()).collect();
        self.lengths_of(&ids)
    }
}

impl<T: EpisodeIndex + ?Sized> EpisodeIndex for &T {
    fn episode_count(&self) -> usize {
        (**self).episode_count()
    }

    fn episode_length(&self, id: EpisodeId) -> Option<StepCount> {
        (**self).episode_length(id)
    }

    fn total_steps(&self) -> StepCount {
        (**self).total_steps()
    }
}

impl<T: EpisodeIndex + ?Sized> EpisodeIndex for Arc<T> {
    fn episode_count(&self) -> usize {
        (**self).episode_count()
    }

    fn episode_length(&self, id: EpisodeId) -> Option<StepCount> {
        (**self).episode_length(id)
    }

    fn total_steps(&self) -> StepCount {
        (**self).total_steps()
    }
}

/// In-memory episode length index with a cached step total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpisodeLengths {
    lengths: Vec<StepCount>,
    total_steps: StepCount,
}

impl EpisodeLengths {
    /// Build an index from lengths in episode-id order.
    pub fn new(lengths: Vec<StepCount>) -> Self {
        let total_steps = lengths.iter().sum();
        Self {
            lengths,
            total_steps,
        }
    }

    /// Borrow the raw length list.
    pub fn as_slice(&self) -> &[StepCount] {
        &self.lengths
    }
}

impl From<Vec<StepCount>> for EpisodeLengths {
    fn from(lengths: Vec<StepCount>) -> Self {
        Self::new(lengths)
    }
}

impl EpisodeIndex for EpisodeLengths {
    fn episode_count(&self) -> usize {
        self.lengths.len()
    }

    fn episode_length(&self, id: EpisodeId) -> Option<StepCount> {
        self.lengths.get(id).copied()
    }

    fn total_steps(&self) -> StepCount {
        self.total_steps
    }
}
