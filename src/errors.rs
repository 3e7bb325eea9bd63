use std::io;

use thiserror::Error;

use crate::types::{EpisodeId, StepCount};

/// Error type for sampler configuration, dataset, and persistence failures.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Invalid configuration, detected before any batch is produced.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An episode id outside `0..episode_count` was looked up.
    #[error("episode {episode_id} is not in the index ({episode_count} episodes)")]
    UnknownEpisode {
        /// Requested id.
        episode_id: EpisodeId,
        /// Number of episodes in the index.
        episode_count: usize,
    },
    /// The rank's stripe holds no episode longer than the full chain.
    #[error(
        "rank {rank} has no episodes longer than the required window of {required_length} steps"
    )]
    NoEligibleEpisodes {
        /// Rank whose partition is empty.
        rank: usize,
        /// Length every eligible episode must exceed.
        required_length: StepCount,
    },
    /// Eligible episodes exist but their weights sum to zero.
    #[error("eligible episode weights for rank {rank} sum to zero; cannot normalize")]
    ZeroWeight {
        /// Rank whose weights carry no mass.
        rank: usize,
    },
    /// A fresh window cannot host its continuation pages.
    #[error(
        "window [{start}, {stop}) in episode {episode_id} (length {episode_length}) leaves no room for {pages} continuation page(s)"
    )]
    WindowOutOfBounds {
        /// Episode the window was drawn from.
        episode_id: EpisodeId,
        /// Window start.
        start: StepCount,
        /// Window stop (exclusive).
        stop: StepCount,
        /// Length of the episode.
        episode_length: StepCount,
        /// Continuation pages the chain still needs.
        pages: usize,
    },
    /// The cycle length was changed while a cycle was running.
    #[error("cannot change the cycle length at cycle position {position}; wait for the cycle to wrap")]
    CycleInProgress {
        /// Current position within the cycle.
        position: usize,
    },
    /// Episode manifest could not be encoded or decoded.
    #[error("episode manifest error: {0}")]
    Manifest(String),
    /// Sampler checkpoint could not be encoded, decoded, or applied.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
    /// Underlying filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}
