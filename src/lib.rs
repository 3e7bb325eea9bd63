#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Resumable sampler checkpoints.
pub mod checkpoint;
/// Sampling configuration types.
pub mod config;
/// Centralized constants used across the sampler, weights, and checkpoints.
pub mod constants;
/// Reusable example runners shared by demos and downstream crates.
pub mod example_apps;
mod hash;
/// Per-episode coverage and skew metrics.
pub mod metrics;
/// Rank striping and episode length filtering.
pub mod partition;
/// Deterministic random number generation.
pub mod rng;
/// Segment drawing, continuation cycles, and the public sampling API.
pub mod sampler;
/// Segment coordinate types.
pub mod segment;
/// Episode length index interfaces and implementations.
pub mod source;
/// Shared type aliases.
pub mod types;
/// Per-episode weight resolution.
pub mod weights;

mod errors;

pub use checkpoint::SamplerCheckpoint;
pub use config::SamplerConfig;
pub use errors::SamplerError;
pub use partition::Partition;
pub use rng::DeterministicRng;
pub use sampler::{Sampler, SegmentDrawer, SegmentSampler};
pub use segment::{SegmentBatch, SegmentId};
pub use source::{EpisodeIndex, EpisodeLengths, EpisodeManifest};
pub use types::{EpisodeId, StepCount, Weight};
