use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::checkpoint::CHECKPOINT_VERSION;
use crate::errors::SamplerError;
use crate::segment::SegmentBatch;

/// Resumable snapshot of one sampler's runtime state.
///
/// Captures exactly what the sampler owns: the RNG state, the cycle length and
/// position, and the previously yielded batch (needed to compute the next
/// continuation page). Configuration and the episode index are not included;
/// restore into a sampler built with the same configuration and dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplerCheckpoint {
    /// Format version.
    pub version: u8,
    /// Rank that produced the checkpoint.
    pub rank: usize,
    /// Deterministic RNG internal state.
    pub rng_state: u64,
    /// Cycle length in effect when the checkpoint was taken.
    pub num_consecutive_batches: usize,
    /// Position of the next batch within the cycle (`0` = fresh draw).
    pub cycle_position: usize,
    /// Last yielded batch; empty when the next batch is a fresh draw.
    pub previous_batch: SegmentBatch,
}

impl SamplerCheckpoint {
    pub(crate) fn new(
        rank: usize,
        rng_state: u64,
        num_consecutive_batches: usize,
        cycle_position: usize,
        previous_batch: SegmentBatch,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            rank,
            rng_state,
            num_consecutive_batches,
            cycle_position,
            previous_batch,
        }
    }

    /// Write the checkpoint as JSON, creating parent directories when needed.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SamplerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(self).map_err(|err| {
            SamplerError::Checkpoint(format!("failed to encode checkpoint: {err}"))
        })?;
        fs::write(path, payload)?;
        Ok(())
    }

    /// Read a checkpoint written by [`SamplerCheckpoint::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SamplerError> {
        let bytes = fs::read(path.as_ref())?;
        let checkpoint: Self = serde_json::from_slice(&bytes).map_err(|err| {
            SamplerError::Checkpoint(format!(
                "failed to decode checkpoint {}: {err}",
                path.as_ref().display()
            ))
        })?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(SamplerError::Checkpoint(format!(
                "unsupported checkpoint version {} (expected {CHECKPOINT_VERSION})",
                checkpoint.version
            )));
        }
        Ok(checkpoint)
    }
}
