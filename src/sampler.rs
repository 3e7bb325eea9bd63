use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use tracing::debug;

use crate::checkpoint::SamplerCheckpoint;
use crate::config::SamplerConfig;
use crate::errors::SamplerError;
use crate::partition::{Partition, partition_episodes, required_length};
use crate::rng::{DeterministicRng, rank_seed};
use crate::segment::{SegmentBatch, SegmentId};
use crate::source::EpisodeIndex;
use crate::types::StepCount;
use crate::weights::{normalize_weights, resolve_weights};

/// Public pull interface for segment batch generation.
///
/// The stream is unbounded: `next_batch` always produces another batch (or an
/// error) and there is no length to query.
pub trait Sampler {
    /// Compute and return the next batch.
    fn next_batch(&mut self) -> Result<SegmentBatch, SamplerError>;
    /// Restart the stream: the next batch is a fresh draw.
    fn reset(&mut self);
}

/// Draws fresh first-page windows from one rank's eligible episodes.
///
/// For each batch slot:
/// 1. pick an episode with probability proportional to its normalized weight;
/// 2. pick an anchor step `t` uniformly in `[0, length)`;
/// 3. `stop = min(t + 1 + U[0, T), length - (N - 1) * sequence_length)`;
/// 4. `stop = max(stop, sequence_length)`;
/// 5. `start = stop - sequence_length`.
///
/// `T` is the partition's required chain length and `N` the cycle length. The
/// upper clamp runs before the lower clamp.
#[derive(Debug)]
pub struct SegmentDrawer<'a> {
    partition: &'a Partition,
    distribution: WeightedIndex<f64>,
    batch_size: usize,
    episodes_per_batch: usize,
    sequence_length: StepCount,
    num_consecutive_batches: usize,
    autoregressive_obs: StepCount,
}

impl<'a> SegmentDrawer<'a> {
    /// Prepare a drawer; fails with [`SamplerError::ZeroWeight`] when the
    /// partition's weights carry no probability mass.
    pub fn new(
        partition: &'a Partition,
        config: &SamplerConfig,
        num_consecutive_batches: usize,
    ) -> Result<Self, SamplerError> {
        let normalized = normalize_weights(&partition.weights).ok_or(SamplerError::ZeroWeight {
            rank: partition.rank,
        })?;
        let distribution = WeightedIndex::new(&normalized).map_err(|err| {
            SamplerError::Configuration(format!(
                "invalid episode weights for rank {}: {err}",
                partition.rank
            ))
        })?;
        Ok(Self {
            partition,
            distribution,
            batch_size: config.batch_size,
            episodes_per_batch: config.episodes_per_batch(),
            sequence_length: config.sequence_length,
            num_consecutive_batches,
            autoregressive_obs: config.autoregressive_stride(),
        })
    }

    /// Draw exactly `batch_size` fresh windows.
    ///
    /// `episodes_per_batch` episodes are drawn with replacement and each is
    /// repeated `batch_size / episodes_per_batch` times in adjacent slots; every
    /// slot still gets its own anchor.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Result<SegmentBatch, SamplerError> {
        let repeat = self.batch_size / self.episodes_per_batch.max(1);
        let mut batch = Vec::with_capacity(self.batch_size);
        for _ in 0..self.episodes_per_batch {
            let slot = self.distribution.sample(rng);
            for _ in 0..repeat {
                batch.push(self.window_in(slot, rng)?);
            }
        }
        Ok(batch)
    }

    fn window_in<R: Rng>(
        &self,
        slot: usize,
        rng: &mut R,
    ) -> Result<SegmentId, SamplerError> {
        let episode_id = self.partition.episodes[slot];
        let length = self.partition.lengths[slot];
        let continuation_pages = self.num_consecutive_batches.saturating_sub(1);
        let chain_length = self.partition.required_length;

        let anchor = rng.random_range(0..length);
        let candidate = anchor + 1 + rng.random_range(0..chain_length);
        let reserved = continuation_pages * self.sequence_length;
        let stop = candidate
            .min(length.saturating_sub(reserved))
            .max(self.sequence_length);
        let start = stop - self.sequence_length;

        if stop + continuation_pages * self.autoregressive_obs > length {
            return Err(SamplerError::WindowOutOfBounds {
                episode_id,
                start,
                stop,
                episode_length: length,
                pages: continuation_pages,
            });
        }
        Ok(SegmentId::fresh(episode_id, start, stop))
    }
}

/// Slide every window of `previous` forward: `[stop, stop + stride)`, same episode.
pub fn advance_batch(previous: &[SegmentId], stride: StepCount) -> SegmentBatch {
    previous
        .iter()
        .map(|segment| segment.advanced(stride))
        .collect()
}

/// Where the sampler is within its current cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
enum CycleState {
    /// Next batch is a fresh draw (cycle position 0).
    Fresh,
    /// Next batch advances `previous`; `position` is in `1..num_consecutive_batches`.
    Continuing {
        position: usize,
        previous: SegmentBatch,
    },
}

/// Weighted, rank-partitioned segment sampler with autoregressive continuation.
///
/// Every `num_consecutive_batches` batches form one cycle: the first batch is a
/// fresh draw (see [`SegmentDrawer`]) and each following batch advances the
/// previous one by `autoregressive_obs` steps. After the last continuation the
/// next pull starts a new, independent cycle.
///
/// One instance per rank; the instance owns its RNG and cycle state.
pub struct SegmentSampler<D: EpisodeIndex, R: Rng = DeterministicRng> {
    config: SamplerConfig,
    index: D,
    rng: R,
    state: CycleState,
}

impl<D: EpisodeIndex> SegmentSampler<D, DeterministicRng> {
    /// Build a sampler whose RNG is seeded from `config.seed` and `config.rank`.
    ///
    /// Configuration and data sufficiency are validated here, not on the
    /// first pull.
    pub fn new(config: SamplerConfig, index: D) -> Result<Self, SamplerError> {
        let rng = DeterministicRng::new(rank_seed(config.seed, config.rank));
        Self::with_rng(config, index, rng)
    }

    /// Capture the runtime state needed to resume this exact stream.
    pub fn checkpoint(&self) -> SamplerCheckpoint {
        let (cycle_position, previous_batch) = match &self.state {
            CycleState::Fresh => (0, Vec::new()),
            CycleState::Continuing { position, previous } => (*position, previous.clone()),
        };
        SamplerCheckpoint::new(
            self.config.rank,
            self.rng.state(),
            self.config.num_consecutive_batches,
            cycle_position,
            previous_batch,
        )
    }

    /// Resume from a checkpoint taken by a sampler with the same configuration
    /// and dataset.
    pub fn restore(&mut self, checkpoint: &SamplerCheckpoint) -> Result<(), SamplerError> {
        if checkpoint.rank != self.config.rank {
            return Err(SamplerError::Checkpoint(format!(
                "checkpoint belongs to rank {} but this sampler is rank {}",
                checkpoint.rank, self.config.rank
            )));
        }
        let num_consecutive_batches = checkpoint.num_consecutive_batches;
        self.config.validate_cycle_length(num_consecutive_batches)?;
        if checkpoint.cycle_position >= num_consecutive_batches {
            return Err(SamplerError::Checkpoint(format!(
                "checkpoint cycle position {} is outside a cycle of {num_consecutive_batches}",
                checkpoint.cycle_position
            )));
        }
        let partition = self.eligible_partition(num_consecutive_batches)?;

        let state = if checkpoint.cycle_position == 0 {
            CycleState::Fresh
        } else {
            if checkpoint.previous_batch.len() != self.config.batch_size {
                return Err(SamplerError::Checkpoint(format!(
                    "checkpoint batch holds {} segments but batch_size is {}",
                    checkpoint.previous_batch.len(),
                    self.config.batch_size
                )));
            }
            if let Some(segment) = checkpoint
                .previous_batch
                .iter()
                .find(|segment| !partition.contains(segment.episode_id))
            {
                return Err(SamplerError::Checkpoint(format!(
                    "checkpoint references episode {} outside rank {}'s partition",
                    segment.episode_id, self.config.rank
                )));
            }
            let remaining_pages = num_consecutive_batches - checkpoint.cycle_position;
            let chain_tail = remaining_pages * self.config.autoregressive_stride();
            for segment in &checkpoint.previous_batch {
                let length = self.index.episode_length(segment.episode_id).ok_or_else(|| {
                    SamplerError::UnknownEpisode {
                        episode_id: segment.episode_id,
                        episode_count: self.index.episode_count(),
                    }
                })?;
                if segment.is_empty() || segment.stop + chain_tail > length {
                    return Err(SamplerError::Checkpoint(format!(
                        "window [{}, {}) in episode {} (length {length}) cannot host {remaining_pages} more page(s)",
                        segment.start, segment.stop, segment.episode_id
                    )));
                }
            }
            CycleState::Continuing {
                position: checkpoint.cycle_position,
                previous: checkpoint.previous_batch.clone(),
            }
        };

        self.config.num_consecutive_batches = num_consecutive_batches;
        self.rng = DeterministicRng::from_state(checkpoint.rng_state);
        self.state = state;
        Ok(())
    }
}

impl<D: EpisodeIndex, R: Rng> SegmentSampler<D, R> {
    /// Build a sampler around a caller-supplied random source.
    pub fn with_rng(config: SamplerConfig, index: D, rng: R) -> Result<Self, SamplerError> {
        config.validate()?;
        let sampler = Self {
            config,
            index,
            rng,
            state: CycleState::Fresh,
        };
        let partition = sampler.eligible_partition(sampler.config.num_consecutive_batches)?;
        SegmentDrawer::new(&partition, &sampler.config, sampler.config.num_consecutive_batches)?;
        Ok(sampler)
    }

    /// Active configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Episode index this sampler draws from.
    pub fn index(&self) -> &D {
        &self.index
    }

    /// Position of the next batch within the cycle (`0` means a fresh draw).
    pub fn cycle_position(&self) -> usize {
        match &self.state {
            CycleState::Fresh => 0,
            CycleState::Continuing { position, .. } => *position,
        }
    }

    /// Episodes this rank can currently sample from, with their weights.
    pub fn eligible_episodes(&self) -> Result<Partition, SamplerError> {
        self.eligible_partition(self.config.num_consecutive_batches)
    }

    /// Change the cycle length. Only allowed between cycles.
    ///
    /// The new chain length is checked against the dataset immediately, so a
    /// cycle length no episode can host fails here instead of on the next pull.
    pub fn set_num_consecutive_batches(
        &mut self,
        num_consecutive_batches: usize,
    ) -> Result<(), SamplerError> {
        if let CycleState::Continuing { position, .. } = &self.state {
            return Err(SamplerError::CycleInProgress {
                position: *position,
            });
        }
        self.config.validate_cycle_length(num_consecutive_batches)?;
        let partition = self.eligible_partition(num_consecutive_batches)?;
        SegmentDrawer::new(&partition, &self.config, num_consecutive_batches)?;
        debug!(
            rank = self.config.rank,
            from = self.config.num_consecutive_batches,
            to = num_consecutive_batches,
            "changed cycle length"
        );
        self.config.num_consecutive_batches = num_consecutive_batches;
        Ok(())
    }

    fn eligible_partition(&self, num_consecutive_batches: usize) -> Result<Partition, SamplerError> {
        let weights = resolve_weights(&self.index, self.config.sample_weights.as_deref())?;
        let chain_length = required_length(
            self.config.sequence_length,
            num_consecutive_batches,
            self.config.autoregressive_stride(),
        );
        partition_episodes(
            &self.index,
            &weights,
            self.config.rank,
            self.config.world_size,
            chain_length,
        )
    }

    fn draw_fresh(&mut self) -> Result<SegmentBatch, SamplerError> {
        let num_consecutive_batches = self.config.num_consecutive_batches;
        let partition = self.eligible_partition(num_consecutive_batches)?;
        let drawer = SegmentDrawer::new(&partition, &self.config, num_consecutive_batches)?;
        let batch = drawer.draw(&mut self.rng)?;
        debug!(
            rank = self.config.rank,
            eligible = partition.len(),
            batch = batch.len(),
            "drew fresh segment batch"
        );
        Ok(batch)
    }
}

impl<D: EpisodeIndex, R: Rng> Sampler for SegmentSampler<D, R> {
    fn next_batch(&mut self) -> Result<SegmentBatch, SamplerError> {
        let (batch, position) = match &self.state {
            CycleState::Fresh => (self.draw_fresh()?, 0),
            CycleState::Continuing { position, previous } => (
                advance_batch(previous, self.config.autoregressive_stride()),
                *position,
            ),
        };
        let next_position = (position + 1) % self.config.num_consecutive_batches;
        self.state = if next_position == 0 {
            CycleState::Fresh
        } else {
            CycleState::Continuing {
                position: next_position,
                previous: batch.clone(),
            }
        };
        Ok(batch)
    }

    fn reset(&mut self) {
        if let CycleState::Continuing { position, .. } = &self.state {
            debug!(rank = self.config.rank, position, "reset mid-cycle");
        }
        self.state = CycleState::Fresh;
    }
}

/// Unbounded: `next` never returns `None`. Errors are yielded in-band.
impl<D: EpisodeIndex, R: Rng> Iterator for SegmentSampler<D, R> {
    type Item = Result<SegmentBatch, SamplerError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
