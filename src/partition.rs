use tracing::debug;

use crate::errors::SamplerError;
use crate::source::EpisodeIndex;
use crate::types::{EpisodeId, StepCount, Weight};

/// Episodes (with lengths and weights, kept pairwise aligned) one rank may sample from.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    /// Rank that owns this partition.
    pub rank: usize,
    /// Window length every kept episode must strictly exceed.
    pub required_length: StepCount,
    /// Eligible episode ids, ascending.
    pub episodes: Vec<EpisodeId>,
    /// `lengths[i]` is the length of `episodes[i]`.
    pub lengths: Vec<StepCount>,
    /// `weights[i]` is the (unnormalized) weight of `episodes[i]`.
    pub weights: Vec<Weight>,
}

impl Partition {
    /// Number of eligible episodes.
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// True when no episode survived the filter.
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// True when `episode_id` belongs to this partition.
    pub fn contains(&self, episode_id: EpisodeId) -> bool {
        self.episodes.binary_search(&episode_id).is_ok()
    }
}

/// Steps spanned by a full chain: the first page plus every continuation page.
///
/// `sequence_length + (num_consecutive_batches - 1) * autoregressive_obs`
pub fn required_length(
    sequence_length: StepCount,
    num_consecutive_batches: usize,
    autoregressive_obs: StepCount,
) -> StepCount {
    sequence_length + num_consecutive_batches.saturating_sub(1) * autoregressive_obs
}

/// Striped slice `{rank, rank + world_size, ...}` of `0..episode_count`.
pub fn striped_episodes(rank: usize, world_size: usize, episode_count: usize) -> Vec<EpisodeId> {
    if world_size == 0 {
        return Vec::new();
    }
    (rank..episode_count).step_by(world_size).collect()
}

/// Select this rank's stripe and keep only episodes longer than `required_length`.
///
/// `weights` must hold one entry per episode of `index`. Fails with
/// [`SamplerError::NoEligibleEpisodes`] when nothing survives the filter.
pub fn partition_episodes<D>(
    index: &D,
    weights: &[Weight],
    rank: usize,
    world_size: usize,
    required_length: StepCount,
) -> Result<Partition, SamplerError>
where
    D: EpisodeIndex + ?Sized,
{
    let episode_count = index.episode_count();
    if weights.len() != episode_count {
        return Err(SamplerError::Configuration(format!(
            "resolved {} weights for {episode_count} episodes",
            weights.len()
        )));
    }

    let stripe = striped_episodes(rank, world_size, episode_count);
    let stripe_lengths = index.lengths_of(&stripe)?;

    let mut partition = Partition {
        rank,
        required_length,
        episodes: Vec::with_capacity(stripe.len()),
        lengths: Vec::with_capacity(stripe.len()),
        weights: Vec::with_capacity(stripe.len()),
    };
    for (episode_id, length) in stripe.iter().copied().zip(stripe_lengths) {
        if length > required_length {
            partition.episodes.push(episode_id);
            partition.lengths.push(length);
            partition.weights.push(weights[episode_id]);
        }
    }

    debug!(
        rank,
        world_size,
        stripe = stripe.len(),
        eligible = partition.len(),
        required_length,
        "partitioned episodes"
    );

    if partition.is_empty() {
        return Err(SamplerError::NoEligibleEpisodes {
            rank,
            required_length,
        });
    }
    Ok(partition)
}
