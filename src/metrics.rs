use std::collections::HashMap;

use crate::segment::SegmentId;
use crate::types::EpisodeId;

/// Aggregate skew metrics for per-episode sample counts.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSkew {
    /// Segments counted.
    pub total: usize,
    /// Distinct episodes seen.
    pub episodes: usize,
    /// Smallest per-episode count.
    pub min: usize,
    /// Largest per-episode count.
    pub max: usize,
    /// Mean count per seen episode.
    pub mean: f64,
    /// `max / total`.
    pub max_share: f64,
    /// `min / total`.
    pub min_share: f64,
    /// `max / min`; infinite when `min` is zero.
    pub ratio: f64,
    /// Per-episode breakdown, most sampled first.
    pub per_episode: Vec<EpisodeShare>,
}

/// Per-episode share of the sampled segments.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeShare {
    /// Episode id.
    pub episode_id: EpisodeId,
    /// Segments drawn from the episode.
    pub count: usize,
    /// `count / total`.
    pub share: f64,
}

/// Count segments per episode.
///
/// Pass only fresh segments (`continuation_flag == true`) to measure the draw
/// distribution; continuation pages repeat their chain's episode.
pub fn episode_counts<'a>(
    segments: impl IntoIterator<Item = &'a SegmentId>,
) -> HashMap<EpisodeId, usize> {
    let mut counts = HashMap::new();
    for segment in segments {
        *counts.entry(segment.episode_id).or_insert(0) += 1;
    }
    counts
}

/// Compute skew metrics from per-episode counts.
pub fn episode_skew(counts: &HashMap<EpisodeId, usize>) -> Option<EpisodeSkew> {
    let min = *counts.values().min()?;
    let max = *counts.values().max()?;
    let total: usize = counts.values().sum();
    let episodes = counts.len();
    let mean = total as f64 / episodes as f64;
    let share_of = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let mut per_episode: Vec<EpisodeShare> = counts
        .iter()
        .map(|(episode_id, count)| EpisodeShare {
            episode_id: *episode_id,
            count: *count,
            share: share_of(*count),
        })
        .collect();
    per_episode.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.episode_id.cmp(&b.episode_id))
    });
    Some(EpisodeSkew {
        total,
        episodes,
        min,
        max,
        mean,
        max_share: share_of(max),
        min_share: share_of(min),
        ratio,
        per_episode,
    })
}
