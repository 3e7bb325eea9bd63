//! Per-episode sampling weights.
//!
//! Two modes:
//! - length-proportional: `weight(e) = length(e) / total_steps`;
//! - bucketed schedule: episodes are cut into `schedule.len()` contiguous
//!   buckets of near-equal size (the last bucket takes the remainder) and each
//!   bucket's mass is spread evenly over its members.
//!
//! Resolution is pure and cheap, so samplers recompute it on every fresh draw.

use crate::constants::weights::SCHEDULE_SUM_EPSILON;
use crate::errors::SamplerError;
use crate::source::EpisodeIndex;
use crate::types::Weight;

/// Validate a coarse weight schedule: finite entries in `[0, 1]` summing to `1`.
pub fn validate_schedule(schedule: &[Weight]) -> Result<(), SamplerError> {
    if let Some((idx, value)) = schedule
        .iter()
        .enumerate()
        .find(|(_, value)| !value.is_finite() || **value < 0.0 || **value > 1.0)
    {
        return Err(SamplerError::Configuration(format!(
            "sample weight {idx} is {value}; every entry must lie in [0, 1]"
        )));
    }
    let sum: Weight = schedule.iter().sum();
    if (sum - 1.0).abs() > SCHEDULE_SUM_EPSILON {
        return Err(SamplerError::Configuration(format!(
            "sample weights must sum to 1.0 (got {sum})"
        )));
    }
    Ok(())
}

/// Resolve one weight per episode, in episode-id order.
///
/// A schedule with more buckets than there are episodes cannot be spread over
/// the index and falls back to length-proportional weighting. The schedule is
/// assumed validated (see [`validate_schedule`]).
pub fn resolve_weights<D>(index: &D, schedule: Option<&[Weight]>) -> Result<Vec<Weight>, SamplerError>
where
    D: EpisodeIndex + ?Sized,
{
    let episode_count = index.episode_count();
    match schedule {
        Some(schedule) if !schedule.is_empty() && schedule.len() <= episode_count => {
            Ok(bucketed_weights(schedule, episode_count))
        }
        _ => length_proportional_weights(index),
    }
}

/// `length(e) / total_steps` for every episode; all zeros when the index holds no steps.
pub fn length_proportional_weights<D>(index: &D) -> Result<Vec<Weight>, SamplerError>
where
    D: EpisodeIndex + ?Sized,
{
    let lengths = index.lengths()?;
    let total = index.total_steps();
    if total == 0 {
        return Ok(vec![0.0; lengths.len()]);
    }
    let total = total as Weight;
    Ok(lengths
        .into_iter()
        .map(|length| length as Weight / total)
        .collect())
}

/// Spread `schedule[i]` evenly across bucket `i` of `episode_count` episodes.
pub fn bucketed_weights(schedule: &[Weight], episode_count: usize) -> Vec<Weight> {
    let buckets = schedule.len();
    if buckets == 0 {
        return Vec::new();
    }
    let base = episode_count / buckets;
    let remainder = episode_count % buckets;
    let mut weights = Vec::with_capacity(episode_count);
    for (bucket, &mass) in schedule.iter().enumerate() {
        let size = if bucket == buckets - 1 {
            base + remainder
        } else {
            base
        };
        if size == 0 {
            continue;
        }
        let share = mass / size as Weight;
        weights.extend(std::iter::repeat_n(share, size));
    }
    weights
}

/// Scale `weights` to sum to one. `None` when the sum is zero or not finite.
pub fn normalize_weights(weights: &[Weight]) -> Option<Vec<Weight>> {
    let sum: Weight = weights.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return None;
    }
    Some(weights.iter().map(|weight| weight / sum).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::EpisodeLengths;

    fn assert_close(a: Weight, b: Weight) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn schedule_validation_catches_sum_and_range() {
        assert!(validate_schedule(&[0.25, 0.75]).is_ok());
        assert!(validate_schedule(&[1.0]).is_ok());
        assert!(validate_schedule(&[0.5, 0.51]).is_err());
        assert!(validate_schedule(&[1.01]).is_err());
        assert!(validate_schedule(&[-0.1, 1.1]).is_err());
        assert!(validate_schedule(&[f64::NAN, 1.0]).is_err());
        assert!(validate_schedule(&[]).is_err());
    }

    #[test]
    fn default_mode_is_length_proportional() {
        let index = EpisodeLengths::new(vec![10, 100, 5]);
        let weights = resolve_weights(&index, None).unwrap();
        assert_eq!(weights.len(), 3);
        assert_close(weights[0], 10.0 / 115.0);
        assert_close(weights[1], 100.0 / 115.0);
        assert_close(weights[2], 5.0 / 115.0);
        assert_close(weights.iter().sum(), 1.0);
    }

    #[test]
    fn schedule_spreads_mass_over_buckets_with_remainder_in_last() {
        let index = EpisodeLengths::new(vec![1; 7]);
        let weights = resolve_weights(&index, Some(&[0.5, 0.3, 0.2][..])).unwrap();
        // 7 episodes / 3 buckets => sizes 2, 2, 3.
        assert_eq!(weights.len(), 7);
        assert_close(weights[0], 0.25);
        assert_close(weights[1], 0.25);
        assert_close(weights[2], 0.15);
        assert_close(weights[3], 0.15);
        for weight in &weights[4..] {
            assert_close(*weight, 0.2 / 3.0);
        }
        assert_close(weights.iter().sum(), 1.0);
    }

    #[test]
    fn oversized_schedule_falls_back_to_lengths() {
        let index = EpisodeLengths::new(vec![30, 10]);
        let weights = resolve_weights(&index, Some(&[0.2, 0.2, 0.6][..])).unwrap();
        assert_close(weights[0], 0.75);
        assert_close(weights[1], 0.25);
    }

    #[test]
    fn schedule_matching_episode_count_maps_one_to_one() {
        let index = EpisodeLengths::new(vec![5, 500]);
        let weights = resolve_weights(&index, Some(&[0.9, 0.1][..])).unwrap();
        assert_eq!(weights, vec![0.9, 0.1]);
    }

    #[test]
    fn empty_index_yields_zero_weights_not_nan() {
        let index = EpisodeLengths::new(vec![0, 0]);
        assert_eq!(resolve_weights(&index, None).unwrap(), vec![0.0, 0.0]);
        assert!(resolve_weights(&EpisodeLengths::default(), None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn normalization_rejects_zero_mass() {
        assert!(normalize_weights(&[0.0, 0.0]).is_none());
        assert!(normalize_weights(&[]).is_none());
        let normalized = normalize_weights(&[1.0, 3.0]).unwrap();
        assert_close(normalized[0], 0.25);
        assert_close(normalized[1], 0.75);
    }
}
