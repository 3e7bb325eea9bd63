use crate::constants::sampler::{DEFAULT_NUM_CONSECUTIVE_BATCHES, DEFAULT_SEED};
use crate::errors::SamplerError;
use crate::types::{StepCount, Weight};
use crate::weights::validate_schedule;

/// Top-level sampler configuration.
///
/// Everything except `num_consecutive_batches` is fixed for the lifetime of a
/// sampler; the cycle length may only change between cycles (see
/// [`crate::SegmentSampler::set_num_consecutive_batches`]).
#[derive(Clone, Debug)]
pub struct SamplerConfig {
    /// Base RNG seed. Samplers derive a per-rank stream from it.
    pub seed: u64,
    /// Index of this worker in the distributed job.
    pub rank: usize,
    /// Number of cooperating workers.
    pub world_size: usize,
    /// Segments per batch.
    pub batch_size: usize,
    /// Steps covered by every freshly drawn (first-page) window.
    pub sequence_length: StepCount,
    /// Optional coarse weight schedule over contiguous episode buckets.
    ///
    /// Entries must lie in `[0, 1]` and sum to `1`. `None` (or a schedule with
    /// more buckets than episodes) selects length-proportional weighting.
    pub sample_weights: Option<Vec<Weight>>,
    /// Stride of each continuation page. Required when
    /// `num_consecutive_batches > 1`.
    pub autoregressive_obs: Option<StepCount>,
    /// Batches per cycle: one fresh draw followed by `n - 1` continuations.
    pub num_consecutive_batches: usize,
    /// Distinct episode draws per batch; each draw is repeated
    /// `batch_size / max_episodes_per_batch` times. `None` means `batch_size`.
    pub max_episodes_per_batch: Option<usize>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            rank: 0,
            world_size: 1,
            batch_size: 32,
            sequence_length: 16,
            sample_weights: None,
            autoregressive_obs: None,
            num_consecutive_batches: DEFAULT_NUM_CONSECUTIVE_BATCHES,
            max_episodes_per_batch: None,
        }
    }
}

impl SamplerConfig {
    /// Check every field eagerly; samplers call this before touching the dataset.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.world_size == 0 {
            return Err(SamplerError::Configuration(
                "world_size must be greater than 0".to_string(),
            ));
        }
        if self.rank >= self.world_size {
            return Err(SamplerError::Configuration(format!(
                "rank {} must be less than world_size {}",
                self.rank, self.world_size
            )));
        }
        if self.batch_size == 0 {
            return Err(SamplerError::Configuration(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.sequence_length == 0 {
            return Err(SamplerError::Configuration(
                "sequence_length must be greater than 0".to_string(),
            ));
        }
        if let Some(max_eps) = self.max_episodes_per_batch {
            if max_eps == 0 || max_eps > self.batch_size || self.batch_size % max_eps != 0 {
                return Err(SamplerError::Configuration(format!(
                    "max_episodes_per_batch {max_eps} must divide batch_size {}",
                    self.batch_size
                )));
            }
        }
        if let Some(schedule) = &self.sample_weights {
            validate_schedule(schedule)?;
        }
        self.validate_cycle_length(self.num_consecutive_batches)
    }

    /// Check that `num_consecutive_batches` is usable with this configuration.
    pub fn validate_cycle_length(&self, num_consecutive_batches: usize) -> Result<(), SamplerError> {
        if num_consecutive_batches == 0 {
            return Err(SamplerError::Configuration(
                "num_consecutive_batches must be at least 1".to_string(),
            ));
        }
        if num_consecutive_batches > 1 {
            match self.autoregressive_obs {
                // Fresh draws reserve `sequence_length` per continuation page.
                Some(stride) if stride > self.sequence_length => {
                    return Err(SamplerError::Configuration(format!(
                        "autoregressive_obs {stride} must not exceed sequence_length {}",
                        self.sequence_length
                    )));
                }
                Some(stride) if stride > 0 => {}
                Some(_) => {
                    return Err(SamplerError::Configuration(
                        "autoregressive_obs must be greater than 0".to_string(),
                    ));
                }
                None => {
                    return Err(SamplerError::Configuration(format!(
                        "autoregressive_obs is required when num_consecutive_batches is {num_consecutive_batches}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Continuation stride; `0` when no stride is configured (single-page cycles).
    pub fn autoregressive_stride(&self) -> StepCount {
        self.autoregressive_obs.unwrap_or(0)
    }

    /// Distinct episode draws per batch.
    pub fn episodes_per_batch(&self) -> usize {
        self.max_episodes_per_batch.unwrap_or(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SamplerConfig {
        SamplerConfig {
            batch_size: 4,
            sequence_length: 4,
            ..SamplerConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SamplerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_rank_outside_world() {
        let config = SamplerConfig {
            rank: 2,
            world_size: 2,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(SamplerError::Configuration(_))
        ));

        let config = SamplerConfig {
            world_size: 0,
            ..base()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(
            SamplerConfig {
                batch_size: 0,
                ..base()
            }
            .validate()
            .is_err()
        );
        assert!(
            SamplerConfig {
                sequence_length: 0,
                ..base()
            }
            .validate()
            .is_err()
        );
        assert!(
            SamplerConfig {
                num_consecutive_batches: 0,
                ..base()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn multi_page_cycles_need_a_stride() {
        let missing = SamplerConfig {
            num_consecutive_batches: 3,
            ..base()
        };
        let err = missing.validate().unwrap_err();
        assert!(err.to_string().contains("autoregressive_obs"));

        let zero = SamplerConfig {
            num_consecutive_batches: 3,
            autoregressive_obs: Some(0),
            ..base()
        };
        assert!(zero.validate().is_err());

        let ok = SamplerConfig {
            num_consecutive_batches: 3,
            autoregressive_obs: Some(2),
            ..base()
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.autoregressive_stride(), 2);
    }

    #[test]
    fn stride_may_not_exceed_sequence_length_in_multi_page_cycles() {
        let too_long = SamplerConfig {
            num_consecutive_batches: 2,
            autoregressive_obs: Some(5),
            ..base()
        };
        let err = too_long.validate().unwrap_err();
        assert!(err.to_string().contains("must not exceed sequence_length 4"));

        let equal = SamplerConfig {
            autoregressive_obs: Some(4),
            ..too_long.clone()
        };
        assert!(equal.validate().is_ok());

        // Single-page cycles never advance, so the stride is unused.
        let single = SamplerConfig {
            num_consecutive_batches: 1,
            ..too_long
        };
        assert!(single.validate().is_ok());
    }

    #[test]
    fn max_episodes_must_divide_batch_size() {
        let bad = SamplerConfig {
            max_episodes_per_batch: Some(3),
            ..base()
        };
        assert!(bad.validate().is_err());

        let good = SamplerConfig {
            max_episodes_per_batch: Some(2),
            ..base()
        };
        assert!(good.validate().is_ok());
        assert_eq!(good.episodes_per_batch(), 2);
        assert_eq!(base().episodes_per_batch(), 4);
    }

    #[test]
    fn schedule_is_validated_with_the_config() {
        let bad_sum = SamplerConfig {
            sample_weights: Some(vec![0.51, 0.5]),
            ..base()
        };
        assert!(bad_sum.validate().is_err());

        let negative = SamplerConfig {
            sample_weights: Some(vec![1.5, -0.5]),
            ..base()
        };
        assert!(negative.validate().is_err());
    }
}
