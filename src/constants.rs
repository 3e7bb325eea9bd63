/// Constants used by sampler runtime behavior.
pub mod sampler {
    /// Default base RNG seed when the caller does not supply one.
    pub const DEFAULT_SEED: u64 = 42;
    /// Offset mixed into per-rank seed derivation so rank 0 does not reuse the raw base seed.
    pub const RANK_SEED_OFFSET: u64 = 0xB4C3_5EED;
    /// Default number of consecutive batches per cycle (no continuation pages).
    pub const DEFAULT_NUM_CONSECUTIVE_BATCHES: usize = 1;
}

/// Constants used by weight schedule validation.
pub mod weights {
    /// Allowed absolute deviation of a weight schedule's sum from `1.0`.
    pub const SCHEDULE_SUM_EPSILON: f64 = 1e-6;
}

/// Constants used by checkpoint persistence.
pub mod checkpoint {
    /// Version tag for persisted sampler checkpoints.
    pub const CHECKPOINT_VERSION: u8 = 1;
    /// Default filename for checkpoints written by the demo runner.
    pub const DEFAULT_CHECKPOINT_FILENAME: &str = "sampler_checkpoint.json";
}
