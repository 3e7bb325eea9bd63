/// Golden-ratio increment used by SplitMix64.
pub(crate) const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 output finalizer. A fixed bijection on `u64`, so results are the
/// same on every platform and toolchain.
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Combine a seed and a rank into one well-mixed `u64`.
pub(crate) fn stable_hash_rank(seed: u64, rank: usize) -> u64 {
    mix64(mix64(seed) ^ (rank as u64).wrapping_add(1).wrapping_mul(GOLDEN_GAMMA))
}
