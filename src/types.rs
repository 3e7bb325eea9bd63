/// Stable identifier of one stored episode (its position in the episode index).
/// Example: `0`, `41`
pub type EpisodeId = usize;
/// Step counts, offsets, and lengths measured in episode steps.
/// Examples: `10` (episode length), `4` (sequence length)
pub type StepCount = usize;
/// Normalized or raw per-episode sampling weight.
/// Examples: `0.0909` (10 / 110), `0.25`
pub type Weight = f64;
