use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, error::ErrorKind};

use crate::checkpoint::SamplerCheckpoint;
use crate::config::SamplerConfig;
use crate::constants::checkpoint::DEFAULT_CHECKPOINT_FILENAME;
use crate::constants::sampler::DEFAULT_SEED;
use crate::metrics::{episode_counts, episode_skew};
use crate::sampler::{Sampler, SegmentSampler};
use crate::segment::{SegmentBatch, SegmentId};
use crate::source::{EpisodeIndex, EpisodeLengths};
use crate::types::Weight;

#[derive(Debug, Clone)]
struct WeightList(Vec<Weight>);

#[derive(Debug, Parser)]
#[command(
    name = "sample_segments",
    disable_help_subcommand = true,
    about = "Print sampled segment batches for one rank",
    long_about = "Draw weighted segment batches from an episode length index, including autoregressive continuation pages, and print their coordinates.",
    after_help = "Episode lengths come from --lengths or from a JSON manifest ({\"lengths\": [...]}) passed with --manifest."
)]
/// CLI for `sample_segments`.
///
/// Common usage:
/// - Inline lengths: `--lengths 10,100,5 --sequence-length 4`
/// - Two-page chains: `--pages 2 --autoregressive-obs 2`
/// - Resume a stream: `--checkpoint-dir /tmp/sampler` (loads if present, saves on exit)
struct SampleSegmentsCli {
    #[arg(
        long,
        value_name = "L0,L1,...",
        value_parser = parse_lengths_arg,
        required_unless_present = "manifest",
        conflicts_with = "manifest",
        help = "Comma-separated episode lengths in episode-id order"
    )]
    lengths: Option<EpisodeLengths>,
    #[arg(
        long,
        value_name = "PATH",
        help = "JSON manifest holding episode lengths"
    )]
    manifest: Option<PathBuf>,
    #[arg(long, default_value_t = 0, help = "Rank of this worker")]
    rank: usize,
    #[arg(
        long = "world-size",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Number of distributed workers"
    )]
    world_size: usize,
    #[arg(
        long = "batch-size",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Segments per batch"
    )]
    batch_size: usize,
    #[arg(
        long = "sequence-length",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Steps per freshly drawn window"
    )]
    sequence_length: usize,
    #[arg(
        long = "autoregressive-obs",
        value_parser = parse_positive_usize,
        help = "Stride of each continuation page (required with --pages > 1, at most --sequence-length)"
    )]
    autoregressive_obs: Option<usize>,
    #[arg(
        long,
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Consecutive batches per cycle (1 fresh + pages-1 continuations)"
    )]
    pages: usize,
    #[arg(
        long,
        value_name = "W0,W1,...",
        value_parser = parse_weights_arg,
        help = "Bucketed weight schedule; must sum to 1.0"
    )]
    weights: Option<WeightList>,
    #[arg(
        long = "max-episodes",
        value_parser = parse_positive_usize,
        help = "Distinct episode draws per batch (must divide --batch-size)"
    )]
    max_episodes: Option<usize>,
    #[arg(
        long,
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Number of batches to print"
    )]
    batches: usize,
    #[arg(long, help = "Optional deterministic seed override")]
    seed: Option<u64>,
    #[arg(
        long = "checkpoint-dir",
        value_name = "DIR",
        help = "Directory for the sampler checkpoint (loaded when present, written on exit)"
    )]
    checkpoint_dir: Option<PathBuf>,
}

/// Run the `sample_segments` demo with command-line arguments (program name excluded).
pub fn run_sample_segments<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<SampleSegmentsCli, _>(
        std::iter::once("sample_segments".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let index = match (cli.lengths, &cli.manifest) {
        (Some(lengths), _) => lengths,
        (None, Some(path)) => EpisodeLengths::from_json_path(path)?,
        (None, None) => return Err("either --lengths or --manifest is required".into()),
    };

    let config = SamplerConfig {
        seed: cli.seed.unwrap_or(DEFAULT_SEED),
        rank: cli.rank,
        world_size: cli.world_size,
        batch_size: cli.batch_size,
        sequence_length: cli.sequence_length,
        sample_weights: cli.weights.map(|list| list.0),
        autoregressive_obs: cli.autoregressive_obs,
        num_consecutive_batches: cli.pages,
        max_episodes_per_batch: cli.max_episodes,
    };

    println!(
        "Sampling rank {}/{} over {} episodes ({} steps)",
        config.rank,
        config.world_size,
        index.episode_count(),
        index.total_steps()
    );

    let mut sampler = SegmentSampler::new(config, index)?;
    let partition = sampler.eligible_episodes()?;
    println!(
        "Eligible episodes: {} (chain length > {} steps)",
        partition.len(),
        partition.required_length
    );

    let checkpoint_path = cli
        .checkpoint_dir
        .as_deref()
        .map(|dir| dir.join(DEFAULT_CHECKPOINT_FILENAME));
    if let Some(path) = checkpoint_path.as_deref().filter(|path| path.exists()) {
        sampler.restore(&SamplerCheckpoint::load_json(path)?)?;
        println!("Resumed from {}", path.display());
    }

    let mut fresh: Vec<SegmentId> = Vec::new();
    for batch_idx in 0..cli.batches {
        let position = sampler.cycle_position();
        let batch = sampler.next_batch()?;
        print_batch(batch_idx, position, &batch);
        fresh.extend(batch.iter().filter(|segment| segment.is_fresh()));
    }

    if let Some(skew) = episode_skew(&episode_counts(&fresh)) {
        println!(
            "Fresh draws: {} over {} episodes (max share {:.2}, max/min {:.2})",
            skew.total, skew.episodes, skew.max_share, skew.ratio
        );
        for entry in skew.per_episode.iter().take(5) {
            println!(
                "  episode {:>6}: {:>4} ({:.1}%)",
                entry.episode_id,
                entry.count,
                entry.share * 100.0
            );
        }
    }

    if let Some(path) = checkpoint_path.as_deref() {
        save_checkpoint(&sampler, path)?;
    }
    Ok(())
}

fn save_checkpoint(
    sampler: &SegmentSampler<EpisodeLengths>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    sampler.checkpoint().save_json(path)?;
    println!("Saved checkpoint to {}", path.display());
    Ok(())
}

fn print_batch(batch_idx: usize, position: usize, batch: &SegmentBatch) {
    let phase = if position == 0 { "fresh" } else { "continue" };
    println!("batch {batch_idx} [{phase} {position}]");
    for (slot, segment) in batch.iter().enumerate() {
        println!(
            "  slot {slot:>3}: episode {:>6} [{:>6}, {:>6}) len {:>4} flag={}",
            segment.episode_id,
            segment.start,
            segment.stop,
            segment.len(),
            segment.continuation_flag
        );
    }
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_lengths_arg(raw: &str) -> Result<EpisodeLengths, String> {
    let lengths = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid episode length '{}': must be an integer", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if lengths.is_empty() {
        return Err("--lengths expects at least one value".to_string());
    }
    Ok(EpisodeLengths::new(lengths))
}

fn parse_weights_arg(raw: &str) -> Result<WeightList, String> {
    let weights = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<Weight>()
                .map_err(|_| format!("invalid weight '{}': must be a float", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WeightList(weights))
}
