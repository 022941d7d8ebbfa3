use std::collections::HashMap;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};

use community_label_analyzer::data::{infomap, tables};
use community_label_analyzer::{pipeline, storage, AnalysisConfig, Bandwidth, PseudoCount};

#[derive(Parser, Debug)]
#[clap(
    name = "community-label-analyzer",
    about = "Permutation analysis of labeled observations across street-network communities"
)]
struct Cli {
    /// CSV of network nodes (id,x,y and optionally community)
    #[clap(long)]
    nodes: String,

    /// Infomap .clu file with the community of every node
    #[clap(long)]
    communities: Option<String>,

    /// CSV of labeled observations (id,x,y,label)
    #[clap(long)]
    observations: String,

    /// CSV of community areas (community,area)
    #[clap(long)]
    areas: Option<String>,

    /// Output directory for results
    #[clap(long, default_value = "label_results")]
    output_dir: String,

    /// Number of label permutations
    #[clap(long, default_value = "1000")]
    realizations: usize,

    /// Seed for the permutation streams
    #[clap(long, default_value = "0")]
    seed: u64,

    /// Padding of count cells
    #[clap(long, value_enum, default_value = "additive")]
    pseudo_count: PseudoCountArg,

    /// Kernel bandwidth rule for null densities
    #[clap(long, value_enum, default_value = "scaled-std")]
    bandwidth: BandwidthArg,

    /// Factor (scaled-std) or absolute width (fixed) for the bandwidth rule
    #[clap(long, default_value = "0.25")]
    bandwidth_value: f64,

    /// Number of density evaluation points on [0, 1]
    #[clap(long, default_value = "100")]
    grid_points: usize,

    /// Run permutations on the calling thread only
    #[clap(long)]
    sequential: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PseudoCountArg {
    None,
    Additive,
    FillEmpty,
}

impl From<PseudoCountArg> for PseudoCount {
    fn from(arg: PseudoCountArg) -> Self {
        match arg {
            PseudoCountArg::None => PseudoCount::None,
            PseudoCountArg::Additive => PseudoCount::Additive,
            PseudoCountArg::FillEmpty => PseudoCount::FillEmpty,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BandwidthArg {
    ScaledStd,
    Scott,
    Silverman,
    Fixed,
}

impl Cli {
    fn bandwidth(&self) -> Bandwidth {
        match self.bandwidth {
            BandwidthArg::ScaledStd => Bandwidth::ScaledStd(self.bandwidth_value),
            BandwidthArg::Scott => Bandwidth::Scott,
            BandwidthArg::Silverman => Bandwidth::Silverman,
            BandwidthArg::Fixed => Bandwidth::Fixed(self.bandwidth_value),
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let mut config = AnalysisConfig::new(
        args.realizations,
        args.seed,
        args.pseudo_count.into(),
        args.bandwidth(),
        args.grid_points,
    );
    config.parallel = !args.sequential;
    config.validate()?;

    log::info!("Starting community label analysis");
    log::info!("Nodes: {}", args.nodes);
    log::info!("Observations: {}", args.observations);
    log::info!("Output: {}", args.output_dir);

    // 1. Load data
    let node_records = tables::load_nodes(&args.nodes)?;
    let community_table = match args.communities {
        Some(ref path) => infomap::load_communities(path)?,
        None if node_records.iter().all(|n| n.community_id.is_some()) => HashMap::new(),
        None => {
            return Err(anyhow!(
                "Node table has no community column; pass --communities with an Infomap .clu file"
            ))
        }
    };
    let nodes = tables::attach_communities(&node_records, &community_table)?;
    let points = tables::load_observations(&args.observations)?;
    let areas = args.areas.as_ref().map(tables::load_areas).transpose()?;

    // 2. Attribute, count and permute
    let output = pipeline::run(&nodes, &points, areas.as_ref(), &config)?;

    // 3. Save results
    storage::save_results(&output, &config, &args.output_dir)?;

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
