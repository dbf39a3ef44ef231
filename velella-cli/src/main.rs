//! Command-line entry point for Velella.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use velella_core::CancelFlag;
use velella_place::export::{write_distance_table, write_histogram};
use velella_place::jplace::JplaceDocument;
use velella_place::{run_placement, AssignmentMode, PlaceConfig};
use velella_seq::parse_pattern_line;

#[derive(Parser, Debug)]
#[command(name = "velella")]
#[command(version, about = "Alignment-free phylogenetic placement of reads", long_about = None)]
struct Cli {
    /// Reference genomes (FASTA)
    #[arg(short = 's', long)]
    references: PathBuf,

    /// Query reads (FASTA/FASTQ)
    #[arg(short = 'q', long)]
    reads: PathBuf,

    /// Reference tree (Newick)
    #[arg(short = 't', long)]
    tree: PathBuf,

    /// Output placement file
    #[arg(short = 'o', long, default_value = "placement.jplace")]
    output: PathBuf,

    /// Spaced-seed pattern (repeatable)
    #[arg(short = 'p', long = "pattern")]
    patterns: Vec<String>,

    /// File of spaced-seed patterns, separated by comma, period,
    /// semicolon, space, or newline
    #[arg(long)]
    pattern_file: Option<PathBuf>,

    /// Number of match positions per pattern (2-32)
    #[arg(short = 'w', long, default_value_t = 12)]
    weight: usize,

    /// Number of don't-care positions per pattern (2-32)
    #[arg(short = 'd', long, default_value_t = 32)]
    spaces: usize,

    /// Placement policy
    #[arg(short = 'm', long, value_enum, default_value_t = Mode::LcaCount)]
    mode: Mode,

    /// Dominance divisor for the lca-dominant policy (>= 1)
    #[arg(short = 'x', long, default_value_t = 2.0)]
    dominance_x: f64,

    /// Filtering threshold multiplicator; a match must score strictly
    /// above spaces * multiplicator
    #[arg(short = 'f', long, default_value_t = 0)]
    filtering_threshold_multiplicator: i64,

    /// Enable min-hash word sampling
    #[arg(long)]
    sampling: bool,

    /// With --sampling, keep words whose CRC-32 is below this limit
    #[arg(long, default_value_t = 10000)]
    min_hash_lower_limit: u32,

    /// Reads per processing block (1-200000)
    #[arg(short = 'b', long, default_value_t = 1000)]
    read_block_size: usize,

    /// Distance for unmatched or saturated pairs
    #[arg(long, default_value_t = 10.0)]
    default_distance: f64,

    /// Pendant branch length for LCA and root placements
    #[arg(long, default_value_t = 0.001)]
    default_pendant: f64,

    /// Worker threads for the match stage
    #[arg(short = 'j', long, default_value_t = 1)]
    threads: usize,

    /// Also write the query x reference distance table
    #[arg(long)]
    write_scoring: bool,

    /// Also write a per-match score histogram
    #[arg(long)]
    write_histogram: bool,

    /// Verbose progress output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    BestCount,
    BestDistance,
    LcaCount,
    LcaDistance,
    LcaDominant,
}

impl From<Mode> for AssignmentMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::BestCount => AssignmentMode::BestCount,
            Mode::BestDistance => AssignmentMode::BestDistance,
            Mode::LcaCount => AssignmentMode::LcaCount,
            Mode::LcaDistance => AssignmentMode::LcaDistance,
            Mode::LcaDominant => AssignmentMode::LcaDominant,
        }
    }
}

fn collect_patterns(cli: &Cli) -> Result<Vec<String>> {
    let mut patterns = cli.patterns.clone();
    if let Some(path) = &cli.pattern_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pattern file {}", path.display()))?;
        for line in content.lines() {
            patterns.extend(parse_pattern_line(line).into_iter().map(String::from));
        }
    }
    if patterns.is_empty() {
        bail!("no patterns given; use --pattern or --pattern-file");
    }
    Ok(patterns)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = PlaceConfig {
        weight: cli.weight,
        spaces: cli.spaces,
        patterns: collect_patterns(&cli)?,
        assignment_mode: cli.mode.into(),
        dominance_x: cli.dominance_x,
        filtering_threshold_multiplicator: cli.filtering_threshold_multiplicator,
        sampling: cli.sampling,
        min_hash_lower_limit: cli.min_hash_lower_limit,
        read_block_size: cli.read_block_size,
        default_distance: cli.default_distance,
        default_pendant: cli.default_pendant,
        threads: cli.threads,
    };

    let cancel = CancelFlag::new();
    let outcome = run_placement(
        &config,
        &cli.references,
        &cli.reads,
        &cli.tree,
        cli.write_histogram,
        &cancel,
    )
    .context("placement failed")?;

    let invocation: Vec<String> = std::env::args().collect();
    let document = JplaceDocument::from_outcome(&outcome, &invocation.join(" "));
    let writer = BufWriter::new(
        File::create(&cli.output)
            .with_context(|| format!("creating {}", cli.output.display()))?,
    );
    document.write_to(writer)?;
    info!(path = %cli.output.display(), "placement file written");

    if cli.write_scoring {
        let path = cli.output.with_extension("distances.tsv");
        let writer = BufWriter::new(File::create(&path)?);
        write_distance_table(writer, &outcome.names, &outcome.tables, config.default_distance)?;
        info!(path = %path.display(), "distance table written");
    }

    if cli.write_histogram {
        let path = cli.output.with_extension("histogram.tsv");
        let writer = BufWriter::new(File::create(&path)?);
        write_histogram(writer, &outcome.histogram)?;
        info!(path = %path.display(), "score histogram written");
    }

    Ok(())
}
