use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Needler CLI - Selects the peptides to target in a scheduled mass spectrometry run so that as many proteins as possible are fully covered.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Choose a capacity-respecting set of peptides that targets the most proteins.
    Optimize(OptimizeArgs),
}

/// Arguments for the `optimize` subcommand.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    // --- Core Arguments ---
    /// Path to the candidate peptide table (CSV with header).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Path of the result table. Rewritten atomically after every improvement.
    #[arg(short = 'o', long = "dst", required = true, value_name = "PATH")]
    pub destination: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Model Overrides ---
    /// Maximum number of targeted peptides eluting during any second.
    #[arg(short = 't', long = "targets", value_name = "INT")]
    pub targets_per_cycle: Option<usize>,

    /// Number of peptides a protein needs selected to count as targeted.
    #[arg(short = 'k', long = "peps-per-prot", value_name = "INT")]
    pub peptides_per_protein: Option<usize>,

    /// Half-width of each elution window, in seconds.
    #[arg(short = 'w', long, value_name = "SECONDS")]
    pub rt_width: Option<u32>,

    /// Slack added to the global selection-size hint.
    #[arg(long, value_name = "INT")]
    pub cardinality_slack: Option<usize>,

    /// Emit a capacity constraint for every second, even when nothing changed.
    #[arg(long)]
    pub no_dedup_slots: bool,

    // --- Search Overrides ---
    /// Wall-clock budget in seconds. Zero or negative disables the limit.
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    // --- Ordering Overrides ---
    /// Randomize row order and identifiers before building the model.
    #[arg(long)]
    pub shuffle: bool,

    /// Order proteins by ascending peptide count.
    #[arg(long = "sort-groups")]
    pub group_by_size: bool,

    /// Seed for the shuffling random number generator.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S model.targets-per-cycle=5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
