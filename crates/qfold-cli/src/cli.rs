use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

/// Largest seed accepted on the command line. Seeds are written to TOML records, whose integers
/// are signed 64-bit.
pub const MAX_SEED: u64 = i64::MAX as u64;

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "qfold CLI - conformational discovery and statistical validation for short peptide sequences.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run discovery attempts for one or more sequences and write every accepted record.
    Discover(DiscoverArgs),
    /// Score an existing backbone conformation without sampling.
    Score(ScoreArgs),
}

/// Arguments for the `discover` subcommand.
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    // --- Input ---
    /// Sequences to attempt, as one-letter residue codes.
    #[arg(value_name = "SEQUENCE")]
    pub sequences: Vec<String>,

    /// Read additional sequences from a file (one per line, or FASTA).
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Directory receiving one TOML file per discovery and the attempt summary.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where to write the CSV summary of all attempts. Defaults to `<output>/summary.csv`.
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    // --- Discovery Overrides ---
    /// Override the number of dihedral bins per residue (a perfect square).
    #[arg(short = 'b', long, value_name = "INT")]
    pub basis_size: Option<usize>,

    /// Override the sampling temperature in Kelvin.
    #[arg(short = 'T', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override the number of collapse draws per run.
    #[arg(short = 'k', long, value_name = "INT")]
    pub sample_count: Option<usize>,

    /// Override the number of independent replicate runs.
    #[arg(short = 'r', long, value_name = "INT")]
    pub replicate_count: Option<usize>,

    /// Override the minimum rigor score an accepted candidate must exceed.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub rigor_threshold: Option<f64>,

    /// Fix the random seed so attempts are reproducible.
    #[arg(long, value_name = "INT", value_parser = clap::value_parser!(u64).range(..=MAX_SEED))]
    pub seed: Option<u64>,

    /// Experimental reference class used by the reality gate (e.g., 'alpha-helical').
    #[arg(long, value_name = "TAG")]
    pub class_tag: Option<String>,

    /// Wall-clock budget for the whole run. Attempts still in flight when it expires are
    /// rejected as interrupted.
    #[arg(long, value_name = "SECONDS")]
    pub time_limit: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S evolution.max-iterations=80
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// The sequence the conformation belongs to.
    #[arg(short, long, required = true, value_name = "SEQUENCE")]
    pub sequence: String,

    /// CSV file with one `phi,psi` row per residue, in degrees.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub dihedrals: PathBuf,

    /// Configuration file supplying `[energy]` parameters and `[reference]` tables.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write the full energy report to this TOML file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
