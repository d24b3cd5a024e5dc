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
    author = "BindLoop Contributors",
    version,
    about = "BindLoop CLI - Drives a resumable binder-design campaign: trajectory generation, sequence redesign, filtering and ranking.",
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
    /// Run (or resume) a design campaign until the quota of accepted designs or the trajectory budget is reached.
    Run(RunArgs),
    /// Summarize the state of an existing design directory.
    Status(StatusArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Settings Files ---
    /// Path to the target settings JSON (design path, binder name, target structure, lengths).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub settings: PathBuf,

    /// Path to the filter thresholds JSON. Without it no candidate is ever rejected.
    #[arg(short, long, value_name = "PATH")]
    pub filters: Option<PathBuf>,

    /// Path to the advanced settings JSON. Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub advanced: Option<PathBuf>,

    // --- Overrides ---
    /// Seed of the trajectory sampler. Runs with the same seed sample the same designs.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the command that serves the structure-generation, redesign, prediction and scoring calls.
    #[arg(short, long, value_name = "COMMAND")]
    pub backend: Option<String>,

    /// Set a specific advanced setting, overriding the settings files.
    /// Can be used multiple times. Example: -S max_trajectories=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `status` subcommand.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct StatusArgs {
    /// The design directory to inspect.
    #[arg(short, long, value_name = "PATH")]
    pub design_path: Option<PathBuf>,

    /// Read the design directory from a target settings JSON instead.
    #[arg(short, long, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}
