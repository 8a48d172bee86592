use crate::utils::parser::{FrameRange, parse_frame_range};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "trajstream - Inspect GROMACS TRR and XTC trajectories frame by frame without loading them into memory.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output and progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Optional configuration file in TOML format
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a trajectory and print its frame count, atom count and timing.
    Info(InfoArgs),
    /// Decode selected frames and print or export their coordinates.
    Frames(FramesArgs),
    /// Verify that a trajectory can be indexed (and optionally decoded) to the end.
    Check(CheckArgs),
}

/// Output format for command results.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable aligned text
    #[default]
    Table,
    /// JSON document
    Json,
    /// Comma-separated values, one row per atom
    Csv,
}

/// Reader settings shared by all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct ReaderArgs {
    /// Number of decoded frames kept in memory (overrides `reader.cache-capacity`).
    #[arg(long, value_name = "FRAMES")]
    pub cache_capacity: Option<usize>,

    /// Fail instead of warning when the trajectory ends in corrupt or partial data.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the trajectory file (.trr or .xtc).
    #[arg(required = true, value_name = "TRAJECTORY")]
    pub input: PathBuf,

    /// Structure file accompanying the trajectory (e.g., conf.gro), reported alongside it.
    #[arg(short, long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// List the time stamp of every frame.
    #[arg(long)]
    pub times: bool,

    /// Output format (overrides `output.format`).
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(flatten)]
    pub reader: ReaderArgs,
}

/// Mutually exclusive ways of choosing frames.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct FrameSelection {
    /// Comma-separated frame numbers, returned in the given order (e.g., 0,5,9).
    #[arg(long, value_name = "N,...", value_delimiter = ',')]
    pub frames: Vec<u64>,

    /// Inclusive frame range (e.g., 2..4).
    #[arg(long, value_name = "START..END", value_parser = parse_frame_range)]
    pub range: Option<FrameRange>,
}

/// Arguments for the `frames` subcommand.
#[derive(Args, Debug)]
pub struct FramesArgs {
    /// Path to the trajectory file (.trr or .xtc).
    #[arg(required = true, value_name = "TRAJECTORY")]
    pub input: PathBuf,

    /// Frames to decode; all frames when omitted.
    #[command(flatten)]
    pub selection: FrameSelection,

    /// Output format (overrides `output.format`).
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Digits after the decimal point in table and CSV output (overrides `output.decimals`).
    #[arg(short, long, value_name = "INT")]
    pub decimals: Option<usize>,

    /// Write the output to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub reader: ReaderArgs,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the trajectory file (.trr or .xtc).
    #[arg(required = true, value_name = "TRAJECTORY")]
    pub input: PathBuf,

    /// Also decode every indexed frame, reporting the first one that fails.
    #[arg(long)]
    pub decode: bool,

    #[command(flatten)]
    pub reader: ReaderArgs,
}
