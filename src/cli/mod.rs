//! Command-line parsing for the `chfs` binary.
//!
//! Argument parsing and command dispatch stay separate from the data and
//! estimation code; `app` turns these structs into `Settings`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "chfs",
    version,
    about = "Siblings and household debt: CHFS 2017 regression pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load, validate, build features, fit the model battery and export artifacts.
    Run(RunArgs),
    /// Run both validation gates and print their reports; nothing is written.
    Validate(DataArgs),
    /// Write a seeded synthetic extract in the layout `run` expects.
    Synth(SynthArgs),
}

/// Input location and log verbosity, shared by `run` and `validate`.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Directory holding the household and individual CSV extracts.
    #[arg(long, env = "CHFS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Root for run directories (`<output-dir>/<run-id>/`).
    #[arg(long, env = "CHFS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated model ids to fit (default: the whole battery).
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Run id (default: UTC timestamp).
    #[arg(long)]
    pub run_id: Option<String>,

    /// Seed recorded in the manifest.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Refuse to export while validation warnings are outstanding.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output directory for the two CSV files.
    #[arg(long, default_value = "data/raw")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 2000)]
    pub households: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "chfs",
            "run",
            "--models",
            "M1,M3",
            "--run-id",
            "r1",
            "--strict",
            "-v",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.models, vec!["M1", "M3"]);
        assert_eq!(args.run_id.as_deref(), Some("r1"));
        assert!(args.strict);
        assert!(args.data.verbose);
        assert_eq!(args.seed, 42);
    }

    #[test]
    fn synth_defaults() {
        let cli = Cli::parse_from(["chfs", "synth", "--households", "50"]);
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.households, 50);
        assert_eq!(args.out, PathBuf::from("data/raw"));
    }
}
