//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments into `Settings`
//! - installs logging
//! - dispatches to the pipeline
//! - maps outcomes to process exit codes

use clap::Parser;

use crate::cli::{Cli, Command, DataArgs, RunArgs, SynthArgs};
use crate::config::{Settings, WarningPolicy};
use crate::error::{AppError, PipelineError};
use crate::io::default_run_id;
use crate::report::{format_run_summary, format_validation};

pub mod pipeline;

/// Exit code for a run that exported artifacts but had models fail.
pub const EXIT_FIT_FAILURES: u8 = 4;
/// Exit code for `validate` when a gate reported errors.
pub const EXIT_INVALID: u8 = 3;

/// Entry point for the `chfs` binary.
pub fn run() -> Result<(), AppError> {
    // `chfs` and `chfs --models M1` behave like `chfs run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Validate(args) => handle_validate(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn base_settings(data: &DataArgs) -> Settings {
    let mut settings = Settings::from_env();
    if let Some(dir) = &data.data_dir {
        settings.data_dir = dir.clone();
    }
    settings
}

pub fn settings_from_args(args: &RunArgs) -> Settings {
    let mut settings = base_settings(&args.data);
    if let Some(dir) = &args.output_dir {
        settings.output_dir = dir.clone();
    }
    settings.seed = args.seed;
    if args.strict {
        settings.warning_policy = WarningPolicy::BlockExport;
    }
    settings
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    crate::logging::init(args.data.verbose);
    let settings = settings_from_args(&args);
    let options = pipeline::RunOptions {
        run_id: args.run_id.clone().unwrap_or_else(default_run_id),
        models: args.models.clone(),
    };

    let output = pipeline::run_analysis(&settings, &options)?;
    println!(
        "{}",
        format_run_summary(&options.run_id, output.prepared.analysis.n_rows(), &output.batch)
    );
    println!("Artifacts: {}", output.run_dir.display());

    if output.batch.is_complete() {
        Ok(())
    } else {
        Err(AppError::new(
            EXIT_FIT_FAILURES,
            format!(
                "{} of {} model(s) failed to fit",
                output.batch.failures.len(),
                output.batch.failures.len() + output.batch.results.len()
            ),
        ))
    }
}

fn handle_validate(args: DataArgs) -> Result<(), AppError> {
    crate::logging::init(args.verbose);
    let settings = base_settings(&args);
    let reports = pipeline::check_gates(&settings)?;

    println!("{}", format_validation(&reports.input));
    match &reports.analysis {
        Some(analysis) => println!("{}", format_validation(analysis)),
        None => println!("analysis validation skipped: input gate failed"),
    }

    if reports.is_valid() {
        Ok(())
    } else {
        Err(AppError::new(EXIT_INVALID, "validation failed"))
    }
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    crate::logging::init(args.verbose);
    let extract = crate::data::generate(args.households, args.seed).map_err(PipelineError::from)?;
    extract.write_to(&args.out).map_err(PipelineError::from)?;
    println!(
        "Wrote {} households and {} individuals to {}",
        extract.households.n_rows(),
        extract.individuals.n_rows(),
        args.out.display()
    );
    Ok(())
}

/// Rewrite argv so `chfs` defaults to `chfs run`.
///
/// Rules:
/// - `chfs`                       -> `chfs run`
/// - `chfs --models M1 ...`       -> `chfs run --models M1 ...`
/// - `chfs --help/--version/-h`   -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }
    if matches!(arg1.as_str(), "run" | "validate" | "synth") {
        return argv;
    }
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}
