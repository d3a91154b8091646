//! stepseq
//!
//! Generates a sequence from a start value and a repeated step, stopping on
//! its own when the values diverge, converge or start repeating, and writes
//! the result to a CSV file.
//!
//! The request is entered interactively, or read from a JSON file with
//! `--request`. `--intonly` switches to exact integer arithmetic.

mod config;
mod output;
mod prompt;

use clap::Parser as ClapParser;
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stepseq_core::NumericMode;
use stepseq_engine::{generate, GenerationError, Outcome};
use thiserror::Error;
use tracing::{info, Level};

use crate::config::{load_job, ConfigError};
use crate::output::{csv_filename, save_to_csv};
use crate::prompt::{prompt_job, Job, PromptError};

const LOG_ENV: &str = "STEPSEQ_LOG";

#[derive(ClapParser, Debug)]
#[command(name = "stepseq", version, about = "Generate a sequence by repeating one step")]
pub struct Arguments {
    /// Use exact integer arithmetic (floor division, truncated results)
    #[arg(long)]
    intonly: bool,

    /// Read the request from a JSON file instead of prompting
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Write the CSV here, overriding the prompted or configured name
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Print the outcome as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Prompt(#[from] PromptError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Error during sequence generation: {0}")]
    Generation(#[from] GenerationError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Serialize)]
struct Report<'a> {
    mode: NumericMode,
    operation: String,
    output: &'a Path,
    #[serde(flatten)]
    outcome: &'a Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    advisory: Option<String>,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => env::var(LOG_ENV)
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(log_level(verbose))
        .with_target(false)
        .init();
}

/// Get the job from a request file or by prompting
///
/// Prompts go to `err` when the report is JSON, keeping `out` parseable.
fn read_job<R: BufRead, O: Write, E: Write>(
    args: &Arguments,
    input: R,
    out: &mut O,
    err: &mut E,
) -> Result<Job, CliError> {
    let mode = if args.intonly {
        NumericMode::Integer
    } else {
        NumericMode::Real
    };

    let mut job = match &args.request {
        Some(path) => load_job(path, args.intonly.then_some(NumericMode::Integer))?,
        None if args.json => prompt_job(input, err, mode)?,
        None => prompt_job(input, out, mode)?,
    };
    if let Some(output) = &args.output {
        job.output = csv_filename(output);
    }
    Ok(job)
}

fn format_sequence(outcome: &Outcome) -> String {
    let values: Vec<String> = outcome.sequence.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(", "))
}

fn run<R: BufRead, O: Write, E: Write>(
    args: &Arguments,
    input: R,
    out: &mut O,
    err: &mut E,
) -> Result<(), CliError> {
    let job = read_job(args, input, out, err)?;
    let outcome = generate(&job.request)?;
    info!(state = ?outcome.state(), len = outcome.sequence.len(), "generation finished");

    if args.json {
        let report = Report {
            mode: job.request.mode(),
            operation: job.request.operation().to_string(),
            output: &job.output,
            outcome: &outcome,
            advisory: outcome.advisory(),
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        if let Some(advisory) = outcome.advisory() {
            writeln!(out, "{}", advisory)?;
        }
        writeln!(out, "\nGenerated Sequence:")?;
        writeln!(out, "{}", format_sequence(&outcome))?;
    }

    save_to_csv(&job.output, &outcome.sequence).map_err(|source| CliError::Write {
        path: job.output.clone(),
        source,
    })?;
    if !args.json {
        writeln!(out, "Sequence successfully saved to {}", job.output.display())?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_logging(args.verbose);

    if args.request.is_none() && !args.json {
        println!("--- Mathematical Sequence Generator ---");
        if args.intonly {
            println!("Integer mode: results are truncated and division floors.");
        }
    }

    let stdin = io::stdin();
    let result = run(&args, stdin.lock(), &mut io::stdout(), &mut io::stderr());
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
