use std::path::PathBuf;

use clap::Parser;
use gitweave_core::error::{ConfigError, GitweaveError, InputError, PredicateError};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "gitweave",
    version,
    about = "Filter git commit logs and export author/file networks"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Path to a gitweave.toml config file
    #[arg(long, global = true, env = "GITWEAVE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0: success
///   1: general/unknown error
///   2: configuration error
///   3: bad input (unreadable log, malformed records, bad filter or preset)
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.is::<ConfigError>() {
            return 2;
        }
        if cause.is::<InputError>()
            || cause.is::<PredicateError>()
            || cause.is::<serde_json::Error>()
        {
            return 3;
        }
        if let Some(e) = cause.downcast_ref::<GitweaveError>() {
            return match e {
                GitweaveError::Config(_) => 2,
                GitweaveError::Input(_) | GitweaveError::Predicate(_) | GitweaveError::Json(_) => 3,
                GitweaveError::Export(_) => 1,
            };
        }
    }

    let lower = format!("{err:#}").to_lowercase();
    if lower.contains("cannot read input") {
        3
    } else if lower.contains("config") {
        2
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command, cli.config.as_deref()) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
