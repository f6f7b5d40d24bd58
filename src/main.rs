//! Prismfall CLI - headless matches and configuration tooling.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Prismfall - turn-based prism tactics rule engine
#[derive(Parser, Debug)]
#[command(name = "prismfall")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Log verbosity when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a full match with the AI playing both sides
    Simulate {
        /// Random seed (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// JSON config file (default: built-in settings)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Maximum ticks before giving up (default: 20000)
        #[arg(short = 't', long, default_value = "20000")]
        max_ticks: u32,

        /// Seconds per tick (default: 0.25)
        #[arg(long, default_value = "0.25")]
        dt: f32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Print every match event as it is drained
        #[arg(short, long)]
        events: bool,
    },

    /// Print the default configuration, or validate a config file
    Config {
        /// Config file to validate and print in normalized form
        #[arg(long)]
        check: Option<std::path::PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Commands::Simulate {
            seed,
            config,
            max_ticks,
            dt,
            format,
            events,
        } => cli::simulate::execute(seed, config.as_deref(), max_ticks, dt, format, events),

        Commands::Config { check } => cli::config::execute(check.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
