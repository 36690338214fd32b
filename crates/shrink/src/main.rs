//! Shrink CLI - batch-convert PNG and JPEG images to adaptively compressed WebP.
//!
//! Each image is scored by luminance entropy: simple graphics are encoded
//! losslessly, photographs lossy at a fixed quality. Results land in a single
//! output directory together with a `log.txt` of the run.
//!
//! # Usage
//!
//! ```bash
//! # Convert a few files
//! shrink convert logo.png holiday.jpg
//!
//! # Convert a directory tree with 8 workers and keep a JSONL report
//! shrink convert ./photos --parallel 8 --report report.jsonl --format jsonl
//!
//! # View configuration
//! shrink config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Shrink - adaptive PNG/JPEG to WebP recompression.
#[derive(Parser, Debug)]
#[command(name = "shrink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert images to WebP
    Convert(cli::convert::ConvertArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let mut config = match shrink_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `shrink config path`."
            );
            shrink_core::Config::default()
        }
    };

    // Only conversions write a log file, next to their output.
    let log_file = match &cli.command {
        Commands::Convert(args) => {
            args.apply_overrides(&mut config);
            Some(config.log_path())
        }
        Commands::Config(_) => None,
    };
    let _log_guard = logging::init_from_config(&config, cli.verbose, cli.json_logs, log_file);

    tracing::debug!("Shrink v{}", shrink_core::VERSION);

    match cli.command {
        Commands::Convert(args) => cli::convert::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
