//! The `shrink convert` command.

mod batch;

use clap::{Args, ValueEnum};
use shrink_core::{BatchStats, Config, FileDiscovery, OutputFormat};
use std::path::PathBuf;

use batch::run_batch;

/// Report file formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Single JSON array
    #[default]
    Json,
    /// One JSON object per line, summary last
    Jsonl,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Arguments for the `convert` command.
#[derive(Args, Debug, Default)]
pub struct ConvertArgs {
    /// Image files or directories to convert
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Directory receiving the WebP files and log.txt
    #[arg(short, long, env = "SHRINK_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of files converted concurrently
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Entropy below which images are encoded losslessly (0-8)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Quality for lossy encodes (0-100)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Longest allowed edge in pixels
    #[arg(long)]
    pub max_dimension: Option<u32>,

    /// Keep the alpha channel instead of dropping it
    #[arg(long)]
    pub keep_alpha: bool,

    /// Write a per-file report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ReportFormat,
}

impl ConvertArgs {
    /// Layer command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(parallel) = self.parallel {
            config.processing.parallel_workers = parallel;
        }
        if let Some(threshold) = self.threshold {
            config.compression.entropy_threshold = threshold;
        }
        if let Some(quality) = self.quality {
            config.compression.lossy_quality = quality;
        }
        if let Some(max_dimension) = self.max_dimension {
            config.preprocess.max_dimension = max_dimension;
        }
        if self.keep_alpha {
            config.preprocess.flatten_alpha = false;
        }
    }
}

/// Execute the convert command. `config` already carries the overrides.
pub async fn execute(args: ConvertArgs, config: Config) -> anyhow::Result<()> {
    let stats = convert(&args, &config).await?;
    println!("{stats}");
    Ok(())
}

/// Validate, discover and run. An empty discovery is a completed zero batch.
async fn convert(args: &ConvertArgs, config: &Config) -> anyhow::Result<BatchStats> {
    if let Err(e) = config.validate() {
        anyhow::bail!("{e}\n\n  Hint: check the command-line overrides and `shrink config show`.");
    }

    let files = FileDiscovery::new(config.processing.clone()).discover_all(&args.paths);
    if files.is_empty() {
        tracing::warn!("No image files found in {:?}", args.paths);
        return Ok(BatchStats::default());
    }
    tracing::info!("Found {} file(s) to convert", files.len());

    run_batch(config, args, files).await
}
