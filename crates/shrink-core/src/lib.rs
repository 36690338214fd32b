//! Shrink Core - adaptive batch recompression of PNG and JPEG images to WebP.
//!
//! Each image is measured before encoding: the Shannon entropy of its
//! luminance histogram decides between lossless WebP (simple graphics,
//! screenshots, flat artwork) and lossy WebP at a fixed quality (photographs).
//!
//! ```text
//! Validate → Decode → Preprocess → Entropy → Policy → WebP → Atomic write
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shrink_core::{BatchRunner, CancelFlag, Config, ConversionPipeline, FileDiscovery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let files = FileDiscovery::new(config.processing.clone()).discover_all(&["./photos"]);
//!
//!     let pipeline = Arc::new(ConversionPipeline::new(&config));
//!     let runner = BatchRunner::new(pipeline, &config);
//!     let stats = runner
//!         .run(files, &CancelFlag::new(), |_event| async {})
//!         .await?;
//!
//!     println!("{stats}");
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenient access
pub use config::Config;
pub use error::{BatchError, ConfigError, PipelineError, PipelineResult};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{
    BatchEvent, BatchHandle, BatchRunner, BatchState, CancelFlag, ConversionPipeline,
    FileDiscovery,
};
pub use types::{
    BatchStats, ComplexityScore, CompressionDecision, ConversionOutcome, ConversionReport,
    FailureKind, InputFile,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
