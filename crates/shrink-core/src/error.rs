//! Error types for the shrink recompression pipeline.
//!
//! Per-file errors ([`PipelineError`]) never escape a conversion: the pipeline
//! turns them into [`crate::types::ConversionOutcome::Failed`]. Only
//! [`BatchError`] aborts a whole run.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::FailureKind;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors that abort a batch before any file is touched.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The output directory could not be created
    #[error("Cannot create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory exists but cannot be written to
    #[error("Output directory {path} is not writable: {source}")]
    OutputDirNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output path exists and is not a directory
    #[error("Output path {0} is not a directory")]
    NotADirectory(PathBuf),

    /// The task driving the batch panicked or was cancelled by the runtime
    #[error("Batch task aborted: {0}")]
    Aborted(String),
}

/// Per-file conversion errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Pixel data could not be serialized to the target format
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Encoded bytes could not be written to the output directory
    #[error("Write error for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker running the conversion died
    #[error("Worker failed for {path}: {message}")]
    Worker { path: PathBuf, message: String },
}

impl PipelineError {
    /// Classify the error into the decode/encode failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::FileNotFound(_) | Self::FileTooLarge { .. } | Self::Decode { .. } => {
                FailureKind::Decode
            }
            Self::Encode { .. } | Self::Write { .. } | Self::Worker { .. } => FailureKind::Encode,
        }
    }
}

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
