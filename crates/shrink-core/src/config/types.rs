//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of files converted concurrently
    pub parallel_workers: usize,

    /// Input extensions eligible for conversion
    pub supported_formats: Vec<String>,

    /// Output format extension; inputs already in it are skipped
    pub target_format: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec!["png".to_string(), "jpg".to_string()],
            target_format: "webp".to_string(),
        }
    }
}

impl ProcessingConfig {
    /// Whether `ext` (lower-cased, no dot) is a convertible input.
    pub fn is_supported(&self, ext: &str) -> bool {
        self.supported_formats
            .iter()
            .any(|fmt| fmt.eq_ignore_ascii_case(ext))
    }

    /// Whether `ext` is already the output format.
    pub fn is_target(&self, ext: &str) -> bool {
        self.target_format.eq_ignore_ascii_case(ext)
    }
}

/// Pipeline settings for backpressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max progress events buffered between the runner and its consumer
    pub buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { buffer_size: 100 }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum input file size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
        }
    }
}

/// Entropy-driven compression policy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Scores strictly below this are encoded losslessly
    pub entropy_threshold: f64,

    /// Quality used for lossy encodes (0-100)
    pub lossy_quality: u8,

    /// libwebp effort, 0 (fast) to 6 (smallest output)
    pub method: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            entropy_threshold: 4.0,
            lossy_quality: 75,
            method: 6,
        }
    }
}

/// Normalization applied before analysis and encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Longest allowed edge in pixels; larger images are downscaled
    pub max_dimension: u32,

    /// Drop the alpha channel (no blending) so output is opaque RGB
    pub flatten_alpha: bool,

    /// Drop ICC profile and EXIF blocks before encode
    pub strip_metadata: bool,

    /// Re-encode PNG inputs in memory with best compression before processing
    pub png_prepass: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1000,
            flatten_alpha: true,
            strip_metadata: true,
            png_prepass: true,
        }
    }
}

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving converted files (supports `~`)
    pub dir: PathBuf,

    /// Log file name, created inside `dir`
    pub log_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/Downloads/Converted_Images"),
            log_file: "log.txt".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
