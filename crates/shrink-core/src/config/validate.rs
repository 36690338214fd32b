//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::types::ComplexityScore;

use super::Config;

/// 1 TiB; anything larger is a typo.
const MAX_FILE_SIZE_MB: u64 = 1024 * 1024;

/// Highest libwebp effort level.
const MAX_WEBP_METHOD: u8 = 6;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if !self.processing.target_format.eq_ignore_ascii_case("webp") {
            return Err(ConfigError::ValidationError(format!(
                "processing.target_format must be \"webp\" (got \"{}\")",
                self.processing.target_format
            )));
        }
        if self
            .processing
            .is_supported(&self.processing.target_format)
        {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not contain the target format".into(),
            ));
        }
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb > MAX_FILE_SIZE_MB {
            return Err(ConfigError::ValidationError(format!(
                "limits.max_file_size_mb must be <= {}",
                MAX_FILE_SIZE_MB
            )));
        }
        let threshold = self.compression.entropy_threshold;
        if !(ComplexityScore::ZERO.value()..=ComplexityScore::MAX.value()).contains(&threshold) {
            return Err(ConfigError::ValidationError(
                "compression.entropy_threshold must be between 0.0 and 8.0".into(),
            ));
        }
        if self.compression.lossy_quality > 100 {
            return Err(ConfigError::ValidationError(
                "compression.lossy_quality must be <= 100".into(),
            ));
        }
        if self.compression.method > MAX_WEBP_METHOD {
            return Err(ConfigError::ValidationError(format!(
                "compression.method must be between 0 and {}",
                MAX_WEBP_METHOD
            )));
        }
        if self.preprocess.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "preprocess.max_dimension must be > 0".into(),
            ));
        }
        if self.output.log_file.is_empty() {
            return Err(ConfigError::ValidationError(
                "output.log_file must not be empty".into(),
            ));
        }
        Ok(())
    }
}
