//! Maps a complexity score to an encode configuration.

use crate::config::CompressionConfig;
use crate::types::{ComplexityScore, CompressionDecision};

/// Threshold policy: simple images go lossless, complex ones go lossy.
#[derive(Debug, Clone)]
pub struct CompressionPolicy {
    config: CompressionConfig,
}

impl CompressionPolicy {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    /// Choose how to encode an image with the given score.
    ///
    /// Scores strictly below the threshold are encoded losslessly.
    pub fn decide(&self, score: ComplexityScore) -> CompressionDecision {
        if score.value() < self.config.entropy_threshold {
            CompressionDecision::lossless()
        } else {
            CompressionDecision::lossy(self.config.lossy_quality)
        }
    }

    pub fn threshold(&self) -> f64 {
        self.config.entropy_threshold
    }
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::new(CompressionConfig::default())
    }
}
