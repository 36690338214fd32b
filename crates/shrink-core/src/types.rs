//! Core data types for the shrink recompression pipeline.
//!
//! These types describe a batch from input to summary: the files handed in by
//! the caller, the per-file decision and outcome, and the aggregated stats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A file handed to the pipeline by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Path as supplied by the caller
    pub path: PathBuf,

    /// Lower-cased extension without the dot (empty if none)
    pub extension: String,
}

impl InputFile {
    /// Build an input file, deriving the extension from the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        Self { path, extension }
    }

    /// File stem used to name the converted output.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
    }
}

impl From<&Path> for InputFile {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for InputFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Shannon entropy of an image's luminance histogram, in bits (0.0 to 8.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplexityScore(pub f64);

impl ComplexityScore {
    /// Score of an empty or single-valued image.
    pub const ZERO: Self = Self(0.0);

    /// Upper bound for a 256-bin histogram.
    pub const MAX: Self = Self(8.0);

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for ComplexityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// How a single image is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionDecision {
    /// Reproduce pixel data exactly
    pub lossless: bool,

    /// Encoder quality, 0..=100 (always 100 when lossless)
    pub quality: u8,
}

impl CompressionDecision {
    /// Exact reproduction.
    pub fn lossless() -> Self {
        Self {
            lossless: true,
            quality: 100,
        }
    }

    /// Lossy encode at the given quality (clamped to 100).
    pub fn lossy(quality: u8) -> Self {
        Self {
            lossless: false,
            quality: quality.min(100),
        }
    }
}

/// Which side of the pipeline a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Input could not be read or parsed as an image
    Decode,
    /// Output could not be encoded or written
    Encode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Decode => write!(f, "decode"),
            FailureKind::Encode => write!(f, "encode"),
        }
    }
}

/// Result of running one file through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// File was re-encoded and written
    Converted {
        bytes_before: u64,
        bytes_after: u64,
        decision: CompressionDecision,
        score: ComplexityScore,
        output_path: PathBuf,
    },

    /// File was excluded by routing; never decoded
    Skipped { reason: String },

    /// File could not be converted
    Failed { kind: FailureKind, error: String },
}

impl ConversionOutcome {
    /// Short tag used in log lines and reports.
    pub fn tag(&self) -> &'static str {
        match self {
            ConversionOutcome::Converted { .. } => "converted",
            ConversionOutcome::Skipped { .. } => "skipped",
            ConversionOutcome::Failed { .. } => "failed",
        }
    }

    /// Bytes saved by this file (negative if the output grew).
    pub fn bytes_saved(&self) -> i64 {
        match self {
            ConversionOutcome::Converted {
                bytes_before,
                bytes_after,
                ..
            } => *bytes_before as i64 - *bytes_after as i64,
            _ => 0,
        }
    }
}

/// A per-file event delivered to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// 1-based position in the batch
    pub index: usize,

    /// The input as supplied
    pub file: InputFile,

    /// What happened to it
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

/// Aggregated statistics for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Files processed (started) in this run
    pub total: u64,

    /// Files converted
    pub succeeded: u64,

    /// Files excluded by routing
    pub skipped: u64,

    /// Files that failed to decode or encode
    pub failed: u64,

    /// Sum of `bytes_before - bytes_after` over converted files
    pub total_bytes_saved: i64,

    /// Inputs never started because the run was cancelled
    pub not_started: u64,
}

impl BatchStats {
    /// Fold one outcome into the running totals.
    pub fn record(&mut self, outcome: &ConversionOutcome) {
        self.total += 1;
        match outcome {
            ConversionOutcome::Converted { .. } => self.succeeded += 1,
            ConversionOutcome::Skipped { .. } => self.skipped += 1,
            ConversionOutcome::Failed { .. } => self.failed += 1,
        }
        self.total_bytes_saved += outcome.bytes_saved();
    }

    /// Whether every processed file landed in exactly one bucket.
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.skipped + self.failed == self.total
    }

    /// Bytes saved expressed in KiB.
    pub fn saved_kb(&self) -> f64 {
        self.total_bytes_saved as f64 / 1024.0
    }

    /// Whether the run stopped before every input was started.
    pub fn was_cancelled(&self) -> bool {
        self.not_started > 0
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Success: {}/{}\nRemoved: {:.1} KB",
            self.succeeded,
            self.total,
            self.saved_kb()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted(before: u64, after: u64) -> ConversionOutcome {
        ConversionOutcome::Converted {
            bytes_before: before,
            bytes_after: after,
            decision: CompressionDecision::lossy(75),
            score: ComplexityScore(6.5),
            output_path: PathBuf::from("out/a.webp"),
        }
    }

    #[test]
    fn test_input_file_lowercases_extension() {
        let file = InputFile::new("/photos/Holiday.JPG");
        assert_eq!(file.extension, "jpg");
        assert_eq!(file.stem(), "Holiday");
    }

    #[test]
    fn test_input_file_without_extension() {
        let file = InputFile::new("/photos/README");
        assert_eq!(file.extension, "");
    }

    #[test]
    fn test_lossless_decision_reports_quality_100() {
        let decision = CompressionDecision::lossless();
        assert!(decision.lossless);
        assert_eq!(decision.quality, 100);
    }

    #[test]
    fn test_lossy_quality_clamped() {
        assert_eq!(CompressionDecision::lossy(180).quality, 100);
    }

    #[test]
    fn test_stats_record_each_tag() {
        let mut stats = BatchStats::default();
        stats.record(&converted(10_000, 4_000));
        stats.record(&ConversionOutcome::Skipped {
            reason: "already target format".into(),
        });
        stats.record(&ConversionOutcome::Failed {
            kind: FailureKind::Decode,
            error: "bad".into(),
        });

        assert_eq!(stats.total, 3);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_bytes_saved, 6_000);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_stats_bytes_saved_not_clamped() {
        let mut stats = BatchStats::default();
        stats.record(&converted(1_000, 3_048));
        assert_eq!(stats.total_bytes_saved, -2_048);
        assert_eq!(stats.saved_kb(), -2.0);
    }

    #[test]
    fn test_stats_display_summary() {
        let stats = BatchStats {
            total: 3,
            succeeded: 2,
            skipped: 1,
            failed: 0,
            total_bytes_saved: 2_560,
            not_started: 0,
        };
        assert_eq!(stats.to_string(), "Success: 2/3\nRemoved: 2.5 KB");
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(converted(10, 5)).unwrap();
        assert_eq!(json["outcome"], "converted");
        assert_eq!(json["decision"]["quality"], 75);
        assert_eq!(json["score"], 6.5);
    }
}
