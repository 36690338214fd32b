//! Pipeline orchestration for one file.
//!
//! ```text
//! route → validate → decode → PNG pre-pass → preprocess → analyze → decide → encode → write
//! ```
//!
//! [`ConversionPipeline::convert`] is total: every error is folded into
//! [`ConversionOutcome::Failed`] and exactly one log event is emitted per call.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{Config, ProcessingConfig};
use crate::error::PipelineResult;
use crate::types::{ConversionOutcome, InputFile};

use super::analyze::ComplexityAnalyzer;
use super::decode::{format_to_string, ImageDecoder};
use super::encode::WebpEncoder;
use super::policy::CompressionPolicy;
use super::preprocess::ImagePreprocessor;
use super::validate::Validator;
use super::write::OutputDirectory;

/// Skip reason for inputs already in the output format.
pub const SKIP_ALREADY_TARGET: &str = "already target format";

/// Skip reason for inputs outside the supported set.
pub const SKIP_UNSUPPORTED: &str = "unsupported format";

/// Where a file goes, decided from its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Decode and convert
    Convert,
    /// Already in the target format
    AlreadyTarget,
    /// Not a supported input
    Unsupported,
}

/// Converts single files to WebP.
pub struct ConversionPipeline {
    processing: ProcessingConfig,
    validator: Validator,
    decoder: ImageDecoder,
    preprocessor: ImagePreprocessor,
    analyzer: ComplexityAnalyzer,
    policy: CompressionPolicy,
    encoder: WebpEncoder,
    output: OutputDirectory,
}

impl ConversionPipeline {
    /// Create a pipeline writing to the configured output directory.
    pub fn new(config: &Config) -> Self {
        Self::with_output_dir(config, config.output_dir())
    }

    /// Create a pipeline writing to an explicit directory.
    pub fn with_output_dir(config: &Config, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            processing: config.processing.clone(),
            validator: Validator::new(config.limits.clone()),
            decoder: ImageDecoder::new(),
            preprocessor: ImagePreprocessor::new(config.preprocess.clone()),
            analyzer: ComplexityAnalyzer::new(),
            policy: CompressionPolicy::new(config.compression.clone()),
            encoder: WebpEncoder::new(config.compression.method),
            output: OutputDirectory::new(output_dir),
        }
    }

    pub fn output(&self) -> &OutputDirectory {
        &self.output
    }

    /// Classify a file by extension. Never touches the file.
    pub fn route(&self, file: &InputFile) -> Route {
        if self.processing.is_target(&file.extension) {
            Route::AlreadyTarget
        } else if self.processing.is_supported(&file.extension) {
            Route::Convert
        } else {
            Route::Unsupported
        }
    }

    /// Run one file through the pipeline.
    pub fn convert(&self, file: &InputFile) -> ConversionOutcome {
        let outcome = match self.route(file) {
            Route::AlreadyTarget => ConversionOutcome::Skipped {
                reason: SKIP_ALREADY_TARGET.to_string(),
            },
            Route::Unsupported => ConversionOutcome::Skipped {
                reason: SKIP_UNSUPPORTED.to_string(),
            },
            Route::Convert => match self.try_convert(file) {
                Ok(outcome) => outcome,
                Err(e) => ConversionOutcome::Failed {
                    kind: e.kind(),
                    error: e.to_string(),
                },
            },
        };

        log_outcome(&file.path, &outcome);
        outcome
    }

    fn try_convert(&self, file: &InputFile) -> PipelineResult<ConversionOutcome> {
        let start = Instant::now();
        let path = file.path.as_path();

        let bytes_before = self.validator.validate(path)?;

        let decoded = self.decoder.decode(path)?;
        let source_format = format_to_string(decoded.format);
        let source_dims = (decoded.width, decoded.height);
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let decoded = self.preprocessor.png_prepass(decoded, path)?;
        let decoded = self.preprocessor.process(decoded);
        tracing::trace!("  Preprocess: {:?}", start.elapsed());

        let score = self.analyzer.analyze(&decoded);
        let decision = self.policy.decide(score);
        tracing::debug!(
            "{:?}: {} {}x{} -> {}x{}, entropy {} -> lossless={} quality={}",
            path,
            source_format,
            source_dims.0,
            source_dims.1,
            decoded.width,
            decoded.height,
            score,
            decision.lossless,
            decision.quality
        );

        let encoded = self.encoder.encode(&decoded.image, decision, path)?;
        drop(decoded);
        tracing::trace!("  Encode: {:?}", start.elapsed());

        let output_path = self
            .output
            .target_path(file.stem(), &self.processing.target_format);
        let bytes_after = self.output.write_atomic(&output_path, &encoded)?;
        tracing::trace!("  Total: {:?}", start.elapsed());

        Ok(ConversionOutcome::Converted {
            bytes_before,
            bytes_after,
            decision,
            score,
            output_path,
        })
    }
}

/// Emit the per-file log event.
fn log_outcome(path: &Path, outcome: &ConversionOutcome) {
    let file = path.display().to_string();
    match outcome {
        ConversionOutcome::Converted {
            bytes_before,
            bytes_after,
            decision,
            score,
            output_path,
        } => {
            tracing::info!(
                file = %file,
                outcome = outcome.tag(),
                lossless = decision.lossless,
                quality = decision.quality,
                entropy = score.value(),
                bytes_before,
                bytes_after,
                "Converted {} to {} (quality={}, lossless={}, original={:.1}KB, output={:.1}KB, saved={:.1}KB)",
                file,
                output_path.display(),
                decision.quality,
                decision.lossless,
                *bytes_before as f64 / 1024.0,
                *bytes_after as f64 / 1024.0,
                outcome.bytes_saved() as f64 / 1024.0
            );
        }
        ConversionOutcome::Skipped { reason } if reason == SKIP_ALREADY_TARGET => {
            tracing::info!(
                file = %file,
                outcome = outcome.tag(),
                "Skipped {} ({})",
                file,
                reason
            );
        }
        ConversionOutcome::Skipped { reason } => {
            tracing::warn!(
                file = %file,
                outcome = outcome.tag(),
                "Skipped {} ({})",
                file,
                reason
            );
        }
        ConversionOutcome::Failed { kind, error } => {
            tracing::error!(
                file = %file,
                outcome = outcome.tag(),
                stage = %kind,
                "Failed to convert {}: {}",
                file,
                error
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EventCapture;
    use crate::types::{CompressionDecision, FailureKind};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use tracing::Level;

    struct Fixture {
        input: tempfile::TempDir,
        output: tempfile::TempDir,
        pipeline: ConversionPipeline,
    }

    fn fixture() -> Fixture {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let pipeline = ConversionPipeline::with_output_dir(&Config::default(), output.path());
        Fixture {
            input,
            output,
            pipeline,
        }
    }

    fn save(dir: &Path, name: &str, img: DynamicImage, format: ImageFormat) -> InputFile {
        let path = dir.join(name);
        img.save_with_format(&path, format).unwrap();
        InputFile::new(path)
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = ((x + 2 * y) % 256) as u8;
            Rgb([v, v.wrapping_add(40), 255 - v])
        }))
    }

    #[test]
    fn test_route_by_extension() {
        let f = fixture();
        assert_eq!(f.pipeline.route(&InputFile::new("a.webp")), Route::AlreadyTarget);
        assert_eq!(f.pipeline.route(&InputFile::new("a.WEBP")), Route::AlreadyTarget);
        assert_eq!(f.pipeline.route(&InputFile::new("a.png")), Route::Convert);
        assert_eq!(f.pipeline.route(&InputFile::new("a.JPG")), Route::Convert);
        assert_eq!(f.pipeline.route(&InputFile::new("a.gif")), Route::Unsupported);
        assert_eq!(f.pipeline.route(&InputFile::new("README")), Route::Unsupported);
    }

    #[test]
    fn test_jpeg_extension_unsupported_by_default() {
        let f = fixture();
        assert_eq!(f.pipeline.route(&InputFile::new("/x/a.jpeg")), Route::Unsupported);
        assert_eq!(
            f.pipeline.convert(&InputFile::new("/x/a.jpeg")),
            ConversionOutcome::Skipped {
                reason: SKIP_UNSUPPORTED.to_string()
            }
        );

        let mut config = Config::default();
        config.processing.supported_formats.push("jpeg".to_string());
        let pipeline = ConversionPipeline::with_output_dir(&config, f.output.path());
        assert_eq!(pipeline.route(&InputFile::new("/x/a.jpeg")), Route::Convert);
    }

    #[test]
    fn test_configured_method_reaches_encoder() {
        let output = tempfile::tempdir().unwrap();
        assert_eq!(fixture().pipeline.encoder.method(), 6);

        let mut config = Config::default();
        config.compression.method = 3;
        let pipeline = ConversionPipeline::with_output_dir(&config, output.path());
        assert_eq!(pipeline.encoder.method(), 3);
    }

    #[test]
    fn test_one_structured_event_per_file() {
        let f = fixture();
        let input = save(
            f.input.path(),
            "flat.png",
            DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([10, 20, 30]))),
            ImageFormat::Png,
        );
        let broken = f.input.path().join("broken.jpg");
        std::fs::write(&broken, b"\xFF\xD8\xFF\xE0 not really").unwrap();

        let capture = EventCapture::default();
        let (converted, _, _) = tracing::subscriber::with_default(capture.subscriber(), || {
            (
                f.pipeline.convert(&input),
                f.pipeline.convert(&InputFile::new("/nowhere/notes.txt")),
                f.pipeline.convert(&InputFile::new(&broken)),
            )
        });

        let events = capture.with_field("outcome");
        assert_eq!(events.len(), 3);

        let ConversionOutcome::Converted {
            bytes_before,
            bytes_after,
            ..
        } = converted
        else {
            panic!("flat png should convert");
        };
        let ok = &events[0];
        assert_eq!(ok.level, Level::INFO);
        assert_eq!(ok.field("file"), Some(input.path.display().to_string().as_str()));
        assert_eq!(ok.field("outcome"), Some("converted"));
        assert_eq!(ok.field("lossless"), Some("true"));
        assert_eq!(ok.field("quality"), Some("100"));
        assert_eq!(ok.field("bytes_before"), Some(bytes_before.to_string().as_str()));
        assert_eq!(ok.field("bytes_after"), Some(bytes_after.to_string().as_str()));

        assert_eq!(events[1].level, Level::WARN);
        assert_eq!(events[1].field("outcome"), Some("skipped"));
        assert_eq!(events[2].level, Level::ERROR);
        assert_eq!(events[2].field("outcome"), Some("failed"));
        assert_eq!(events[2].field("stage"), Some("decode"));
    }

    #[test]
    fn test_target_extension_skipped_without_reading() {
        let f = fixture();
        // Does not exist and is not an image: still a routing skip
        let outcome = f.pipeline.convert(&InputFile::new("/nowhere/garbage.webp"));
        assert_eq!(
            outcome,
            ConversionOutcome::Skipped {
                reason: SKIP_ALREADY_TARGET.to_string()
            }
        );
    }

    #[test]
    fn test_unsupported_extension_skipped() {
        let f = fixture();
        let outcome = f.pipeline.convert(&InputFile::new("/nowhere/notes.txt"));
        assert_eq!(
            outcome,
            ConversionOutcome::Skipped {
                reason: SKIP_UNSUPPORTED.to_string()
            }
        );
    }

    #[test]
    fn test_flat_png_converted_losslessly() {
        let f = fixture();
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 120, Rgb([30, 60, 90])));
        let input = save(f.input.path(), "logo.png", flat, ImageFormat::Png);

        match f.pipeline.convert(&input) {
            ConversionOutcome::Converted {
                decision,
                score,
                output_path,
                bytes_before,
                bytes_after,
            } => {
                assert_eq!(decision, CompressionDecision::lossless());
                assert_eq!(score.value(), 0.0);
                assert_eq!(output_path, f.output.path().join("logo.webp"));
                assert!(output_path.exists());
                assert_eq!(bytes_after, std::fs::metadata(&output_path).unwrap().len());
                assert_eq!(bytes_before, std::fs::metadata(&input.path).unwrap().len());
            }
            other => panic!("expected Converted, got {:?}", other),
        }
    }

    #[test]
    fn test_gradient_jpeg_converted_lossy() {
        let f = fixture();
        let input = save(f.input.path(), "photo.jpg", gradient(512, 256), ImageFormat::Jpeg);

        match f.pipeline.convert(&input) {
            ConversionOutcome::Converted { decision, score, .. } => {
                assert!(score.value() >= 4.0, "entropy {}", score);
                assert_eq!(decision, CompressionDecision::lossy(75));
            }
            other => panic!("expected Converted, got {:?}", other),
        }
    }

    #[test]
    fn test_large_input_bounded() {
        let f = fixture();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1600, 800, Rgba([5, 5, 5, 10])));
        let input = save(f.input.path(), "wide.png", img, ImageFormat::Png);

        let output_path = match f.pipeline.convert(&input) {
            ConversionOutcome::Converted { output_path, .. } => output_path,
            other => panic!("expected Converted, got {:?}", other),
        };
        let written = image::open(&output_path).unwrap();
        assert_eq!((written.width(), written.height()), (1000, 500));
    }

    #[test]
    fn test_corrupt_file_fails_as_decode() {
        let f = fixture();
        let path = f.input.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();

        match f.pipeline.convert(&InputFile::new(path)) {
            ConversionOutcome::Failed { kind, error } => {
                assert_eq!(kind, FailureKind::Decode);
                assert!(error.contains("broken.png"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_fails() {
        let f = fixture();
        let outcome = f.pipeline.convert(&InputFile::new(f.input.path().join("gone.jpg")));
        assert!(matches!(
            outcome,
            ConversionOutcome::Failed {
                kind: FailureKind::Decode,
                ..
            }
        ));
    }

    #[test]
    fn test_vanished_output_dir_fails_as_encode() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_root = tempfile::tempdir().unwrap();
        let output = output_root.path().join("gone");
        let pipeline = ConversionPipeline::with_output_dir(&Config::default(), &output);

        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([1, 1, 1])));
        let input = save(input_dir.path(), "a.png", flat, ImageFormat::Png);

        match pipeline.convert(&input) {
            ConversionOutcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::Encode),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_rerun_on_output_is_skipped() {
        let f = fixture();
        let input = save(f.input.path(), "pic.jpg", gradient(64, 64), ImageFormat::Jpeg);

        let ConversionOutcome::Converted { output_path, .. } = f.pipeline.convert(&input) else {
            panic!("first pass should convert");
        };
        let second = f.pipeline.convert(&InputFile::new(output_path));
        assert_eq!(
            second,
            ConversionOutcome::Skipped {
                reason: SKIP_ALREADY_TARGET.to_string()
            }
        );
    }
}
