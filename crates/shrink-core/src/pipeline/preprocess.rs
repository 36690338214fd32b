//! Normalization applied between decode and analysis.
//!
//! Three independent steps, run in order by [`ImagePreprocessor::process`]:
//!
//! 1. color-mode normalization (alpha is discarded, never blended)
//! 2. bounding-box downscale with Lanczos3
//! 3. metadata stripping
//!
//! Dropping alpha without compositing onto a background is intentionally
//! lossy: transparent regions come out with whatever color their pixels
//! carried.

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use std::path::Path;

use crate::config::PreprocessConfig;
use crate::error::{PipelineError, PipelineResult};

use super::decode::DecodedImage;

/// Normalizes decoded images before analysis and encode.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Run every enabled step.
    pub fn process(&self, decoded: DecodedImage) -> DecodedImage {
        let decoded = self.normalize_color(decoded);
        let decoded = self.bound_dimensions(decoded);
        if self.config.strip_metadata {
            strip_metadata(decoded)
        } else {
            decoded
        }
    }

    /// Bring the pixel buffer to an 8-bit mode the WebP encoder accepts.
    ///
    /// With `flatten_alpha` set, any alpha channel is dropped and the result is
    /// RGB8. Otherwise alpha modes become RGBA8. 8-bit gray and RGB are kept.
    pub fn normalize_color(&self, decoded: DecodedImage) -> DecodedImage {
        let color = decoded.color_mode();
        let normalized = if color.has_alpha() {
            if self.config.flatten_alpha {
                DynamicImage::ImageRgb8(decoded.image.to_rgb8())
            } else if color == ColorType::Rgba8 {
                return decoded;
            } else {
                DynamicImage::ImageRgba8(decoded.image.to_rgba8())
            }
        } else {
            match color {
                ColorType::L8 | ColorType::Rgb8 => return decoded,
                _ => DynamicImage::ImageRgb8(decoded.image.to_rgb8()),
            }
        };

        tracing::trace!("Color mode {:?} -> {:?}", color, normalized.color());
        decoded.with_image(normalized)
    }

    /// Downscale so neither side exceeds `max_dimension`. Never upscales.
    pub fn bound_dimensions(&self, decoded: DecodedImage) -> DecodedImage {
        let max = self.config.max_dimension;
        if decoded.width <= max && decoded.height <= max {
            return decoded;
        }

        let (from_w, from_h) = (decoded.width, decoded.height);
        // resize() keeps the aspect ratio and fits the larger side to `max`
        let resized = decoded.image.resize(max, max, FilterType::Lanczos3);
        let decoded = decoded.with_image(resized);
        tracing::trace!(
            "Resized {}x{} -> {}x{}",
            from_w,
            from_h,
            decoded.width,
            decoded.height
        );
        decoded
    }

    /// Re-encode a PNG source with maximum compression in memory and decode it
    /// back.
    ///
    /// The buffer is owned by this call, so concurrent conversions never share
    /// scratch storage. Metadata captured at decode is carried over.
    pub fn png_prepass(&self, decoded: DecodedImage, path: &Path) -> PipelineResult<DecodedImage> {
        if !self.config.png_prepass || decoded.format != ImageFormat::Png {
            return Ok(decoded);
        }

        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);
        decoded
            .image
            .write_with_encoder(encoder)
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("PNG optimization pass failed: {}", e),
            })?;

        let optimized = image::load_from_memory_with_format(&buffer, ImageFormat::Png).map_err(
            |e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("PNG optimization pass produced unreadable data: {}", e),
            },
        )?;

        tracing::trace!(
            "PNG pre-pass for {:?}: {} -> {} bytes",
            path,
            decoded.file_size,
            buffer.len()
        );
        Ok(decoded.with_image(optimized))
    }
}

/// Drop every captured metadata block.
pub fn strip_metadata(mut decoded: DecodedImage) -> DecodedImage {
    decoded.icc_profile = None;
    decoded.exif = None;
    decoded
}
