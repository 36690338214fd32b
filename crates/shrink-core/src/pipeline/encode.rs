//! WebP encoding driven by a [`CompressionDecision`].
//!
//! The libwebp picture encoder never emits EXIF, XMP or ICCP chunks, so output
//! files carry pixels only.

use image::{DynamicImage, GenericImageView};
use std::path::Path;
use webp::WebPConfig;

use crate::error::{PipelineError, PipelineResult};
use crate::types::CompressionDecision;

/// Encodes normalized images to WebP bytes.
#[derive(Debug, Clone, Copy)]
pub struct WebpEncoder {
    method: u8,
}

impl Default for WebpEncoder {
    fn default() -> Self {
        Self::new(6)
    }
}

impl WebpEncoder {
    /// `method` is the libwebp effort level, 0 (fast) to 6 (smallest).
    pub fn new(method: u8) -> Self {
        Self {
            method: method.min(6),
        }
    }

    pub fn method(&self) -> u8 {
        self.method
    }

    /// Encoder settings for one decision.
    ///
    /// Lossless encodes set `exact`, so the RGB of fully transparent pixels
    /// survives instead of being rewritten by libwebp.
    pub fn webp_config(
        &self,
        decision: CompressionDecision,
        path: &Path,
    ) -> PipelineResult<WebPConfig> {
        let mut config = WebPConfig::new().map_err(|_| PipelineError::Encode {
            path: path.to_path_buf(),
            message: "libwebp could not initialize an encoder config".to_string(),
        })?;
        config.lossless = i32::from(decision.lossless);
        config.exact = i32::from(decision.lossless);
        config.alpha_compression = i32::from(!decision.lossless);
        config.quality = f32::from(decision.quality);
        config.method = i32::from(self.method);
        Ok(config)
    }

    /// Encode `image` losslessly or at the decision's quality.
    ///
    /// RGB8 and RGBA8 buffers are passed through as-is; anything else is
    /// converted to RGB8 first.
    pub fn encode(
        &self,
        image: &DynamicImage,
        decision: CompressionDecision,
        path: &Path,
    ) -> PipelineResult<Vec<u8>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Encode {
                path: path.to_path_buf(),
                message: format!("Cannot encode empty image ({}x{})", width, height),
            });
        }

        let config = self.webp_config(decision, path)?;

        let converted;
        let encoder = match image {
            DynamicImage::ImageRgb8(rgb) => webp::Encoder::from_rgb(rgb.as_raw(), width, height),
            DynamicImage::ImageRgba8(rgba) => {
                webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            }
            other => {
                converted = other.to_rgb8();
                webp::Encoder::from_rgb(converted.as_raw(), width, height)
            }
        };

        let memory = encoder
            .encode_advanced(&config)
            .map_err(|e| PipelineError::Encode {
                path: path.to_path_buf(),
                message: format!("libwebp rejected the image: {:?}", e),
            })?;

        Ok(memory.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn pattern(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        })
    }

    #[test]
    fn test_output_is_riff_webp() {
        let img = DynamicImage::ImageRgb8(pattern(64, 48));
        let bytes = WebpEncoder::default()
            .encode(&img, CompressionDecision::lossy(75), Path::new("a.jpg"))
            .unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_lossless_reproduces_pixels() {
        let source = pattern(40, 30);
        let img = DynamicImage::ImageRgb8(source.clone());
        let bytes = WebpEncoder::default()
            .encode(&img, CompressionDecision::lossless(), Path::new("a.png"))
            .unwrap();

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::WebP).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert_eq!(decoded.to_rgb8(), source);
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let img = DynamicImage::ImageRgb8(pattern(128, 128));
        let encoder = WebpEncoder::default();
        let high = encoder
            .encode(&img, CompressionDecision::lossy(95), Path::new("a.jpg"))
            .unwrap();
        let low = encoder
            .encode(&img, CompressionDecision::lossy(20), Path::new("a.jpg"))
            .unwrap();
        assert!(low.len() <= high.len());
    }

    #[test]
    fn test_rgba_and_gray_inputs_encode() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 128])));
        let gray = DynamicImage::new_luma8(8, 8);
        let encoder = WebpEncoder::default();

        for img in [rgba, gray] {
            let bytes = encoder
                .encode(&img, CompressionDecision::lossless(), Path::new("a.png"))
                .unwrap();
            assert_eq!(&bytes[0..4], b"RIFF");
        }
    }

    #[test]
    fn test_empty_image_fails_as_encode_error() {
        let img = DynamicImage::new_rgb8(0, 0);
        let err = WebpEncoder::default()
            .encode(&img, CompressionDecision::lossless(), Path::new("a.png"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encode { .. }));
    }

    #[test]
    fn test_lossless_keeps_transparent_pixels_exact() {
        let source = RgbaImage::from_fn(16, 16, |x, y| {
            if x < 8 {
                Rgba([(y * 16) as u8, 0, 200, 0])
            } else {
                Rgba([x as u8 * 10, y as u8 * 10, 50, 255])
            }
        });
        let img = DynamicImage::ImageRgba8(source.clone());
        let bytes = WebpEncoder::default()
            .encode(&img, CompressionDecision::lossless(), Path::new("a.png"))
            .unwrap();

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::WebP).unwrap();
        let back = decoded.to_rgba8();
        for (x, y, pixel) in source.enumerate_pixels() {
            assert_eq!(back.get_pixel(x, y), pixel, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_config_carries_method_and_mode() {
        let path = Path::new("a.png");

        let config = WebpEncoder::default()
            .webp_config(CompressionDecision::lossless(), path)
            .unwrap();
        assert_eq!(config.method, 6);
        assert_eq!(config.lossless, 1);
        assert_eq!(config.exact, 1);
        assert_eq!(config.quality, 100.0);

        let config = WebpEncoder::new(2)
            .webp_config(CompressionDecision::lossy(75), path)
            .unwrap();
        assert_eq!(config.method, 2);
        assert_eq!(config.lossless, 0);
        assert_eq!(config.quality, 75.0);
    }

    #[test]
    fn test_method_clamped_to_6() {
        assert_eq!(WebpEncoder::new(9).method(), 6);
    }
}
