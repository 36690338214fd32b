//! Image decoding with content-based format detection.
//!
//! Besides pixels, the decoder captures any ICC profile and EXIF block so the
//! preprocessor can decide explicitly what to drop.

use image::{ColorType, DynamicImage, GenericImageView, ImageDecoder as _, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// Decodes source files into [`DecodedImage`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

/// A decoded image, owned by the conversion that produced it.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Original file size in bytes
    pub file_size: u64,
    /// Embedded ICC color profile, if any
    pub icc_profile: Option<Vec<u8>>,
    /// Raw EXIF block, if any
    pub exif: Option<Vec<u8>>,
}

impl DecodedImage {
    /// Wrap an in-memory image with no source metadata.
    pub fn from_image(image: DynamicImage, format: ImageFormat) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            format,
            width,
            height,
            file_size: 0,
            icc_profile: None,
            exif: None,
        }
    }

    /// Current color mode of the pixel buffer.
    pub fn color_mode(&self) -> ColorType {
        self.image.color()
    }

    /// Whether any metadata block is still attached.
    pub fn has_metadata(&self) -> bool {
        self.icc_profile.is_some() || self.exif.is_some()
    }

    /// Replace the pixel data, keeping format and metadata.
    pub(crate) fn with_image(mut self, image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        self.image = image;
        self.width = width;
        self.height = height;
        self
    }
}

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Read and decode a file from disk.
    pub fn decode(&self, path: &Path) -> PipelineResult<DecodedImage> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        })?;
        self.decode_from_bytes(bytes, path)
    }

    /// Decode an image from an in-memory byte buffer.
    ///
    /// The format is sniffed from the content, so a PNG named `.jpg` still
    /// decodes as PNG.
    pub fn decode_from_bytes(&self, bytes: Vec<u8>, path: &Path) -> PipelineResult<DecodedImage> {
        let file_size = bytes.len() as u64;
        let decode_err = |message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            message,
        };

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
        let format = reader
            .format()
            .ok_or_else(|| decode_err("Unrecognized image format".to_string()))?;

        let mut decoder = reader
            .into_decoder()
            .map_err(|e| decode_err(e.to_string()))?;
        // Metadata is best effort: a broken profile must not fail the decode.
        let icc_profile = decoder.icc_profile().ok().flatten();
        let exif = decoder.exif_metadata().ok().flatten();

        let image = DynamicImage::from_decoder(decoder).map_err(|e| decode_err(e.to_string()))?;
        let (width, height) = image.dimensions();

        tracing::trace!(
            "Decoded {:?}: {}x{} {:?} ({} bytes, icc={}, exif={})",
            path,
            width,
            height,
            image.color(),
            file_size,
            icc_profile.is_some(),
            exif.is_some()
        );

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
            icc_profile,
            exif,
        })
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
