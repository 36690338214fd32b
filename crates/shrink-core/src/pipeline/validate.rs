//! Cheap checks run before a full decode.
//!
//! A file that fails here never reaches the decoder; the pipeline reports it
//! as a decode failure.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Bytes needed to recognize every signature below.
const HEADER_LEN: usize = 12;

/// Validates input files before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check existence, size limit, and magic bytes. Returns the file size.
    pub fn validate(&self, path: &Path) -> PipelineResult<u64> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::FileNotFound(path.to_path_buf())
            } else {
                PipelineError::Decode {
                    path: path.to_path_buf(),
                    message: format!("Cannot read metadata: {}", e),
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Not a regular file".to_string(),
            });
        }

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let header = read_header(path)?;
        if !is_image_header(&header) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(metadata.len())
    }
}

fn read_header(path: &Path) -> PipelineResult<Vec<u8>> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: format!("Cannot open file: {}", e),
    })?;

    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read header: {}", e),
        })?;

    if header.len() < 4 {
        return Err(PipelineError::Decode {
            path: path.to_path_buf(),
            message: "File too small to be a valid image".to_string(),
        });
    }
    Ok(header)
}

/// Check whether the leading bytes match a raster format the decoder handles.
fn is_image_header(header: &[u8]) -> bool {
    match header {
        // JPEG
        [0xFF, 0xD8, 0xFF, ..] => true,
        // PNG
        [0x89, b'P', b'N', b'G', ..] => true,
        // GIF87a / GIF89a
        [b'G', b'I', b'F', b'8', ..] => true,
        // WebP: RIFF....WEBP
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => true,
        // BMP
        [b'B', b'M', ..] => true,
        // TIFF, little- and big-endian, version 42
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
        _ => false,
    }
}
