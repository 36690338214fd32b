//! Conversion pipeline stages.
//!
//! One file flows through these stages in order:
//! - **validate**: existence, size limit and magic bytes
//! - **decode**: load pixels, remember embedded metadata
//! - **preprocess**: PNG pre-pass, color normalization, bounding-box resize,
//!   metadata stripping
//! - **analyze**: luminance entropy as a complexity score
//! - **policy**: lossless vs. lossy decision from the score
//! - **encode**: WebP serialization
//! - **write**: atomic write into the output directory
//!
//! [`ConversionPipeline`] chains them for one file; [`BatchRunner`] fans a
//! file list out over a bounded worker pool.

pub mod analyze;
pub mod batch;
pub mod channel;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod policy;
pub mod preprocess;
pub mod processor;
pub mod validate;
pub mod write;

// Re-exports for convenient access
pub use analyze::ComplexityAnalyzer;
pub use batch::{BatchEvent, BatchHandle, BatchRunner, BatchState, CancelFlag};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::FileDiscovery;
pub use encode::WebpEncoder;
pub use policy::CompressionPolicy;
pub use preprocess::ImagePreprocessor;
pub use processor::{ConversionPipeline, Route};
pub use validate::Validator;
pub use write::OutputDirectory;
