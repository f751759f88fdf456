//! Codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the narrow seam between the thumbnail
//! pipeline and concrete codecs: `decode` once per task while acquiring the
//! source, `encode` once per task while writing the destination.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure Rust codecs.

use super::params::Quality;
use image::metadata::Orientation;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
}

/// A decoded source image.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub image: DynamicImage,
    /// Container format the bytes were in, when it could be identified.
    pub format: Option<ImageFormat>,
    /// EXIF orientation recorded in the source; not yet applied to `image`.
    pub orientation: Orientation,
}

/// Trait for codec backends.
///
/// Implementations must be stateless across calls so a backend can be shared
/// between builder invocations running on different threads.
pub trait ImageBackend: Sync {
    /// Decode encoded bytes into a bitmap.
    fn decode(&self, data: &[u8]) -> Result<Decoded, BackendError>;

    /// Encode `image` as `format`. `quality` is ignored by lossless codecs.
    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError>;
}

impl<B: ImageBackend + ?Sized> ImageBackend for &B {
    fn decode(&self, data: &[u8]) -> Result<Decoded, BackendError> {
        (**self).decode(data)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError> {
        (**self).encode(image, format, quality)
    }
}

impl<B: ImageBackend + Send + ?Sized> ImageBackend for std::sync::Arc<B> {
    fn decode(&self, data: &[u8]) -> Result<Decoded, BackendError> {
        (**self).decode(data)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError> {
        (**self).encode(image, format, quality)
    }
}
