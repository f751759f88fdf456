//! Pure Rust codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `image::ImageReader::with_guessed_format` |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate decoders |
//! | EXIF orientation | `image::ImageDecoder::orientation` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → others | `DynamicImage::write_to` (lossless, quality ignored) |

use super::backend::{BackendError, Decoded, ImageBackend};
use super::params::{Quality, format_name};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// JPEG quality used when none is configured.
const DEFAULT_JPEG_QUALITY: u8 = 90;

/// AVIF quality used when none is configured.
const DEFAULT_AVIF_QUALITY: u8 = 80;

/// Codec backend using the `image` crate ecosystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// JPEG has no alpha channel and no 16-bit mode.
fn flatten_for_jpeg(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image.clone(),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) => {
            DynamicImage::ImageLuma8(image.to_luma8())
        }
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, data: &[u8]) -> Result<Decoded, BackendError> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let format = reader.format();
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        let image =
            DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Decoded {
            image,
            format,
            orientation,
        })
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError> {
        if !format.writing_enabled() {
            return Err(BackendError::UnsupportedFormat(
                format_name(format).to_string(),
            ));
        }

        let mut buffer = Vec::new();
        let result = match format {
            ImageFormat::Jpeg => {
                let q = quality.map_or(DEFAULT_JPEG_QUALITY, Quality::percent);
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, q);
                flatten_for_jpeg(image).write_with_encoder(encoder)
            }
            ImageFormat::Avif => {
                let q = quality.map_or(DEFAULT_AVIF_QUALITY, Quality::percent);
                let encoder =
                    image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buffer, 6, q);
                image.write_with_encoder(encoder)
            }
            other => image.write_to(&mut Cursor::new(&mut buffer), other),
        };
        result.map_err(|e| {
            BackendError::Encode(format!("{} encode failed: {e}", format_name(format)))
        })?;
        Ok(buffer)
    }
}
