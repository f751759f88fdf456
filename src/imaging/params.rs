//! Value types describing how output pixels are stored and encoded.
//!
//! - [`Quality`]: lossy encoding quality as a fraction (`0.0..=1.0`).
//! - [`PixelFormat`]: the in-memory pixel layout of the final thumbnail.
//! - [`format_from_name`]: resolve a codec name such as `"jpg"` to an [`ImageFormat`].

use image::{DynamicImage, ImageFormat};

/// Quality setting for lossy image encoding, as a fraction of best quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// `None` unless `fraction` lies in `0.0..=1.0`.
    pub fn new(fraction: f32) -> Option<Self> {
        (0.0..=1.0).contains(&fraction).then_some(Self(fraction))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality as the 1-100 integer scale codecs expect.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Pixel layout of the thumbnail handed to the encoder or returned in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Luma8,
    LumaA8,
    Rgb8,
    Rgba8,
    Rgb16,
    Rgba16,
}

impl PixelFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "luma8" | "gray" | "grey" => Some(Self::Luma8),
            "lumaa8" => Some(Self::LumaA8),
            "rgb8" | "rgb" => Some(Self::Rgb8),
            "rgba8" | "rgba" => Some(Self::Rgba8),
            "rgb16" => Some(Self::Rgb16),
            "rgba16" => Some(Self::Rgba16),
            _ => None,
        }
    }

    /// Convert `image` into this layout, leaving it untouched if it already matches.
    pub fn convert(self, image: DynamicImage) -> DynamicImage {
        match (self, image) {
            (Self::Luma8, img @ DynamicImage::ImageLuma8(_)) => img,
            (Self::LumaA8, img @ DynamicImage::ImageLumaA8(_)) => img,
            (Self::Rgb8, img @ DynamicImage::ImageRgb8(_)) => img,
            (Self::Rgba8, img @ DynamicImage::ImageRgba8(_)) => img,
            (Self::Rgb16, img @ DynamicImage::ImageRgb16(_)) => img,
            (Self::Rgba16, img @ DynamicImage::ImageRgba16(_)) => img,
            (Self::Luma8, img) => DynamicImage::ImageLuma8(img.to_luma8()),
            (Self::LumaA8, img) => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
            (Self::Rgb8, img) => DynamicImage::ImageRgb8(img.to_rgb8()),
            (Self::Rgba8, img) => DynamicImage::ImageRgba8(img.to_rgba8()),
            (Self::Rgb16, img) => DynamicImage::ImageRgb16(img.to_rgb16()),
            (Self::Rgba16, img) => DynamicImage::ImageRgba16(img.to_rgba16()),
        }
    }
}

/// Resolve a codec name or file extension (`"png"`, `"JPG"`, `"jpeg"`) to a
/// format this build can encode.
pub fn format_from_name(name: &str) -> Option<ImageFormat> {
    ImageFormat::from_extension(name.trim_start_matches('.')).filter(|f| f.writing_enabled())
}

/// Canonical lower-case name of a format, used in file names and messages.
pub fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("bin")
}
