//! Watermark and caption overlays.

use super::{ImageFilter, Layer};
use crate::geometry::{Insets, Position};
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Opacity is out of range (got {0}).")]
    InvalidOpacity(f32),
    #[error("Overlay image is empty.")]
    EmptyOverlay,
    #[error("Rotation must be a multiple of 90 degrees (got {0}).")]
    InvalidRotation(i32),
}

fn check_opacity(opacity: f32) -> Result<f32, FilterError> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(opacity)
    } else {
        Err(FilterError::InvalidOpacity(opacity))
    }
}

/// Draw `overlay` onto a copy of `image` at `position`.
fn place(
    image: &DynamicImage,
    overlay: &DynamicImage,
    position: Position,
    insets: Insets,
    opacity: f32,
) -> DynamicImage {
    let point = match position.calculate(
        image.width(),
        image.height(),
        overlay.width(),
        overlay.height(),
        insets,
    ) {
        Ok(point) => point,
        Err(e) => {
            warn!("Skipping overlay: {e}");
            return image.clone();
        }
    };
    let mut layer = Layer::of(image);
    layer.draw(overlay, point, opacity);
    layer.into_color_of(image)
}

/// An image stamped onto every thumbnail.
#[derive(Debug, Clone)]
pub struct Watermark {
    position: Position,
    image: Arc<DynamicImage>,
    opacity: f32,
    insets: Insets,
}

impl Watermark {
    pub fn new(position: Position, image: &DynamicImage, opacity: f32) -> Result<Self, FilterError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FilterError::EmptyOverlay);
        }
        Ok(Self {
            position,
            image: Arc::new(image.clone()),
            opacity: check_opacity(opacity)?,
            insets: Insets::default(),
        })
    }

    pub fn with_insets(mut self, insets: Insets) -> Self {
        self.insets = insets;
        self
    }
}

impl ImageFilter for Watermark {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        place(image, &self.image, self.position, self.insets, self.opacity)
    }
}

/// A text label drawn in a single color.
///
/// The label is supplied as a coverage mask (0 = background, 255 = glyph),
/// already rasterised at the size it should appear on the thumbnail.
#[derive(Debug, Clone)]
pub struct Caption {
    label: Arc<DynamicImage>,
    position: Position,
    insets: Insets,
    opacity: f32,
}

impl Caption {
    pub fn new(
        mask: &GrayImage,
        color: Rgba<u8>,
        position: Position,
        insets: Insets,
        opacity: f32,
    ) -> Result<Self, FilterError> {
        if mask.width() == 0 || mask.height() == 0 {
            return Err(FilterError::EmptyOverlay);
        }
        let [r, g, b, a] = color.0;
        let label = RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
            let coverage = u16::from(mask.get_pixel(x, y).0[0]);
            Rgba([r, g, b, (coverage * u16::from(a) / 255) as u8])
        });
        Ok(Self {
            label: Arc::new(DynamicImage::ImageRgba8(label)),
            position,
            insets,
            opacity: check_opacity(opacity)?,
        })
    }
}

impl ImageFilter for Caption {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        place(image, &self.label, self.position, self.insets, self.opacity)
    }
}
