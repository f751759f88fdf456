use super::{ImageFilter, Layer};
use crate::geometry::{Insets, Position};
use image::{DynamicImage, Rgba};
use tracing::warn;

/// Places the image on a canvas of a fixed size.
///
/// A larger canvas pads the image with `fill` (transparent when unset). A
/// smaller canvas crops only when `crop` is set; otherwise that axis keeps
/// the image's own extent.
#[derive(Debug, Clone, Copy)]
pub struct Canvas {
    width: u32,
    height: u32,
    position: Position,
    crop: bool,
    fill: Option<Rgba<u8>>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, position: Position) -> Self {
        Self {
            width,
            height,
            position,
            crop: false,
            fill: None,
        }
    }

    pub fn crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    pub fn fill(mut self, color: Rgba<u8>) -> Self {
        self.fill = Some(color);
        self
    }

    fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if self.crop {
            (self.width, self.height)
        } else {
            (self.width.max(width), self.height.max(height))
        }
    }
}

impl ImageFilter for Canvas {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = self.target_dimensions(image.width(), image.height());
        let point = match self.position.calculate(
            width,
            height,
            image.width(),
            image.height(),
            Insets::default(),
        ) {
            Ok(point) => point,
            Err(e) => {
                warn!("Skipping canvas: {e}");
                return image.clone();
            }
        };

        let background = self.fill.unwrap_or(Rgba([0, 0, 0, 0]));
        let mut canvas = Layer::filled(image, width, height, background);
        canvas.draw(image, point, 1.0);

        let padded = width > image.width() || height > image.height();
        if self.fill.is_none() && padded {
            canvas.into_dynamic()
        } else {
            canvas.into_color_of(image)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn red(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 0, 0])))
    }

    #[test]
    fn pads_with_fill_color() {
        let canvas = Canvas::new(6, 4, Position::TopCenter).fill(Rgba([0, 0, 255, 255]));
        let out = canvas.apply(&red(2, 2));
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));

        let px = out.to_rgb8();
        assert_eq!((px.width(), px.height()), (6, 4));
        assert_eq!(px.get_pixel(2, 0), &Rgb([255, 0, 0]));
        assert_eq!(px.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(px.get_pixel(2, 3), &Rgb([0, 0, 255]));
    }

    #[test]
    fn padding_without_fill_is_transparent() {
        let out = Canvas::new(4, 4, Position::Center).apply(&red(2, 2));
        let px = out.to_rgba8();
        assert_eq!(px.get_pixel(0, 0).0[3], 0);
        assert_eq!(px.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn smaller_canvas_crops_only_when_asked() {
        let kept = Canvas::new(2, 2, Position::Center).apply(&red(5, 5));
        assert_eq!((kept.width(), kept.height()), (5, 5));

        let cropped = Canvas::new(2, 2, Position::Center).crop(true).apply(&red(5, 5));
        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_eq!(cropped.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn sixteen_bit_input_stays_sixteen_bit() {
        let filled = Canvas::new(4, 4, Position::Center)
            .fill(Rgba([0, 0, 0, 255]))
            .apply(&DynamicImage::new_rgb16(2, 2));
        assert!(matches!(filled, DynamicImage::ImageRgb16(_)));

        let transparent = Canvas::new(4, 4, Position::Center).apply(&DynamicImage::new_luma16(2, 2));
        assert!(matches!(transparent, DynamicImage::ImageRgba16(_)));
    }

    #[test]
    fn mixed_axes_pad_one_and_keep_other() {
        let out = Canvas::new(8, 2, Position::Center).apply(&red(4, 4));
        assert_eq!((out.width(), out.height()), (8, 4));
    }
}
