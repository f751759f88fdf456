//! Orientation and color transforms.

use super::{FilterError, ImageFilter, Layer};
use image::{DynamicImage, Rgba};

/// Clockwise rotation by whole quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    quarter_turns: u8,
}

impl Rotation {
    pub const QUARTER: Rotation = Rotation { quarter_turns: 1 };
    pub const HALF: Rotation = Rotation { quarter_turns: 2 };
    pub const THREE_QUARTERS: Rotation = Rotation { quarter_turns: 3 };

    /// Negative angles rotate counter-clockwise.
    pub fn from_degrees(degrees: i32) -> Result<Self, FilterError> {
        if degrees % 90 != 0 {
            return Err(FilterError::InvalidRotation(degrees));
        }
        Ok(Self {
            quarter_turns: (degrees / 90).rem_euclid(4) as u8,
        })
    }

    pub fn degrees(&self) -> u32 {
        u32::from(self.quarter_turns) * 90
    }
}

impl ImageFilter for Rotation {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        match self.quarter_turns {
            1 => image.rotate90(),
            2 => image.rotate180(),
            3 => image.rotate270(),
            _ => image.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    Horizontal,
    Vertical,
}

impl ImageFilter for Flip {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        match self {
            Flip::Horizontal => image.fliph(),
            Flip::Vertical => image.flipv(),
        }
    }
}

/// Scales every pixel's alpha by a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transparency {
    alpha: f32,
}

impl Transparency {
    pub fn new(alpha: f32) -> Result<Self, FilterError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(FilterError::InvalidOpacity(alpha));
        }
        Ok(Self { alpha })
    }
}

impl ImageFilter for Transparency {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let mut layer = Layer::of(image);
        layer.map(|[r, g, b, a]| [r, g, b, a * self.alpha]);
        layer.into_dynamic()
    }
}

/// Tints the whole image with a color at the given strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colorize {
    color: Rgba<u8>,
    alpha: f32,
}

impl Colorize {
    pub fn new(color: Rgba<u8>, alpha: f32) -> Result<Self, FilterError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(FilterError::InvalidOpacity(alpha));
        }
        Ok(Self { color, alpha })
    }
}

impl ImageFilter for Colorize {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let strength = self.alpha * f32::from(self.color.0[3]) / 255.0;
        let tint = self.color.0.map(|c| f32::from(c) / 255.0);
        let mut layer = Layer::of(image);
        layer.map(|[r, g, b, a]| {
            let mix = |c: f32, t: f32| t * strength + c * (1.0 - strength);
            [mix(r, tint[0]), mix(g, tint[1]), mix(b, tint[2]), a]
        });
        layer.into_color_of(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn rotation_accepts_quarter_turns_only() {
        assert_eq!(Rotation::from_degrees(90).unwrap(), Rotation::QUARTER);
        assert_eq!(Rotation::from_degrees(-90).unwrap(), Rotation::THREE_QUARTERS);
        assert_eq!(Rotation::from_degrees(540).unwrap(), Rotation::HALF);
        assert_eq!(Rotation::from_degrees(360).unwrap().degrees(), 0);
        assert_eq!(
            Rotation::from_degrees(45).unwrap_err(),
            FilterError::InvalidRotation(45)
        );
    }

    #[test]
    fn quarter_rotation_swaps_axes() {
        let out = Rotation::QUARTER.apply(&DynamicImage::new_rgb8(6, 2));
        assert_eq!(out.dimensions(), (2, 6));
        let out = Rotation::HALF.apply(&DynamicImage::new_rgb8(6, 2));
        assert_eq!(out.dimensions(), (6, 2));
    }

    #[test]
    fn flip_mirrors_pixels() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        let img = DynamicImage::ImageRgb8(img);

        let h = Flip::Horizontal.apply(&img).to_rgb8();
        assert_eq!(h.get_pixel(2, 0), &Rgb([255, 255, 255]));
        let v = Flip::Vertical.apply(&img).to_rgb8();
        assert_eq!(v.get_pixel(0, 1), &Rgb([255, 255, 255]));
    }

    #[test]
    fn transparency_scales_alpha() {
        let out = Transparency::new(0.5)
            .unwrap()
            .apply(&DynamicImage::new_rgb8(2, 2))
            .to_rgba8();
        assert_eq!(out.get_pixel(0, 0).0[3], 128);
    }

    #[test]
    fn colorize_blends_toward_color() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])));
        let out = Colorize::new(Rgba([255, 0, 0, 255]), 0.5)
            .unwrap()
            .apply(&img)
            .to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([128, 0, 0]));
    }

    #[test]
    fn color_filters_keep_bit_depth() {
        let img = DynamicImage::new_luma16(2, 2);
        let tinted = Colorize::new(Rgba([255, 255, 255, 255]), 1.0).unwrap().apply(&img);
        let DynamicImage::ImageLuma16(tinted) = tinted else {
            panic!("expected a 16-bit grayscale image");
        };
        assert_eq!(tinted.get_pixel(0, 0).0, [65535]);

        let faded = Transparency::new(0.5).unwrap().apply(&img);
        assert!(matches!(faded, DynamicImage::ImageRgba16(_)));
    }

    #[test]
    fn color_filters_reject_bad_alpha() {
        assert!(Transparency::new(-0.1).is_err());
        assert!(Colorize::new(Rgba([0, 0, 0, 255]), 2.0).is_err());
    }
}
