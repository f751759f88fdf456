//! Pixel resampling, including progressive downscaling.
//!
//! A single bilinear or bicubic pass aliases visibly once it shrinks an
//! image by more than about 2×. [`Resizer::Progressive`] instead walks the
//! sizes from [`progressive_steps`], each at most a 2× reduction, and then
//! makes one final pass onto the exact target.

use super::calculations::progressive_steps;
use image::DynamicImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    #[error("Cannot resize to an empty image ({width}x{height}).")]
    EmptyTarget { width: u32, height: u32 },
    #[error("The null resizer cannot change {from:?} to {to:?}.")]
    NullResize { from: (u32, u32), to: (u32, u32) },
}

/// Pixel interpolation used by a single resampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    Nearest,
    Bilinear,
    Bicubic,
}

impl Interpolation {
    fn filter(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Bilinear => FilterType::Triangle,
            Interpolation::Bicubic => FilterType::CatmullRom,
        }
    }
}

/// Resample `image` to exactly `width` × `height` in one pass.
///
/// Matching dimensions return an unfiltered copy.
pub fn resize_pixels(
    image: &DynamicImage,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<DynamicImage, ResizeError> {
    if width == 0 || height == 0 {
        return Err(ResizeError::EmptyTarget { width, height });
    }
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }
    Ok(image.resize_exact(width, height, interpolation.filter()))
}

/// Named resizing strategies, the coarse alternative to picking a [`Resizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingMode {
    Bilinear,
    Bicubic,
    ProgressiveBilinear,
}

impl ScalingMode {
    pub fn resizer(self) -> Resizer {
        match self {
            ScalingMode::Bilinear => Resizer::BILINEAR,
            ScalingMode::Bicubic => Resizer::BICUBIC,
            ScalingMode::ProgressiveBilinear => Resizer::PROGRESSIVE,
        }
    }
}

/// How source pixels are mapped onto the target dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resizer {
    /// Copy only; the dimensions must already match.
    Null,
    /// One pass with the given interpolation.
    Direct(Interpolation),
    /// Repeated ≤2× reductions, then one final pass.
    Progressive(Interpolation),
}

impl Resizer {
    pub const NEAREST: Resizer = Resizer::Direct(Interpolation::Nearest);
    pub const BILINEAR: Resizer = Resizer::Direct(Interpolation::Bilinear);
    pub const BICUBIC: Resizer = Resizer::Direct(Interpolation::Bicubic);
    pub const PROGRESSIVE: Resizer = Resizer::Progressive(Interpolation::Bilinear);

    /// Default choice when nothing is configured.
    ///
    /// Shrinking past half on both axes goes progressive, a milder shrink is
    /// bilinear, growing on both axes is bicubic and identical dimensions
    /// copy. Anything mixed goes progressive.
    pub fn for_dimensions(source: (u32, u32), target: (u32, u32)) -> Resizer {
        let ((src_w, src_h), (tgt_w, tgt_h)) = (source, target);
        if tgt_w < src_w && tgt_h < src_h {
            if tgt_w < src_w / 2 && tgt_h < src_h / 2 {
                Resizer::PROGRESSIVE
            } else {
                Resizer::BILINEAR
            }
        } else if tgt_w > src_w && tgt_h > src_h {
            Resizer::BICUBIC
        } else if source == target {
            Resizer::Null
        } else {
            Resizer::PROGRESSIVE
        }
    }

    /// Number of resampling passes for `source` → `target`, counting the
    /// final pass onto the target even when the last halving already lands
    /// there and it is skipped.
    pub fn pass_count(&self, source: (u32, u32), target: (u32, u32)) -> usize {
        match self {
            Resizer::Null | Resizer::Direct(_) => 1,
            Resizer::Progressive(_) => progressive_steps(source, target).len() + 1,
        }
    }

    /// Resize `source` to exactly `width` × `height`.
    ///
    /// Intermediate bitmaps are dropped as soon as the next pass has read them.
    pub fn resize(
        &self,
        source: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ResizeError> {
        let from = (source.width(), source.height());
        match *self {
            Resizer::Null if from == (width, height) => Ok(source.clone()),
            Resizer::Null => Err(ResizeError::NullResize {
                from,
                to: (width, height),
            }),
            Resizer::Direct(interpolation) => resize_pixels(source, width, height, interpolation),
            Resizer::Progressive(interpolation) => {
                if width == 0 || height == 0 {
                    return Err(ResizeError::EmptyTarget { width, height });
                }
                let mut current: Option<DynamicImage> = None;
                for (step_w, step_h) in progressive_steps(from, (width, height)) {
                    let input = current.as_ref().unwrap_or(source);
                    current = Some(resize_pixels(input, step_w, step_h, interpolation)?);
                }
                match current {
                    Some(img) if img.width() == width && img.height() == height => Ok(img),
                    Some(img) => resize_pixels(&img, width, height, interpolation),
                    None => resize_pixels(source, width, height, interpolation),
                }
            }
        }
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Resizer::PROGRESSIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn checkerboard(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        }))
    }

    #[test]
    fn progressive_output_has_exact_target_dimensions() {
        let src = checkerboard(200, 200);
        let out = Resizer::PROGRESSIVE.resize(&src, 50, 50).unwrap();
        assert_eq!((out.width(), out.height()), (50, 50));
    }

    #[test]
    fn progressive_handles_non_power_of_two_ratio() {
        let src = checkerboard(317, 123);
        let out = Resizer::PROGRESSIVE.resize(&src, 40, 17).unwrap();
        assert_eq!((out.width(), out.height()), (40, 17));
    }

    #[test]
    fn progressive_upscale_is_single_pass() {
        let src = checkerboard(20, 10);
        assert_eq!(Resizer::PROGRESSIVE.pass_count((20, 10), (80, 40)), 1);
        let out = Resizer::PROGRESSIVE.resize(&src, 80, 40).unwrap();
        assert_eq!((out.width(), out.height()), (80, 40));
    }

    #[test]
    fn progressive_averages_checkerboard_to_grey() {
        // A single nearest pass would keep pure black/white pixels.
        let src = checkerboard(256, 256);
        let out = Resizer::Progressive(Interpolation::Bilinear)
            .resize(&src, 8, 8)
            .unwrap()
            .to_rgb8();
        let px = out.get_pixel(4, 4).0[0];
        assert!((64..=192).contains(&px), "expected mid grey, got {px}");
    }

    #[test]
    fn pass_count_matches_log2_of_ratio() {
        let r = Resizer::PROGRESSIVE;
        assert_eq!(r.pass_count((200, 200), (50, 50)), 3);
        assert_eq!(r.pass_count((200, 200), (60, 60)), 3);
        assert_eq!(r.pass_count((1000, 500), (100, 100)), 5);
        assert_eq!(r.pass_count((100, 100), (100, 100)), 1);
        assert_eq!(Resizer::BILINEAR.pass_count((1000, 1000), (10, 10)), 1);
    }

    #[test]
    fn direct_resize_each_interpolation() {
        let src = checkerboard(30, 20);
        for i in [
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
        ] {
            let out = Resizer::Direct(i).resize(&src, 15, 7).unwrap();
            assert_eq!((out.width(), out.height()), (15, 7));
        }
    }

    #[test]
    fn null_resizer_copies_matching_dimensions_only() {
        let src = checkerboard(10, 10);
        let out = Resizer::Null.resize(&src, 10, 10).unwrap();
        assert_eq!(out.to_rgb8(), src.to_rgb8());
        assert_eq!(
            Resizer::Null.resize(&src, 5, 5).unwrap_err(),
            ResizeError::NullResize {
                from: (10, 10),
                to: (5, 5)
            }
        );
    }

    #[test]
    fn empty_target_is_rejected() {
        let src = checkerboard(10, 10);
        assert!(matches!(
            Resizer::BILINEAR.resize(&src, 0, 5),
            Err(ResizeError::EmptyTarget { .. })
        ));
        assert!(matches!(
            Resizer::PROGRESSIVE.resize(&src, 5, 0),
            Err(ResizeError::EmptyTarget { .. })
        ));
    }

    #[test]
    fn default_selection_by_ratio() {
        assert_eq!(
            Resizer::for_dimensions((1000, 1000), (100, 100)),
            Resizer::PROGRESSIVE
        );
        assert_eq!(
            Resizer::for_dimensions((1000, 1000), (600, 600)),
            Resizer::BILINEAR
        );
        assert_eq!(
            Resizer::for_dimensions((100, 100), (300, 300)),
            Resizer::BICUBIC
        );
        assert_eq!(
            Resizer::for_dimensions((100, 100), (100, 100)),
            Resizer::Null
        );
        assert_eq!(
            Resizer::for_dimensions((100, 100), (300, 50)),
            Resizer::PROGRESSIVE
        );
    }

    #[test]
    fn scaling_modes_map_to_resizers() {
        assert_eq!(ScalingMode::Bilinear.resizer(), Resizer::BILINEAR);
        assert_eq!(ScalingMode::Bicubic.resizer(), Resizer::BICUBIC);
        assert_eq!(
            ScalingMode::ProgressiveBilinear.resizer(),
            Resizer::PROGRESSIVE
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// Property: pass count is ⌈log2(max ratio)⌉ + 1 for any shrink.
            #[test]
            fn prop_pass_count(
                (src_w, src_h, tgt_w, tgt_h) in (1u32..3000, 1u32..3000)
                    .prop_flat_map(|(w, h)| (Just(w), Just(h), 1..=w, 1..=h)),
            ) {
                let ratio = (src_w as f64 / tgt_w as f64).max(src_h as f64 / tgt_h as f64);
                let expected = ratio.log2().ceil() as usize + 1;
                prop_assert_eq!(
                    Resizer::PROGRESSIVE.pass_count((src_w, src_h), (tgt_w, tgt_h)),
                    expected
                );
            }

            /// Property: output always lands exactly on the target.
            #[test]
            fn prop_progressive_exact_output(
                (src_w, src_h, tgt_w, tgt_h) in (1u32..96, 1u32..96)
                    .prop_flat_map(|(w, h)| (Just(w), Just(h), 1..=w, 1..=h)),
            ) {
                let src = DynamicImage::new_rgb8(src_w, src_h);
                let out = Resizer::PROGRESSIVE.resize(&src, tgt_w, tgt_h).unwrap();
                prop_assert_eq!((out.width(), out.height()), (tgt_w, tgt_h));
            }
        }
    }
}
