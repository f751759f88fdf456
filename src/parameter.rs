//! The validated, immutable settings shared by every task of one builder call.
//!
//! [`ParameterBuilder`] collects options and rejects a conflicting or repeated
//! option the moment it is supplied. [`ParameterBuilder::build`] then checks
//! what can only be judged as a whole (is a size set at all?) and freezes
//! the result into a [`ThumbnailParameter`].

use crate::filters::{ImageFilter, Pipeline, Rotation, Watermark};
use crate::geometry::{Position, Region};
use crate::imaging::{
    PixelFormat, Quality, Resizer, ScalingMode, calculate_fill_dimensions,
    calculate_fit_dimensions, calculate_height_bound, calculate_scaled_dimensions,
    calculate_width_bound, format_from_name,
};
use image::ImageFormat;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("The size has already been set.")]
    SizeAlreadySet,
    #[error("The size cannot be set after the scaling factor has been set.")]
    SizeAfterScale,
    #[error("The width has already been set.")]
    WidthAlreadySet,
    #[error("The height has already been set.")]
    HeightAlreadySet,
    #[error("The scaling factor has already been set.")]
    ScaleAlreadySet,
    #[error("The scaling factor cannot be set after the size has been set.")]
    ScaleAfterSize,
    #[error("The scaling factor must be a positive finite number (got {0}).")]
    InvalidScale(f64),
    #[error("Width and height must be greater than zero.")]
    InvalidSize,
    #[error("Whether to keep the aspect ratio has already been set.")]
    KeepAspectRatioAlreadySet,
    #[error("Whether to keep the aspect ratio cannot be set after the scaling factor has been set.")]
    KeepAspectRatioWithScale,
    #[error("The aspect ratio must be kept when only one dimension is set.")]
    KeepAspectRatioWithOneDimension,
    #[error("The resizer has already been set.")]
    ResizerAlreadySet,
    #[error("The scaling mode has already been set.")]
    ScalingModeAlreadySet,
    #[error("The resizer cannot be set after the scaling mode has been set.")]
    ResizerAfterScalingMode,
    #[error("The scaling mode cannot be set after the resizer has been set.")]
    ScalingModeAfterResizer,
    #[error("The image type has already been set.")]
    ImageTypeAlreadySet,
    #[error("The output format has already been set.")]
    OutputFormatAlreadySet,
    #[error("Specified format is not supported: {0}")]
    UnsupportedFormat(String),
    #[error("The output quality has already been set.")]
    QualityAlreadySet,
    #[error("The quality must be between 0.0 and 1.0 (got {0}).")]
    InvalidQuality(f32),
    #[error("Whether to use the EXIF orientation has already been set.")]
    ExifOrientationAlreadySet,
    #[error("The source region has already been set.")]
    SourceRegionAlreadySet,
    #[error("The crop position has already been set.")]
    CropAlreadySet,
    #[error("Cannot crop when a scaling factor is set.")]
    CropWithScale,
    #[error("Cannot crop when the aspect ratio is not kept.")]
    CropWithoutAspectRatio,
    #[error("Cannot crop unless both width and height are set.")]
    CropWithOneDimension,
    #[error("The size or scaling factor has not been set.")]
    SizeNotSet,
    #[error(transparent)]
    Filter(#[from] crate::filters::FilterError),

    // Cardinality and destination errors, raised by the builder's terminals.
    #[error("No sources specified.")]
    NoSources,
    #[error("Cannot create one thumbnail from multiple original images.")]
    MultipleToOneImage,
    #[error("Cannot output multiple thumbnails to one file.")]
    MultipleToOneFile,
    #[error("Cannot output multiple thumbnails to one stream.")]
    MultipleToOneStream,
    #[error("Output format not specified.")]
    OutputFormatNotSpecified,
}

/// How target dimensions are derived from the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimensioning {
    /// Bounding size. At least one edge is always set.
    Size {
        width: Option<u32>,
        height: Option<u32>,
    },
    /// Per-axis factors applied to the source dimensions.
    Scale { x: f64, y: f64 },
}

/// The frozen settings for one batch of thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailParameter {
    pub dimensioning: Dimensioning,
    pub keep_aspect_ratio: bool,
    /// `None` picks a resizer per image from the scaling ratio.
    pub resizer: Option<Resizer>,
    pub pixel_format: Option<PixelFormat>,
    /// `None` inherits the destination's or the source's format.
    pub output_format: Option<ImageFormat>,
    pub output_quality: Option<Quality>,
    pub filters: Pipeline,
    pub use_exif_orientation: bool,
    pub source_region: Option<Region>,
    pub crop: Option<Position>,
}

impl ThumbnailParameter {
    /// Size the resizer should produce for a source of `source` dimensions.
    ///
    /// With a crop position this is the fill size; the crop to the exact
    /// target happens afterwards.
    pub fn resize_dimensions(&self, source: (u32, u32)) -> (u32, u32) {
        match self.dimensioning {
            Dimensioning::Scale { x, y } => calculate_scaled_dimensions(source, x, y),
            Dimensioning::Size {
                width: Some(w),
                height: Some(h),
            } => {
                if !self.keep_aspect_ratio {
                    (w, h)
                } else if self.crop.is_some() {
                    calculate_fill_dimensions(source, (w, h))
                } else {
                    calculate_fit_dimensions(source, (w, h))
                }
            }
            Dimensioning::Size {
                width: Some(w),
                height: None,
            } => calculate_width_bound(source, w),
            Dimensioning::Size {
                width: None,
                height: Some(h),
            } => calculate_height_bound(source, h),
            // build() never produces this
            Dimensioning::Size {
                width: None,
                height: None,
            } => source,
        }
    }

    /// Resizer to use for `source` → `target`.
    pub fn resizer_for(&self, source: (u32, u32), target: (u32, u32)) -> Resizer {
        self.resizer
            .unwrap_or_else(|| Resizer::for_dimensions(source, target))
    }
}

/// Accumulates options for a [`ThumbnailParameter`], failing fast on
/// repeated or conflicting ones.
#[derive(Debug, Clone, Default)]
pub struct ParameterBuilder {
    width: Option<u32>,
    height: Option<u32>,
    scale: Option<(f64, f64)>,
    keep_aspect_ratio: Option<bool>,
    resizer: Option<Resizer>,
    scaling_mode: Option<ScalingMode>,
    pixel_format: Option<PixelFormat>,
    output_format: Option<ImageFormat>,
    output_quality: Option<Quality>,
    filters: Pipeline,
    use_exif_orientation: Option<bool>,
    source_region: Option<Region>,
    crop: Option<Position>,
}

fn positive(value: u32) -> Result<u32, ParameterError> {
    if value == 0 {
        Err(ParameterError::InvalidSize)
    } else {
        Ok(value)
    }
}

fn factor(value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::InvalidScale(value))
    }
}

impl ParameterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_size_settable(&self) -> Result<(), ParameterError> {
        if self.scale.is_some() {
            return Err(ParameterError::SizeAfterScale);
        }
        Ok(())
    }

    /// Bound the thumbnail by `width` × `height`.
    pub fn size(&mut self, width: u32, height: u32) -> Result<(), ParameterError> {
        self.check_size_settable()?;
        if self.width.is_some() || self.height.is_some() {
            return Err(ParameterError::SizeAlreadySet);
        }
        self.width = Some(positive(width)?);
        self.height = Some(positive(height)?);
        Ok(())
    }

    pub fn width(&mut self, width: u32) -> Result<(), ParameterError> {
        self.check_size_settable()?;
        if self.width.is_some() {
            return Err(ParameterError::WidthAlreadySet);
        }
        self.width = Some(positive(width)?);
        Ok(())
    }

    pub fn height(&mut self, height: u32) -> Result<(), ParameterError> {
        self.check_size_settable()?;
        if self.height.is_some() {
            return Err(ParameterError::HeightAlreadySet);
        }
        self.height = Some(positive(height)?);
        Ok(())
    }

    /// Exactly `width` × `height`, ignoring the aspect ratio.
    pub fn force_size(&mut self, width: u32, height: u32) -> Result<(), ParameterError> {
        if self.keep_aspect_ratio.is_some() {
            return Err(ParameterError::KeepAspectRatioAlreadySet);
        }
        self.size(width, height)?;
        self.keep_aspect_ratio = Some(false);
        Ok(())
    }

    pub fn scale(&mut self, factor: f64) -> Result<(), ParameterError> {
        self.scale_xy(factor, factor)
    }

    pub fn scale_xy(&mut self, factor_x: f64, factor_y: f64) -> Result<(), ParameterError> {
        if self.scale.is_some() {
            return Err(ParameterError::ScaleAlreadySet);
        }
        if self.width.is_some() || self.height.is_some() {
            return Err(ParameterError::ScaleAfterSize);
        }
        if self.keep_aspect_ratio.is_some() {
            return Err(ParameterError::KeepAspectRatioWithScale);
        }
        if self.crop.is_some() {
            return Err(ParameterError::CropWithScale);
        }
        self.scale = Some((factor(factor_x)?, factor(factor_y)?));
        Ok(())
    }

    pub fn keep_aspect_ratio(&mut self, keep: bool) -> Result<(), ParameterError> {
        if self.keep_aspect_ratio.is_some() {
            return Err(ParameterError::KeepAspectRatioAlreadySet);
        }
        if self.scale.is_some() {
            return Err(ParameterError::KeepAspectRatioWithScale);
        }
        if !keep && self.crop.is_some() {
            return Err(ParameterError::CropWithoutAspectRatio);
        }
        self.keep_aspect_ratio = Some(keep);
        Ok(())
    }

    pub fn resizer(&mut self, resizer: Resizer) -> Result<(), ParameterError> {
        if self.resizer.is_some() {
            return Err(ParameterError::ResizerAlreadySet);
        }
        if self.scaling_mode.is_some() {
            return Err(ParameterError::ResizerAfterScalingMode);
        }
        self.resizer = Some(resizer);
        Ok(())
    }

    pub fn scaling_mode(&mut self, mode: ScalingMode) -> Result<(), ParameterError> {
        if self.scaling_mode.is_some() {
            return Err(ParameterError::ScalingModeAlreadySet);
        }
        if self.resizer.is_some() {
            return Err(ParameterError::ScalingModeAfterResizer);
        }
        self.scaling_mode = Some(mode);
        Ok(())
    }

    pub fn image_type(&mut self, format: PixelFormat) -> Result<(), ParameterError> {
        if self.pixel_format.is_some() {
            return Err(ParameterError::ImageTypeAlreadySet);
        }
        self.pixel_format = Some(format);
        Ok(())
    }

    /// Encode as the named format (`"png"`, `"jpg"`, ...).
    pub fn output_format(&mut self, name: &str) -> Result<(), ParameterError> {
        if self.output_format.is_some() {
            return Err(ParameterError::OutputFormatAlreadySet);
        }
        let format = format_from_name(name)
            .ok_or_else(|| ParameterError::UnsupportedFormat(name.to_string()))?;
        self.output_format = Some(format);
        Ok(())
    }

    pub fn output_quality(&mut self, quality: f32) -> Result<(), ParameterError> {
        if self.output_quality.is_some() {
            return Err(ParameterError::QualityAlreadySet);
        }
        let quality = Quality::new(quality).ok_or(ParameterError::InvalidQuality(quality))?;
        self.output_quality = Some(quality);
        Ok(())
    }

    pub fn use_exif_orientation(&mut self, use_exif: bool) -> Result<(), ParameterError> {
        if self.use_exif_orientation.is_some() {
            return Err(ParameterError::ExifOrientationAlreadySet);
        }
        self.use_exif_orientation = Some(use_exif);
        Ok(())
    }

    /// Only this part of the source (in display orientation) is used.
    pub fn source_region(&mut self, region: Region) -> Result<(), ParameterError> {
        if self.source_region.is_some() {
            return Err(ParameterError::SourceRegionAlreadySet);
        }
        self.source_region = Some(region);
        Ok(())
    }

    /// Fill the target size, then cut it out at `position`.
    pub fn crop(&mut self, position: Position) -> Result<(), ParameterError> {
        if self.crop.is_some() {
            return Err(ParameterError::CropAlreadySet);
        }
        if self.scale.is_some() {
            return Err(ParameterError::CropWithScale);
        }
        if self.keep_aspect_ratio == Some(false) {
            return Err(ParameterError::CropWithoutAspectRatio);
        }
        self.crop = Some(position);
        Ok(())
    }

    pub fn watermark(&mut self, watermark: Watermark) {
        self.filters.add(Arc::new(watermark));
    }

    /// Rotate clockwise by a multiple of 90 degrees.
    pub fn rotate(&mut self, degrees: i32) -> Result<(), ParameterError> {
        self.filters.add(Arc::new(Rotation::from_degrees(degrees)?));
        Ok(())
    }

    pub fn add_filter(&mut self, filter: Arc<dyn ImageFilter>) {
        self.filters.add(filter);
    }

    pub fn explicit_output_format(&self) -> Option<ImageFormat> {
        self.output_format
    }

    /// Validate the combination and freeze it.
    pub fn build(&self) -> Result<ThumbnailParameter, ParameterError> {
        let keep_aspect_ratio = self.keep_aspect_ratio.unwrap_or(true);
        let dimensioning = match (self.scale, self.width, self.height) {
            (Some((x, y)), _, _) => Dimensioning::Scale { x, y },
            (None, None, None) => return Err(ParameterError::SizeNotSet),
            (None, width, height) => {
                if !keep_aspect_ratio && (width.is_none() || height.is_none()) {
                    return Err(ParameterError::KeepAspectRatioWithOneDimension);
                }
                if self.crop.is_some() && (width.is_none() || height.is_none()) {
                    return Err(ParameterError::CropWithOneDimension);
                }
                Dimensioning::Size { width, height }
            }
        };

        Ok(ThumbnailParameter {
            dimensioning,
            keep_aspect_ratio,
            resizer: self
                .resizer
                .or_else(|| self.scaling_mode.map(ScalingMode::resizer)),
            pixel_format: self.pixel_format,
            output_format: self.output_format,
            output_quality: self.output_quality,
            filters: self.filters.clone(),
            use_exif_orientation: self.use_exif_orientation.unwrap_or(true),
            source_region: self.source_region,
            crop: self.crop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn sized(w: u32, h: u32) -> ParameterBuilder {
        let mut b = ParameterBuilder::new();
        b.size(w, h).unwrap();
        b
    }

    // =========================================================================
    // Fail-fast setters
    // =========================================================================

    #[test]
    fn size_twice_is_rejected() {
        let mut b = sized(10, 10);
        assert_eq!(b.size(20, 20), Err(ParameterError::SizeAlreadySet));
        assert_eq!(b.width(5), Err(ParameterError::WidthAlreadySet));
    }

    #[test]
    fn size_and_scale_are_exclusive() {
        let mut b = sized(10, 10);
        assert_eq!(b.scale(0.5), Err(ParameterError::ScaleAfterSize));

        let mut b = ParameterBuilder::new();
        b.scale(0.5).unwrap();
        assert_eq!(b.size(1, 1), Err(ParameterError::SizeAfterScale));
        assert_eq!(b.height(1), Err(ParameterError::SizeAfterScale));
        assert_eq!(b.scale(0.2), Err(ParameterError::ScaleAlreadySet));
    }

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            ParameterError::SizeAfterScale.to_string(),
            "The size cannot be set after the scaling factor has been set."
        );
        assert_eq!(
            ParameterError::MultipleToOneImage.to_string(),
            "Cannot create one thumbnail from multiple original images."
        );
        assert_eq!(
            ParameterError::OutputFormatNotSpecified.to_string(),
            "Output format not specified."
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut b = ParameterBuilder::new();
        assert_eq!(b.size(0, 10), Err(ParameterError::InvalidSize));
        assert!(matches!(b.scale(-1.0), Err(ParameterError::InvalidScale(_))));
        assert!(matches!(b.scale(f64::NAN), Err(ParameterError::InvalidScale(_))));
        assert_eq!(b.output_quality(1.5), Err(ParameterError::InvalidQuality(1.5)));
        assert_eq!(
            b.output_format("xyz"),
            Err(ParameterError::UnsupportedFormat("xyz".into()))
        );
        assert!(matches!(b.rotate(45), Err(ParameterError::Filter(_))));
    }

    #[test]
    fn keep_aspect_ratio_conflicts() {
        let mut b = ParameterBuilder::new();
        b.scale(0.5).unwrap();
        assert_eq!(
            b.keep_aspect_ratio(false),
            Err(ParameterError::KeepAspectRatioWithScale)
        );

        let mut b = sized(10, 10);
        b.keep_aspect_ratio(true).unwrap();
        assert_eq!(
            b.keep_aspect_ratio(true),
            Err(ParameterError::KeepAspectRatioAlreadySet)
        );

        let mut b = ParameterBuilder::new();
        b.force_size(10, 10).unwrap();
        assert_eq!(b.crop(Position::Center), Err(ParameterError::CropWithoutAspectRatio));
    }

    #[test]
    fn resizer_and_scaling_mode_are_exclusive() {
        let mut b = ParameterBuilder::new();
        b.resizer(Resizer::BICUBIC).unwrap();
        assert_eq!(
            b.scaling_mode(ScalingMode::Bilinear),
            Err(ParameterError::ScalingModeAfterResizer)
        );
        assert_eq!(b.resizer(Resizer::NEAREST), Err(ParameterError::ResizerAlreadySet));

        let mut b = ParameterBuilder::new();
        b.scaling_mode(ScalingMode::Bicubic).unwrap();
        assert_eq!(
            b.resizer(Resizer::NEAREST),
            Err(ParameterError::ResizerAfterScalingMode)
        );
    }

    #[test]
    fn single_value_setters_reject_repeats() {
        let mut b = ParameterBuilder::new();
        b.output_format("png").unwrap();
        assert_eq!(b.output_format("jpg"), Err(ParameterError::OutputFormatAlreadySet));
        b.output_quality(0.5).unwrap();
        assert_eq!(b.output_quality(0.6), Err(ParameterError::QualityAlreadySet));
        b.image_type(PixelFormat::Rgb8).unwrap();
        assert_eq!(
            b.image_type(PixelFormat::Rgb8),
            Err(ParameterError::ImageTypeAlreadySet)
        );
        b.use_exif_orientation(false).unwrap();
        assert_eq!(
            b.use_exif_orientation(true),
            Err(ParameterError::ExifOrientationAlreadySet)
        );
        let region = Region::new(Position::Center, Size::relative(0.5).unwrap());
        b.source_region(region).unwrap();
        assert_eq!(
            b.source_region(region),
            Err(ParameterError::SourceRegionAlreadySet)
        );
    }

    // =========================================================================
    // build()
    // =========================================================================

    #[test]
    fn build_requires_size_or_scale() {
        assert_eq!(
            ParameterBuilder::new().build().unwrap_err(),
            ParameterError::SizeNotSet
        );
    }

    #[test]
    fn build_rejects_unkept_ratio_with_one_dimension() {
        let mut b = ParameterBuilder::new();
        b.width(100).unwrap();
        b.keep_aspect_ratio(false).unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            ParameterError::KeepAspectRatioWithOneDimension
        );
    }

    #[test]
    fn build_defaults() {
        let p = sized(50, 40).build().unwrap();
        assert!(p.keep_aspect_ratio);
        assert!(p.use_exif_orientation);
        assert!(p.resizer.is_none());
        assert!(p.output_format.is_none());
        assert!(p.filters.is_empty());
    }

    #[test]
    fn scaling_mode_becomes_resizer() {
        let mut b = sized(1, 1);
        b.scaling_mode(ScalingMode::ProgressiveBilinear).unwrap();
        assert_eq!(b.build().unwrap().resizer, Some(Resizer::PROGRESSIVE));
    }

    #[test]
    fn filters_keep_insertion_order() {
        let mut b = sized(1, 1);
        b.rotate(90).unwrap();
        b.rotate(180).unwrap();
        let p = b.build().unwrap();
        assert_eq!(p.filters.len(), 2);
    }

    // =========================================================================
    // resize_dimensions
    // =========================================================================

    #[test]
    fn dimensions_fit_within_size() {
        let p = sized(200, 200).build().unwrap();
        assert_eq!(p.resize_dimensions((800, 600)), (200, 150));
    }

    #[test]
    fn dimensions_forced() {
        let mut b = ParameterBuilder::new();
        b.force_size(100, 30).unwrap();
        assert_eq!(b.build().unwrap().resize_dimensions((800, 600)), (100, 30));
    }

    #[test]
    fn dimensions_single_edge() {
        let mut b = ParameterBuilder::new();
        b.height(300).unwrap();
        assert_eq!(b.build().unwrap().resize_dimensions((1000, 750)), (400, 300));
    }

    #[test]
    fn dimensions_scaled() {
        let mut b = ParameterBuilder::new();
        b.scale_xy(0.5, 0.25).unwrap();
        assert_eq!(b.build().unwrap().resize_dimensions((100, 100)), (50, 25));
    }

    #[test]
    fn dimensions_fill_for_crop() {
        let mut b = sized(400, 500);
        b.crop(Position::Center).unwrap();
        assert_eq!(b.build().unwrap().resize_dimensions((800, 600)), (667, 500));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: with the aspect ratio kept, the constraining axis wins.
            #[test]
            fn prop_aspect_ratio_scale(
                src_w in 1u32..4000,
                src_h in 1u32..4000,
                tgt_w in 1u32..1000,
                tgt_h in 1u32..1000,
            ) {
                let p = sized(tgt_w, tgt_h).build().unwrap();
                let (w, h) = p.resize_dimensions((src_w, src_h));
                let scale = (f64::from(tgt_w) / f64::from(src_w))
                    .min(f64::from(tgt_h) / f64::from(src_h));
                prop_assert_eq!(w, ((f64::from(src_w) * scale).round() as u32).max(1));
                prop_assert_eq!(h, ((f64::from(src_h) * scale).round() as u32).max(1));
            }
        }
    }
}
