//! Bitmap-to-bitmap transforms applied after resizing.
//!
//! Filters run strictly in insertion order. Each one receives the output of
//! the previous and may change its dimensions (a [`Canvas`] adding a band
//! for a caption, a [`Rotation`] swapping axes).
//!
//! Overlays ([`Watermark`], [`Caption`]) are placed with
//! [`Position`](crate::geometry::Position) and clipped with
//! [`Rect::clamp_to`](crate::geometry::Rect::clamp_to), so overlay content
//! larger than the thumbnail is cropped instead of failing.

mod canvas;
mod overlay;
mod transform;

pub use canvas::Canvas;
pub use overlay::{Caption, FilterError, Watermark};
pub use transform::{Colorize, Flip, Rotation, Transparency};

use crate::geometry::{Point, Rect};
use image::{ColorType, DynamicImage, ImageBuffer, Pixel, Primitive, Rgba, Rgba32FImage, RgbaImage};
use std::fmt;
use std::sync::Arc;

/// A pure transform of a thumbnail bitmap.
pub trait ImageFilter: Send + Sync + fmt::Debug {
    fn apply(&self, image: &DynamicImage) -> DynamicImage;
}

/// An ordered chain of filters.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    filters: Vec<Arc<dyn ImageFilter>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: Arc<dyn ImageFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ImageFilter for Pipeline {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let Some((first, rest)) = self.filters.split_first() else {
            return image.clone();
        };
        rest.iter()
            .fold(first.apply(image), |current, filter| filter.apply(&current))
    }
}

/// A channel sample the filters can blend, normalised to `0.0..=1.0`.
pub(crate) trait Channel: Primitive {
    fn to_unit(self) -> f32;
    fn from_unit(value: f32) -> Self;
}

impl Channel for u8 {
    fn to_unit(self) -> f32 {
        f32::from(self) / 255.0
    }

    fn from_unit(value: f32) -> Self {
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Channel for u16 {
    fn to_unit(self) -> f32 {
        f32::from(self) / 65535.0
    }

    fn from_unit(value: f32) -> Self {
        (value.clamp(0.0, 1.0) * 65535.0).round() as u16
    }
}

impl Channel for f32 {
    fn to_unit(self) -> f32 {
        self
    }

    fn from_unit(value: f32) -> Self {
        value.clamp(0.0, 1.0)
    }
}

pub(crate) type RgbaBuffer<S> = ImageBuffer<Rgba<S>, Vec<S>>;

/// Alpha-blend `overlay` onto `base` with its top-left corner at `at`.
///
/// Only the part of the overlay inside `base` is drawn.
pub(crate) fn composite<S: Channel>(
    base: &mut RgbaBuffer<S>,
    overlay: &RgbaBuffer<S>,
    at: Point,
    opacity: f32,
) where
    Rgba<S>: Pixel<Subpixel = S>,
{
    let visible = Rect::clamp_to(
        base.width(),
        base.height(),
        at.x,
        at.y,
        i64::from(overlay.width()),
        i64::from(overlay.height()),
    );
    if visible.is_empty() {
        return;
    }

    let offset_x = (i64::from(visible.x) - at.x) as u32;
    let offset_y = (i64::from(visible.y) - at.y) as u32;
    for dy in 0..visible.height {
        for dx in 0..visible.width {
            let src = overlay.get_pixel(offset_x + dx, offset_y + dy);
            let dst = base.get_pixel_mut(visible.x + dx, visible.y + dy);
            *dst = blend(*dst, *src, opacity);
        }
    }
}

/// Source-over blend of `src` (scaled by `opacity`) onto `dst`.
pub(crate) fn blend<S: Channel>(dst: Rgba<S>, src: Rgba<S>, opacity: f32) -> Rgba<S> {
    let src_a = src.0[3].to_unit() * opacity;
    let dst_a = dst.0[3].to_unit();
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([S::from_unit(0.0); 4]);
    }
    let channel = |i: usize| {
        S::from_unit(
            (src.0[i].to_unit() * src_a + dst.0[i].to_unit() * dst_a * (1.0 - src_a)) / out_a,
        )
    };
    Rgba([channel(0), channel(1), channel(2), S::from_unit(out_a)])
}

/// Bytes per channel sample of `image`.
fn channel_bytes(image: &DynamicImage) -> u8 {
    let color = image.color();
    color.bytes_per_pixel() / color.channel_count()
}

/// An RGBA working copy at the sample depth of the image it was made for.
#[derive(Debug, Clone)]
pub(crate) enum Layer {
    Rgba8(RgbaImage),
    Rgba16(RgbaBuffer<u16>),
    Rgba32F(Rgba32FImage),
}

impl Layer {
    pub(crate) fn of(image: &DynamicImage) -> Self {
        match channel_bytes(image) {
            1 => Layer::Rgba8(image.to_rgba8()),
            2 => Layer::Rgba16(image.to_rgba16()),
            _ => Layer::Rgba32F(image.to_rgba32f()),
        }
    }

    /// A `width` x `height` layer of `color` at the depth of `like`.
    pub(crate) fn filled(like: &DynamicImage, width: u32, height: u32, color: Rgba<u8>) -> Self {
        let fill = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color));
        match channel_bytes(like) {
            1 => Layer::Rgba8(fill.into_rgba8()),
            2 => Layer::Rgba16(fill.to_rgba16()),
            _ => Layer::Rgba32F(fill.to_rgba32f()),
        }
    }

    /// Composite `overlay`, converted to this layer's depth.
    pub(crate) fn draw(&mut self, overlay: &DynamicImage, at: Point, opacity: f32) {
        match self {
            Layer::Rgba8(base) => composite(base, &overlay.to_rgba8(), at, opacity),
            Layer::Rgba16(base) => composite(base, &overlay.to_rgba16(), at, opacity),
            Layer::Rgba32F(base) => composite(base, &overlay.to_rgba32f(), at, opacity),
        }
    }

    /// Rewrite every pixel through `f`, in normalised RGBA.
    pub(crate) fn map(&mut self, f: impl Fn([f32; 4]) -> [f32; 4]) {
        fn each<S: Channel>(buffer: &mut RgbaBuffer<S>, f: &impl Fn([f32; 4]) -> [f32; 4])
        where
            Rgba<S>: Pixel<Subpixel = S>,
        {
            for px in buffer.pixels_mut() {
                px.0 = f(px.0.map(S::to_unit)).map(S::from_unit);
            }
        }
        match self {
            Layer::Rgba8(buffer) => each(buffer, &f),
            Layer::Rgba16(buffer) => each(buffer, &f),
            Layer::Rgba32F(buffer) => each(buffer, &f),
        }
    }

    /// The layer as-is, alpha included.
    pub(crate) fn into_dynamic(self) -> DynamicImage {
        match self {
            Layer::Rgba8(buffer) => DynamicImage::ImageRgba8(buffer),
            Layer::Rgba16(buffer) => DynamicImage::ImageRgba16(buffer),
            Layer::Rgba32F(buffer) => DynamicImage::ImageRgba32F(buffer),
        }
    }

    /// The layer converted back to the color type of `original`.
    pub(crate) fn into_color_of(self, original: &DynamicImage) -> DynamicImage {
        let layer = self.into_dynamic();
        match original.color() {
            ColorType::L8 => DynamicImage::ImageLuma8(layer.to_luma8()),
            ColorType::La8 => DynamicImage::ImageLumaA8(layer.to_luma_alpha8()),
            ColorType::Rgb8 => DynamicImage::ImageRgb8(layer.to_rgb8()),
            ColorType::L16 => DynamicImage::ImageLuma16(layer.to_luma16()),
            ColorType::La16 => DynamicImage::ImageLumaA16(layer.to_luma_alpha16()),
            ColorType::Rgb16 => DynamicImage::ImageRgb16(layer.to_rgb16()),
            ColorType::Rgb32F => DynamicImage::ImageRgb32F(layer.to_rgb32f()),
            _ => layer,
        }
    }
}
