//! Placement geometry for thumbnails and overlays.
//!
//! Everything here is a pure function of its arguments: no images, no I/O.
//!
//! - [`Size`]: absolute or relative inner dimensions.
//! - [`Position`]: where an inner rectangle sits inside an enclosing one.
//! - [`Region`]: a `Position` plus a `Size`, clamped to the outer bounds.
//! - [`Rect`]: the clamped rectangle those calculations produce.

mod position;
mod region;
mod size;

pub use position::{Insets, Point, Position};
pub use region::Region;
pub use size::Size;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Width and height must be greater than zero (got {width}x{height}).")]
    InvalidDimension { width: i64, height: i64 },
    #[error("Scaling factor must be between 0.0 and 1.0 (got {0}).")]
    InvalidFactor(f64),
}

/// Reject non-positive dimensions.
pub(crate) fn check_dimensions(width: i64, height: i64) -> Result<(), GeometryError> {
    if width <= 0 || height <= 0 {
        return Err(GeometryError::InvalidDimension { width, height });
    }
    Ok(())
}

/// An axis-aligned rectangle with its origin inside the outer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect a possibly out-of-bounds rectangle with `(0, 0, outer_w, outer_h)`.
    ///
    /// Partial overlap is truncated. No overlap at all yields a zero-area
    /// rectangle whose origin is clamped into the outer bounds.
    pub fn clamp_to(
        outer_width: u32,
        outer_height: u32,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) -> Rect {
        let (left, right) = clamp_span(x, width, outer_width);
        let (top, bottom) = clamp_span(y, height, outer_height);
        Rect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// Clamp `[start, start + len)` to `[0, outer)`, returning `(from, to)`.
fn clamp_span(start: i64, len: i64, outer: u32) -> (u32, u32) {
    let outer = i64::from(outer);
    let from = start.clamp(0, outer);
    let to = start.saturating_add(len.max(0)).clamp(from, outer);
    (from as u32, to as u32)
}
