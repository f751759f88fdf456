//! Inner dimensions derived from an enclosing extent.

use super::{GeometryError, check_dimensions};

/// How big an inner rectangle is relative to its enclosing one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Size {
    /// Fixed dimensions regardless of the enclosing extent.
    Absolute { width: u32, height: u32 },
    /// A fraction in `0.0..=1.0` of the enclosing extent.
    Relative(f64),
}

impl Size {
    /// Fixed `width` × `height`. Both must be non-zero.
    pub fn absolute(width: u32, height: u32) -> Result<Self, GeometryError> {
        check_dimensions(i64::from(width), i64::from(height))?;
        Ok(Size::Absolute { width, height })
    }

    /// A scaling factor applied to both axes of the enclosing extent.
    pub fn relative(factor: f64) -> Result<Self, GeometryError> {
        if !(0.0..=1.0).contains(&factor) {
            return Err(GeometryError::InvalidFactor(factor));
        }
        Ok(Size::Relative(factor))
    }

    /// Compute `(width, height)` inside an enclosing `width` × `height`.
    ///
    /// Relative sizes round half up, so a 0.5 factor over 5px gives 3px.
    pub fn calculate(
        &self,
        enclosing_width: u32,
        enclosing_height: u32,
    ) -> Result<(u32, u32), GeometryError> {
        check_dimensions(i64::from(enclosing_width), i64::from(enclosing_height))?;
        Ok(match *self {
            Size::Absolute { width, height } => (width, height),
            Size::Relative(factor) => (
                scale_round(enclosing_width, factor),
                scale_round(enclosing_height, factor),
            ),
        })
    }
}

fn scale_round(extent: u32, factor: f64) -> u32 {
    (f64::from(extent) * factor + 0.5).floor() as u32
}
