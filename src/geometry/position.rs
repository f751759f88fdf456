//! Anchor positions for placing one rectangle inside another.
//!
//! Centering uses truncating integer division on each extent separately,
//! `enclosing / 2 - inner / 2`. With odd remainders that can land one pixel
//! left of (or above) true center; existing thumbnails depend on it.

use super::{GeometryError, check_dimensions};
use serde::{Deserialize, Serialize};

/// Top-left corner of a placed rectangle. May be negative or past the
/// enclosing bounds when the inner rectangle does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Margins kept between an anchored edge and the enclosing edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Insets {
    /// The same inset on all four sides.
    pub fn uniform(inset: u32) -> Self {
        Self {
            left: inset,
            right: inset,
            top: inset,
            bottom: inset,
        }
    }
}

/// Where an inner rectangle is placed inside an enclosing rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    /// Absolute placement; every other argument is ignored.
    Coordinate { x: i64, y: i64 },
}

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Position {
    /// All nine fixed anchors, row by row from the top left.
    pub const ANCHORS: [Position; 9] = [
        Position::TopLeft,
        Position::TopCenter,
        Position::TopRight,
        Position::CenterLeft,
        Position::Center,
        Position::CenterRight,
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ];

    /// Parse a kebab-case anchor name such as `bottom-right`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ANCHORS
            .into_iter()
            .find(|p| p.name() == Some(name.to_ascii_lowercase().as_str()))
    }

    /// Kebab-case name of a fixed anchor; `None` for coordinates.
    pub fn name(&self) -> Option<&'static str> {
        Some(match self {
            Position::TopLeft => "top-left",
            Position::TopCenter => "top-center",
            Position::TopRight => "top-right",
            Position::CenterLeft => "center-left",
            Position::Center => "center",
            Position::CenterRight => "center-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomCenter => "bottom-center",
            Position::BottomRight => "bottom-right",
            Position::Coordinate { .. } => return None,
        })
    }

    /// Top-left point of an `inner_width` × `inner_height` rectangle placed
    /// inside `enclosing_width` × `enclosing_height`.
    ///
    /// Insets apply to anchored edges only; a centered axis ignores them.
    /// Nothing is clamped here, see [`Region`](super::Region) for that.
    pub fn calculate(
        &self,
        enclosing_width: u32,
        enclosing_height: u32,
        inner_width: u32,
        inner_height: u32,
        insets: Insets,
    ) -> Result<Point, GeometryError> {
        use Anchor::*;
        let (horizontal, vertical) = match *self {
            Position::Coordinate { x, y } => return Ok(Point { x, y }),
            Position::TopLeft => (Start, Start),
            Position::TopCenter => (Middle, Start),
            Position::TopRight => (End, Start),
            Position::CenterLeft => (Start, Middle),
            Position::Center => (Middle, Middle),
            Position::CenterRight => (End, Middle),
            Position::BottomLeft => (Start, End),
            Position::BottomCenter => (Middle, End),
            Position::BottomRight => (End, End),
        };
        check_dimensions(i64::from(enclosing_width), i64::from(enclosing_height))?;
        check_dimensions(i64::from(inner_width), i64::from(inner_height))?;

        Ok(Point {
            x: place(
                horizontal,
                enclosing_width,
                inner_width,
                insets.left,
                insets.right,
            ),
            y: place(
                vertical,
                enclosing_height,
                inner_height,
                insets.top,
                insets.bottom,
            ),
        })
    }
}

fn place(anchor: Anchor, enclosing: u32, inner: u32, inset_start: u32, inset_end: u32) -> i64 {
    let (enclosing, inner) = (i64::from(enclosing), i64::from(inner));
    match anchor {
        Anchor::Start => i64::from(inset_start),
        Anchor::Middle => enclosing / 2 - inner / 2,
        Anchor::End => enclosing - inner - i64::from(inset_end),
    }
}
