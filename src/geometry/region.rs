//! A positioned, sized rectangle clamped to its outer bounds.

use super::{GeometryError, Insets, Position, Rect, Size};

/// A [`Position`] plus a [`Size`].
///
/// Regions are expressed in display orientation. When the pixel data is
/// stored rotated or mirrored (EXIF orientation), [`Region::calculate`]
/// maps the rectangle back into stored coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    position: Position,
    size: Size,
}

impl Region {
    pub fn new(position: Position, size: Size) -> Self {
        Self { position, size }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Rectangle of this region inside stored pixel data of `outer_width` ×
    /// `outer_height`.
    ///
    /// - `swap_dims`: the data is stored transposed relative to display, so
    ///   the region is laid out against `outer_height` × `outer_width` and
    ///   its axes are swapped afterwards.
    /// - `flip_horizontal` / `flip_vertical`: mirror the point across the
    ///   stored bounds.
    ///
    /// The result always lies inside `(0, 0, outer_width, outer_height)`;
    /// overflow is truncated and a region entirely outside is empty.
    pub fn calculate(
        &self,
        outer_width: u32,
        outer_height: u32,
        flip_horizontal: bool,
        flip_vertical: bool,
        swap_dims: bool,
    ) -> Result<Rect, GeometryError> {
        let (display_w, display_h) = if swap_dims {
            (outer_height, outer_width)
        } else {
            (outer_width, outer_height)
        };

        let (mut width, mut height) = self.size.calculate(display_w, display_h)?;
        let point = self
            .position
            .calculate(display_w, display_h, width, height, Insets::default())?;
        let (mut x, mut y) = (point.x, point.y);

        if swap_dims {
            std::mem::swap(&mut width, &mut height);
            std::mem::swap(&mut x, &mut y);
        }
        if flip_horizontal {
            x = i64::from(outer_width) - x - i64::from(width);
        }
        if flip_vertical {
            y = i64::from(outer_height) - y - i64::from(height);
        }

        Ok(Rect::clamp_to(
            outer_width,
            outer_height,
            x,
            y,
            i64::from(width),
            i64::from(height),
        ))
    }
}
