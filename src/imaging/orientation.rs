//! EXIF orientation as it affects region placement.

use image::metadata::Orientation;

/// How stored pixels relate to display orientation, in the terms
/// [`Region::calculate`](crate::geometry::Region::calculate) takes:
/// `(flip_horizontal, flip_vertical, swap_dims)`.
///
/// A region laid out on the displayed image lands on the same pixels of the
/// stored image once these are applied.
pub fn region_flags(orientation: Orientation) -> (bool, bool, bool) {
    match orientation {
        Orientation::NoTransforms => (false, false, false),
        Orientation::FlipHorizontal => (true, false, false),
        Orientation::FlipVertical => (false, true, false),
        Orientation::Rotate180 => (true, true, false),
        Orientation::Rotate90 => (false, true, true),
        Orientation::Rotate270 => (true, false, true),
        Orientation::Rotate90FlipH => (false, false, true),
        Orientation::Rotate270FlipH => (true, true, true),
    }
}
