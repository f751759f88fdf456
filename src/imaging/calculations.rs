//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Every result is at least 1×1.

/// Round half up, as pixel extents are always positive.
fn round_px(value: f64) -> u32 {
    ((value + 0.5).floor() as u32).max(1)
}

/// Scale `source` to fit inside `target` while keeping its aspect ratio.
///
/// The constraining axis wins: the factor applied to both axes is
/// `min(target_w / source_w, target_h / source_h)`.
///
/// # Examples
/// ```
/// # use simple_thumbs::imaging::calculate_fit_dimensions;
/// // 800x600 into 200x200 → width constrains → 200x150
/// assert_eq!(calculate_fit_dimensions((800, 600), (200, 200)), (200, 150));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (f64::from(source.0), f64::from(source.1));
    let scale = (f64::from(target.0) / src_w).min(f64::from(target.1) / src_h);
    (round_px(src_w * scale), round_px(src_h * scale))
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = f64::from(src_w) / f64::from(src_h);
    let tgt_aspect = f64::from(tgt_w) / f64::from(tgt_h);

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        (round_px(f64::from(tgt_h) * src_aspect), tgt_h)
    } else {
        // Source is taller: width will match, height will exceed
        (tgt_w, round_px(f64::from(tgt_w) / src_aspect))
    }
}

/// Scale only the given edge, deriving the other from the source aspect ratio.
pub fn calculate_width_bound(source: (u32, u32), width: u32) -> (u32, u32) {
    let scale = f64::from(width) / f64::from(source.0);
    (width, round_px(f64::from(source.1) * scale))
}

/// Height-bound counterpart of [`calculate_width_bound`].
pub fn calculate_height_bound(source: (u32, u32), height: u32) -> (u32, u32) {
    let scale = f64::from(height) / f64::from(source.1);
    (round_px(f64::from(source.0) * scale), height)
}

/// Apply independent scaling factors to each axis.
pub fn calculate_scaled_dimensions(source: (u32, u32), factor_x: f64, factor_y: f64) -> (u32, u32) {
    (
        round_px(f64::from(source.0) * factor_x),
        round_px(f64::from(source.1) * factor_y),
    )
}

/// Intermediate sizes visited by progressive downscaling from `source` to `target`.
///
/// Each step halves both axes (rounding up) but never goes below the target,
/// so no single pass shrinks an axis by more than 2×. The target itself is the
/// last entry whenever any axis had to shrink; the list is empty otherwise.
pub fn progressive_steps(source: (u32, u32), target: (u32, u32)) -> Vec<(u32, u32)> {
    let (target_w, target_h) = target;
    let (mut w, mut h) = source;
    let mut steps = Vec::new();

    while w > target_w || h > target_h {
        w = w.div_ceil(2).max(target_w);
        h = h.div_ceil(2).max(target_h);
        steps.push((w, h));
    }

    steps
}
