//! 2D box geometry for rotation-derived images.
//!
//! When the renderer rotates an image without cropping, the canvas grows to
//! hold the rotated corners and every annotated box has to be re-derived:
//! the box corners rotate about the original canvas center, land in the
//! larger derived canvas, and the new annotation is the axis-aligned hull of
//! the rotated corners, renormalized against the derived canvas size.
//!
//! All functions here are pure; no I/O.

use crate::label::{LabeledBox, MIN_BOX_SIZE};

/// Transform one normalized box from an original canvas into the canvas of
/// a rotated derivative of that image.
///
/// Positive angles follow the renderer's rotation convention, pinned by the
/// off-center marker fixture test in this module: in the y-down pixel frame
/// the standard rotation matrix is applied to center-relative corners.
///
/// The output always satisfies the normalized-box invariants: the center is
/// clamped to `[0, 1]` and the size to `[MIN_BOX_SIZE, 1]`. Clamping is a
/// deliberate lossy policy for boxes that would spill past the derived
/// canvas, not an error path.
///
/// # Panics
///
/// Panics if any canvas dimension is zero; that is a caller bug, not bad
/// input data.
pub fn transform_box(
    bx: &LabeledBox,
    angle_degrees: f64,
    orig_w: u32,
    orig_h: u32,
    derived_w: u32,
    derived_h: u32,
) -> LabeledBox {
    transform_box_with_min(
        bx,
        angle_degrees,
        orig_w,
        orig_h,
        derived_w,
        derived_h,
        MIN_BOX_SIZE,
    )
}

/// [`transform_box`] with an explicit minimum output box size.
#[allow(clippy::too_many_arguments)]
pub fn transform_box_with_min(
    bx: &LabeledBox,
    angle_degrees: f64,
    orig_w: u32,
    orig_h: u32,
    derived_w: u32,
    derived_h: u32,
    min_size: f64,
) -> LabeledBox {
    assert!(
        orig_w > 0 && orig_h > 0 && derived_w > 0 && derived_h > 0,
        "canvas dimensions must be positive (got {orig_w}x{orig_h} -> {derived_w}x{derived_h})"
    );

    let (ow, oh) = (orig_w as f64, orig_h as f64);
    let (dw, dh) = (derived_w as f64, derived_h as f64);

    // Pixel-space center and half extents in the original frame.
    let px = bx.cx * ow;
    let py = bx.cy * oh;
    let hw = bx.w * ow / 2.0;
    let hh = bx.h * oh / 2.0;

    let corners = [
        (px - hw, py - hh),
        (px + hw, py - hh),
        (px + hw, py + hh),
        (px - hw, py + hh),
    ];

    let rad = angle_degrees.to_radians();
    let (sin_a, cos_a) = rad.sin_cos();

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for (x, y) in corners {
        // Rotate about the original canvas center, then re-center on the
        // derived canvas. The second translation is what absorbs canvas growth.
        let dx = x - ow / 2.0;
        let dy = y - oh / 2.0;
        let rx = dx * cos_a - dy * sin_a + dw / 2.0;
        let ry = dx * sin_a + dy * cos_a + dh / 2.0;

        min_x = min_x.min(rx);
        min_y = min_y.min(ry);
        max_x = max_x.max(rx);
        max_y = max_y.max(ry);
    }

    let cx = ((min_x + max_x) / 2.0 / dw).clamp(0.0, 1.0);
    let cy = ((min_y + max_y) / 2.0 / dh).clamp(0.0, 1.0);
    let w = ((max_x - min_x) / dw).clamp(min_size, 1.0);
    let h = ((max_y - min_y) / dh).clamp(min_size, 1.0);

    LabeledBox::new(bx.class_id, cx, cy, w, h)
}

/// Pixel dimensions of the canvas produced by rotating a `w`x`h` image
/// without cropping: the rotated extents, rounded up.
///
/// This mirrors the renderer's growth rule and exists mainly so tests can
/// build fixtures with realistic derived sizes; the pipeline itself always
/// queries dimensions from the rendered image file.
pub fn rotated_canvas_size(w: u32, h: u32, angle_degrees: f64) -> (u32, u32) {
    let rad = angle_degrees.to_radians();
    let (sin_a, cos_a) = (rad.sin().abs(), rad.cos().abs());
    // The epsilon keeps exact multiples of 90 degrees from rounding up a
    // whole pixel on account of floating error in sin/cos.
    let rw = (w as f64 * cos_a + h as f64 * sin_a - 1e-6).ceil() as u32;
    let rh = (w as f64 * sin_a + h as f64 * cos_a - 1e-6).ceil() as u32;
    (rw.max(1), rh.max(1))
}
