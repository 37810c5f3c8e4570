//! Depth shading. Row 0 is the far edge of the terrain, the last row the
//! near edge.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Normalized depth of a row: 0 at the back, 1 at the front.
pub fn row_depth(row: usize, total_rows: usize) -> f64 {
    let denom = total_rows.saturating_sub(1).max(1);
    (row as f64 / denom as f64).clamp(0.0, 1.0)
}

/// Brightness multiplier in `[0.2, 1.0]`: `0.2 + depth^0.7 * 0.8`.
pub fn row_brightness(row: usize, total_rows: usize) -> f64 {
    0.8f64.mul_add(row_depth(row, total_rows).powf(0.7), 0.2)
}

/// Per-row transform applied by the view to fake a tilted plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Perspective {
    /// Horizontal scale (far rows narrower).
    pub scale_x: f64,
    /// Rotation around the X axis in degrees (far rows steeper).
    pub rotate_x_deg: f64,
    /// Row opacity.
    pub opacity: f64,
    /// Vertical shift in pixels; far rows are pulled together.
    pub offset_y_px: f64,
}

/// Perspective for `row` of `total_rows`.
pub fn row_perspective(row: usize, total_rows: usize) -> Perspective {
    let far = 1.0 - row_depth(row, total_rows);
    Perspective {
        scale_x: 0.3f64.mul_add(-far, 1.0),
        rotate_x_deg: 25.0f64.mul_add(far, 10.0),
        opacity: 0.55f64.mul_add(-far, 1.0),
        offset_y_px: -6.0 * far,
    }
}
