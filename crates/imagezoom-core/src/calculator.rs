//! Translation and scale that bring a thumbnail to the viewport center at
//! (up to) its full resolution.

use crate::geometry::{Rect, Size, ZoomTransform};

/// Computes the transform that centers `thumb` in `viewport` and enlarges it
/// toward `full`, keeping an `offset` pixel margin free along the
/// constraining edge.
pub fn calculate_zoom(full: Size, thumb: Rect, viewport: Size, offset: f32) -> ZoomTransform {
    let viewport_center = viewport.center();
    let thumb_center = thumb.center();

    ZoomTransform {
        translate_x: viewport_center.x - thumb_center.x,
        translate_y: viewport_center.y - thumb_center.y,
        scale: scale_factor(full, thumb.size(), viewport, offset),
    }
}

/// Scale applied to a `thumb`-sized element so it approximates `full`,
/// bounded by `viewport` shrunk by `offset`.
///
/// A degenerate thumbnail (zero or negative extent) yields `1.0`.
pub fn scale_factor(full: Size, thumb: Size, viewport: Size, offset: f32) -> f32 {
    if thumb.width <= 0.0 || thumb.height <= 0.0 {
        return 1.0;
    }

    let bounded = viewport.inset(offset);
    let max_scale = full.width / thumb.width;

    if full.width < bounded.width && full.height < bounded.height {
        max_scale
    } else if thumb.aspect_ratio() < bounded.aspect_ratio() {
        (bounded.height / full.height) * max_scale
    } else {
        (bounded.width / full.width) * max_scale
    }
}

#[cfg(test)]
#[path = "tests/calculator_tests.rs"]
mod tests;
