//! Geometric primitives: Point, Size, Rect, and the zoom transform.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Shrinks both dimensions by `amount`.
    pub fn inset(&self, amount: f32) -> Self {
        Self {
            width: self.width - amount,
            height: self.height - amount,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// On-screen rectangle. `x` is the left edge and `y` the top edge, both in
/// CSS pixels relative to the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Translation plus uniform scale applied to a zooming element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Where the element's rectangle ends up once the transform is applied.
    ///
    /// Scaling happens around the element's center, matching the default
    /// CSS `transform-origin`.
    pub fn apply(&self, rect: Rect) -> Rect {
        let center = rect.center();
        let width = rect.width * self.scale;
        let height = rect.height * self.scale;
        Rect::new(
            center.x + self.translate_x - width / 2.0,
            center.y + self.translate_y - height / 2.0,
            width,
            height,
        )
    }

    /// CSS `transform` value. The identity maps to an empty string, which
    /// clears the inline style and lets the element fall back to its
    /// stylesheet position.
    pub fn to_css(&self) -> String {
        if self.is_identity() {
            String::new()
        } else {
            self.to_string()
        }
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for ZoomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate3d({}px, {}px, 0) scale({})",
            self.translate_x, self.translate_y, self.scale
        )
    }
}
