use crate::geometry::Size;
use crate::platform::Platform;

/// Last known viewport size and scroll position.
///
/// Owned by one controller; refreshed only by its resize and scroll
/// handlers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportCache {
    pub viewport: Size,
    pub last_scroll_y: f32,
}

impl ViewportCache {
    pub fn capture<P: Platform>(platform: &P) -> Self {
        Self {
            viewport: platform.viewport_size(),
            last_scroll_y: platform.scroll_offset(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            initial_scroll_y: self.last_scroll_y,
            initial_viewport: self.viewport,
        }
    }
}

/// Scroll and viewport state at the moment an element started zooming in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub initial_scroll_y: f32,
    pub initial_viewport: Size,
}

impl SessionSnapshot {
    pub fn scroll_exceeded(&self, scroll_y: f32, offset: f32) -> bool {
        (self.initial_scroll_y - scroll_y).abs() >= offset
    }

    pub fn resize_exceeded(&self, viewport: Size, offset: f32) -> bool {
        (self.initial_viewport.width - viewport.width).abs() >= offset
            || (self.initial_viewport.height - viewport.height).abs() >= offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            initial_scroll_y: 200.0,
            initial_viewport: Size::new(1000.0, 800.0),
        }
    }

    #[test]
    fn scroll_threshold_is_inclusive_in_both_directions() {
        let snapshot = snapshot();
        assert!(!snapshot.scroll_exceeded(259.0, 60.0));
        assert!(snapshot.scroll_exceeded(260.0, 60.0));
        assert!(snapshot.scroll_exceeded(140.0, 60.0));
        assert!(!snapshot.scroll_exceeded(141.0, 60.0));
    }

    #[test]
    fn resize_threshold_checks_either_dimension() {
        let snapshot = snapshot();
        assert!(!snapshot.resize_exceeded(Size::new(950.0, 760.0), 60.0));
        assert!(snapshot.resize_exceeded(Size::new(940.0, 800.0), 60.0));
        assert!(snapshot.resize_exceeded(Size::new(1000.0, 870.0), 60.0));
    }
}
