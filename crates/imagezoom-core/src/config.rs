//! Construction-time settings for [`ImageZoom`](crate::ImageZoom).

/// CSS classes toggled on an element as it moves through a zoom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoomClasses {
    /// Present from the start of a zoom-in until the zoom-out completes.
    pub active: String,
    /// Present while the zoom-in transition runs.
    pub zooming: String,
    /// Present while the element rests in its zoomed state.
    pub zoomed: String,
}

impl Default for ZoomClasses {
    fn default() -> Self {
        Self {
            active: "is-active".into(),
            zooming: "is-zooming".into(),
            zoomed: "is-zoomed".into(),
        }
    }
}

/// Configuration for a zoom controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomConfig {
    /// Margin in pixels kept free around a zoomed image, and the scroll or
    /// resize distance that dismisses it.
    pub offset: f32,
    /// Quiet period before a resize refreshes the viewport cache.
    pub resize_debounce_ms: u32,
    /// Minimum spacing between scroll refreshes. `None` refreshes once per
    /// animation frame.
    pub scroll_throttle_ms: Option<u32>,
    /// Delay between `zoomInEnd` and the high-resolution load, leaving the
    /// end of the transition to paint undisturbed.
    pub promotion_delay_ms: u32,
    /// Attribute whose presence marks a node as a zoom target.
    pub marker_attribute: String,
    pub classes: ZoomClasses,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            offset: 60.0,
            resize_debounce_ms: 250,
            scroll_throttle_ms: None,
            promotion_delay_ms: 0,
            marker_attribute: "data-zoomable".into(),
            classes: ZoomClasses::default(),
        }
    }
}

impl ZoomConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_resize_debounce(mut self, wait_ms: u32) -> Self {
        self.resize_debounce_ms = wait_ms;
        self
    }

    pub fn with_scroll_throttle(mut self, wait_ms: u32) -> Self {
        self.scroll_throttle_ms = Some(wait_ms);
        self
    }

    pub fn with_promotion_delay(mut self, delay_ms: u32) -> Self {
        self.promotion_delay_ms = delay_ms;
        self
    }

    pub fn with_marker_attribute(mut self, name: impl Into<String>) -> Self {
        self.marker_attribute = name.into();
        self
    }

    pub fn with_classes(mut self, classes: ZoomClasses) -> Self {
        self.classes = classes;
        self
    }
}
