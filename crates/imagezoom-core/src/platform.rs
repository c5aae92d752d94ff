//! Platform abstraction consumed by the zoom controller.
//!
//! The controller never touches a document directly. Everything it needs
//! from the host (geometry, style mutation, frame and timer scheduling,
//! transition completion, image loading) goes through [`Platform`], so the
//! same state machine drives a browser page or a headless test tree.

use std::fmt;

use crate::geometry::{Rect, Size, ZoomTransform};

/// Deferred work handed to the platform. Each callback runs at most once.
pub type Callback = Box<dyn FnOnce() + 'static>;

/// Opaque handle for a node in the host document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by [`Platform::set_timeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

/// Host services for the zoom controller.
///
/// Scheduling methods must never run their callback synchronously; the
/// controller relies on callbacks arriving on a later turn of the host event
/// loop, outside any of its own borrows.
pub trait Platform: 'static {
    /// Current on-screen rectangle of `node`.
    fn bounding_rect(&self, node: NodeId) -> Rect;

    fn viewport_size(&self) -> Size;

    /// Vertical scroll offset of the page.
    fn scroll_offset(&self) -> f32;

    /// Monotonic time in milliseconds.
    fn now_ms(&self) -> f64;

    fn request_animation_frame(&self, callback: Callback);

    /// Runs `callback` once, when the next transition on `node` completes.
    fn on_transition_end(&self, node: NodeId, callback: Callback);

    fn set_timeout(&self, callback: Callback, delay_ms: u32) -> TimerId;

    fn clear_timeout(&self, timer: TimerId);

    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn remove_attribute(&self, node: NodeId, name: &str);

    fn add_class(&self, node: NodeId, class: &str);

    fn remove_class(&self, node: NodeId, class: &str);

    /// Forces a synchronous layout of `node` so the next style change is
    /// animated instead of applied in the same frame.
    fn force_layout(&self, node: NodeId);

    fn set_transform(&self, node: NodeId, transform: &ZoomTransform);

    /// The low-resolution image content shown inside `node`.
    fn image_of(&self, node: NodeId) -> Option<NodeId>;

    fn set_image_source(&self, image: NodeId, url: &str);

    /// Starts loading `url`; `on_load` runs once the image is available.
    /// Failed loads never call back.
    fn load_image(&self, url: &str, on_load: Callback);
}
