//! Platform-independent core of an image zoom widget.
//!
//! Clicking a registered thumbnail animates it to the viewport center,
//! scaled toward its declared full resolution, and swaps in the
//! high-resolution asset once the transition settles. Escape, scrolling or
//! resizing past a threshold dismiss it again; the arrow keys step through
//! the registered sequence.
//!
//! The host (a browser page, or the headless tree in `imagezoom-testing`)
//! implements [`Platform`] and forwards input to [`ImageZoom`].

mod bus;
mod cache;
mod calculator;
mod config;
mod controller;
mod delegate;
mod error;
mod geometry;
mod key;
mod platform;
mod promotion;
mod timing;

pub mod collections;

pub use bus::{EventBus, Subscription, ZoomTopic};
pub use cache::{SessionSnapshot, ViewportCache};
pub use calculator::{calculate_zoom, scale_factor};
pub use config::{ZoomClasses, ZoomConfig};
pub use controller::{
    declared_size, ImageZoom, ZoomPhase, HEIGHT_ATTRIBUTE, SOURCE_ATTRIBUTE, WIDTH_ATTRIBUTE,
};
pub use delegate::closest;
pub use error::ZoomError;
pub use geometry::{Point, Rect, Size, ZoomTransform};
pub use key::Key;
pub use platform::{Callback, NodeId, Platform, TimerId};
pub use promotion::{has_allowed_extension, ALLOWED_EXTENSIONS, RESPONSIVE_ATTRIBUTES};
pub use timing::{Debounce, FrameGate, Throttle, ThrottleDecision};

pub mod prelude {
    pub use crate::bus::ZoomTopic;
    pub use crate::config::ZoomConfig;
    pub use crate::controller::{ImageZoom, ZoomPhase};
    pub use crate::geometry::{Rect, Size};
    pub use crate::key::Key;
    pub use crate::platform::{NodeId, Platform};
}
