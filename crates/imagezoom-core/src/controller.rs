//! The zoom controller.
//!
//! Every registered element moves through
//! `Idle → ZoomingIn → Zoomed → ZoomingOut → Idle`. A zoom spans several
//! turns of the host event loop: the triggering call returns at once, the
//! transform is applied on the next animation frame, and the state settles
//! when the platform reports the end of the CSS transition. While an element
//! is mid-transition every entry point ignores it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::bus::{EventBus, Subscription, ZoomTopic};
use crate::cache::{SessionSnapshot, ViewportCache};
use crate::calculator::calculate_zoom;
use crate::collections::map::{HashMap, HashSet};
use crate::config::ZoomConfig;
use crate::delegate::closest;
use crate::error::ZoomError;
use crate::geometry::{Rect, Size, ZoomTransform};
use crate::key::Key;
use crate::platform::{Callback, NodeId, Platform};
use crate::promotion::{has_allowed_extension, RESPONSIVE_ATTRIBUTES};
use crate::timing::{Debounce, FrameGate, Throttle, ThrottleDecision};

/// Attribute holding the full-resolution asset URL.
pub const SOURCE_ATTRIBUTE: &str = "href";
pub const WIDTH_ATTRIBUTE: &str = "data-width";
pub const HEIGHT_ATTRIBUTE: &str = "data-height";

/// Where a registered element is in its zoom cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomPhase {
    Idle,
    ZoomingIn,
    Zoomed,
    ZoomingOut,
}

impl ZoomPhase {
    pub fn is_animating(self) -> bool {
        matches!(self, ZoomPhase::ZoomingIn | ZoomPhase::ZoomingOut)
    }
}

#[derive(Debug)]
struct ElementState {
    phase: ZoomPhase,
    session: Option<SessionSnapshot>,
}

impl ElementState {
    fn new() -> Self {
        Self {
            phase: ZoomPhase::Idle,
            session: None,
        }
    }
}

#[derive(Debug)]
enum ScrollLimiter {
    Frame(FrameGate),
    Throttle(Throttle),
}

enum ScrollAction {
    RequestFrame,
    RunNow,
    Defer(u32),
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Prev,
    Next,
}

struct ZoomState {
    registered: Vec<NodeId>,
    elements: HashMap<NodeId, ElementState>,
    zoomed: SmallVec<[NodeId; 4]>,
    loaded_images: HashSet<NodeId>,
    loading_images: HashSet<NodeId>,
    cache: ViewportCache,
    dismissal_attached: bool,
    cancel_next_zoom: bool,
    destroyed: bool,
    resize_debounce: Debounce,
    scroll_limiter: ScrollLimiter,
}

impl ZoomState {
    fn phase(&self, node: NodeId) -> Option<ZoomPhase> {
        if self.destroyed {
            return None;
        }
        self.elements.get(&node).map(|element| element.phase)
    }

    fn register(&mut self, node: NodeId) -> bool {
        if self.elements.contains_key(&node) {
            return false;
        }
        self.registered.push(node);
        self.elements.insert(node, ElementState::new());
        true
    }

    /// Top of the zoomed stack together with the snapshot taken when it
    /// zoomed in, if dismissal listeners are attached.
    fn dismissable_top(&self) -> Option<(NodeId, SessionSnapshot)> {
        if self.destroyed || !self.dismissal_attached {
            return None;
        }
        let top = *self.zoomed.last()?;
        let session = self.elements.get(&top)?.session?;
        Some((top, session))
    }
}

struct Shared<P: Platform> {
    platform: P,
    config: ZoomConfig,
    bus: EventBus<ZoomTopic, Option<NodeId>>,
    state: RefCell<ZoomState>,
}

/// Zoom controller for a sequence of registered elements.
///
/// Cloning yields another handle to the same controller. Input from the host
/// arrives through [`handle_click`](Self::handle_click),
/// [`handle_key`](Self::handle_key), [`handle_scroll`](Self::handle_scroll)
/// and [`handle_resize`](Self::handle_resize).
pub struct ImageZoom<P: Platform> {
    shared: Rc<Shared<P>>,
}

impl<P: Platform> Clone for ImageZoom<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P: Platform> ImageZoom<P> {
    pub fn new(platform: P, elements: impl IntoIterator<Item = NodeId>, config: ZoomConfig) -> Self {
        let scroll_limiter = match config.scroll_throttle_ms {
            Some(wait_ms) => ScrollLimiter::Throttle(Throttle::new(wait_ms)),
            None => ScrollLimiter::Frame(FrameGate::new()),
        };
        let mut state = ZoomState {
            registered: Vec::new(),
            elements: HashMap::default(),
            zoomed: SmallVec::new(),
            loaded_images: HashSet::default(),
            loading_images: HashSet::default(),
            cache: ViewportCache::capture(&platform),
            dismissal_attached: false,
            cancel_next_zoom: false,
            destroyed: false,
            resize_debounce: Debounce::new(config.resize_debounce_ms),
            scroll_limiter,
        };
        for node in elements {
            state.register(node);
        }
        log::debug!(
            "image zoom attached to {} elements (offset {})",
            state.registered.len(),
            config.offset
        );

        Self {
            shared: Rc::new(Shared {
                platform,
                config,
                bus: EventBus::new(),
                state: RefCell::new(state),
            }),
        }
    }

    /// Registers one more element at the end of the sequence. Returns false
    /// if it was already registered or the controller is destroyed.
    pub fn attach(&self, node: NodeId) -> bool {
        let mut state = self.shared.state.borrow_mut();
        !state.destroyed && state.register(node)
    }

    pub fn platform(&self) -> &P {
        &self.shared.platform
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.shared.config
    }

    /// Subscribes `listener` to `topic`. The payload is the affected node.
    pub fn on(&self, topic: ZoomTopic, listener: impl Fn(Option<NodeId>) + 'static) -> Subscription {
        if self.is_destroyed() {
            return Subscription::inert();
        }
        self.shared.bus.subscribe(topic, listener)
    }

    pub fn zoom_in(&self, node: NodeId) {
        self.zoom_in_with(node, None);
    }

    pub fn zoom_out(&self, node: NodeId) {
        self.zoom_out_with(node, None);
    }

    /// Zooms `node` out if it rests zoomed, in if it is idle, and ignores it
    /// mid-transition.
    pub fn toggle_zoom(&self, node: NodeId) {
        match self.phase(node) {
            Some(ZoomPhase::Idle) => self.zoom_in(node),
            Some(ZoomPhase::Zoomed) => self.zoom_out(node),
            Some(phase) => log::trace!("toggle ignored for {node} while {phase:?}"),
            None => {}
        }
    }

    pub fn next(&self) {
        self.navigate(Direction::Next);
    }

    pub fn prev(&self) {
        self.navigate(Direction::Prev);
    }

    /// Makes the next [`zoom_in`](Self::zoom_in) stop right after
    /// announcing `zoomInStart`.
    pub fn cancel_current_zoom(&self) {
        let mut state = self.shared.state.borrow_mut();
        if !state.destroyed {
            state.cancel_next_zoom = true;
        }
    }

    /// Unregisters every element and drops all listeners. Callbacks that are
    /// still pending with the platform turn into no-ops.
    pub fn destroy(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            let platform = &self.shared.platform;
            state.destroyed = true;
            state.dismissal_attached = false;
            state.cancel_next_zoom = false;
            state.resize_debounce.cancel(platform);
            if let ScrollLimiter::Throttle(throttle) = &mut state.scroll_limiter {
                throttle.cancel(platform);
            }
            state.registered.clear();
            state.elements.clear();
            state.zoomed.clear();
            state.loading_images.clear();
        }
        self.shared.bus.clear();
        log::debug!("image zoom destroyed");
    }

    /// Resolves a click on `target` to the nearest marked ancestor and
    /// toggles it. Returns true when the click landed on a registered
    /// element, in which case the host should suppress its default action.
    pub fn handle_click(&self, target: NodeId) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let platform = &self.shared.platform;
        let marker = self.shared.config.marker_attribute.as_str();
        let Some(node) = closest(
            target,
            |node| platform.parent_of(node),
            |node| platform.has_attribute(node, marker),
        ) else {
            return false;
        };
        if self.phase(node).is_none() {
            log::trace!("click on unregistered zoom target {node}");
            return false;
        }
        self.toggle_zoom(node);
        true
    }

    /// Keyboard input while an element is zoomed: Escape dismisses the top
    /// of the stack, the arrow keys navigate. Returns true when the host
    /// should suppress the key's default action.
    pub fn handle_key(&self, key: Key) -> bool {
        let top = {
            let state = self.shared.state.borrow();
            if state.destroyed || !state.dismissal_attached {
                return false;
            }
            state.zoomed.last().copied()
        };
        match key {
            Key::Escape => {
                if let Some(top) = top {
                    self.zoom_out(top);
                }
                false
            }
            Key::ArrowLeft => {
                self.prev();
                true
            }
            Key::ArrowRight => {
                self.next();
                true
            }
            Key::Other => false,
        }
    }

    /// The page scrolled. Refreshes the cached scroll position (once per
    /// frame, or per throttle window) and dismisses the zoomed element once
    /// the page has moved `offset` pixels away from where it was zoomed.
    pub fn handle_scroll(&self) {
        let action = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            let now = self.shared.platform.now_ms();
            match &mut state.scroll_limiter {
                ScrollLimiter::Frame(gate) => gate.open().then_some(ScrollAction::RequestFrame),
                ScrollLimiter::Throttle(throttle) => match throttle.poll(now) {
                    ThrottleDecision::Run => Some(ScrollAction::RunNow),
                    ThrottleDecision::Defer(delay) => Some(ScrollAction::Defer(delay)),
                    ThrottleDecision::Skip => None,
                },
            }
        };

        match action {
            Some(ScrollAction::RequestFrame) => {
                let weak = self.downgrade();
                self.shared.platform.request_animation_frame(Box::new(move || {
                    if let Some(zoom) = Self::upgrade(&weak) {
                        if let ScrollLimiter::Frame(gate) =
                            &mut zoom.shared.state.borrow_mut().scroll_limiter
                        {
                            gate.close();
                        }
                        zoom.refresh_scroll();
                    }
                }));
            }
            Some(ScrollAction::RunNow) => self.refresh_scroll(),
            Some(ScrollAction::Defer(delay)) => {
                let weak = self.downgrade();
                let timer = self.shared.platform.set_timeout(
                    Box::new(move || {
                        if let Some(zoom) = Self::upgrade(&weak) {
                            let now = zoom.shared.platform.now_ms();
                            if let ScrollLimiter::Throttle(throttle) =
                                &mut zoom.shared.state.borrow_mut().scroll_limiter
                            {
                                throttle.trailing_fired(now);
                            }
                            zoom.refresh_scroll();
                        }
                    }),
                    delay,
                );
                if let ScrollLimiter::Throttle(throttle) =
                    &mut self.shared.state.borrow_mut().scroll_limiter
                {
                    throttle.set_trailing(timer);
                }
            }
            None => {}
        }
    }

    /// The window resized. After the debounce window the viewport cache is
    /// refreshed and a zoomed element is dismissed if either dimension moved
    /// by `offset` pixels or more.
    pub fn handle_resize(&self) {
        let weak = self.downgrade();
        let mut state = self.shared.state.borrow_mut();
        if state.destroyed {
            return;
        }
        state.resize_debounce.trigger(
            &self.shared.platform,
            Box::new(move || {
                if let Some(zoom) = Self::upgrade(&weak) {
                    zoom.refresh_viewport();
                }
            }),
        );
    }

    pub fn phase(&self, node: NodeId) -> Option<ZoomPhase> {
        self.shared.state.borrow().phase(node)
    }

    pub fn is_animating(&self, node: NodeId) -> bool {
        self.phase(node).is_some_and(ZoomPhase::is_animating)
    }

    pub fn is_zoomed(&self, node: NodeId) -> bool {
        self.phase(node) == Some(ZoomPhase::Zoomed)
    }

    /// Elements that finished zooming in and have not finished zooming out,
    /// oldest first.
    pub fn zoomed_stack(&self) -> Vec<NodeId> {
        self.shared.state.borrow().zoomed.to_vec()
    }

    pub fn registered(&self) -> Vec<NodeId> {
        self.shared.state.borrow().registered.clone()
    }

    pub fn cache(&self) -> ViewportCache {
        self.shared.state.borrow().cache
    }

    /// Whether the high-resolution source was already swapped into `image`.
    pub fn is_promoted(&self, image: NodeId) -> bool {
        self.shared.state.borrow().loaded_images.contains(&image)
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.borrow().destroyed
    }

    fn downgrade(&self) -> Weak<Shared<P>> {
        Rc::downgrade(&self.shared)
    }

    fn upgrade(weak: &Weak<Shared<P>>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    fn emit(&self, topic: ZoomTopic, node: Option<NodeId>) {
        self.shared.bus.publish(topic, node);
    }

    fn zoom_in_with(&self, node: NodeId, then: Option<Callback>) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            let Some(element) = state.elements.get_mut(&node) else {
                log::trace!("zoom in ignored for unregistered {node}");
                return;
            };
            if element.phase != ZoomPhase::Idle {
                log::trace!("zoom in ignored for {node} while {:?}", element.phase);
                return;
            }
            element.phase = ZoomPhase::ZoomingIn;
        }

        self.emit(ZoomTopic::ZoomInStart, Some(node));

        {
            let mut state = self.shared.state.borrow_mut();
            if state.phase(node) != Some(ZoomPhase::ZoomingIn) {
                return;
            }
            if state.cancel_next_zoom {
                state.cancel_next_zoom = false;
                if let Some(element) = state.elements.get_mut(&node) {
                    element.phase = ZoomPhase::Idle;
                }
                log::debug!("zoom in of {node} cancelled");
                return;
            }
        }

        let platform = &self.shared.platform;
        platform.add_class(node, &self.shared.config.classes.active);
        platform.force_layout(node);

        {
            let mut state = self.shared.state.borrow_mut();
            let snapshot = state.cache.snapshot();
            if let Some(element) = state.elements.get_mut(&node) {
                element.session = Some(snapshot);
            }
        }

        let weak = self.downgrade();
        platform.request_animation_frame(Box::new(move || {
            if let Some(zoom) = Self::upgrade(&weak) {
                zoom.begin_zoom_in(node, then);
            }
        }));
    }

    fn begin_zoom_in(&self, node: NodeId, then: Option<Callback>) {
        let viewport = {
            let state = self.shared.state.borrow();
            if state.phase(node) != Some(ZoomPhase::ZoomingIn) {
                return;
            }
            state.cache.viewport
        };

        let platform = &self.shared.platform;
        platform.add_class(node, &self.shared.config.classes.zooming);

        let thumb = platform.bounding_rect(node);
        let full = self.full_size(node, thumb);
        let transform = calculate_zoom(full, thumb, viewport, self.shared.config.offset);
        log::debug!("zooming in {node}: {transform}");
        platform.set_transform(node, &transform);

        let weak = self.downgrade();
        platform.on_transition_end(
            node,
            Box::new(move || {
                if let Some(zoom) = Self::upgrade(&weak) {
                    zoom.finish_zoom_in(node, then);
                }
            }),
        );
    }

    fn finish_zoom_in(&self, node: NodeId, then: Option<Callback>) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.phase(node) != Some(ZoomPhase::ZoomingIn) {
                return;
            }
            if let Some(element) = state.elements.get_mut(&node) {
                element.phase = ZoomPhase::Zoomed;
            }
            state.zoomed.push(node);
        }

        let classes = &self.shared.config.classes;
        self.shared.platform.remove_class(node, &classes.zooming);
        self.shared.platform.add_class(node, &classes.zoomed);
        self.emit(ZoomTopic::ZoomInEnd, Some(node));

        self.schedule_promotion(node);

        {
            let mut state = self.shared.state.borrow_mut();
            if state.phase(node) == Some(ZoomPhase::Zoomed) {
                state.dismissal_attached = true;
            }
        }

        if let Some(then) = then {
            then();
        }
    }

    fn zoom_out_with(&self, node: NodeId, then: Option<Callback>) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            let Some(element) = state.elements.get_mut(&node) else {
                log::trace!("zoom out ignored for unregistered {node}");
                return;
            };
            if element.phase != ZoomPhase::Zoomed {
                log::trace!("zoom out ignored for {node} while {:?}", element.phase);
                return;
            }
            element.phase = ZoomPhase::ZoomingOut;
            state.dismissal_attached = false;
        }

        self.emit(ZoomTopic::ZoomOutStart, Some(node));

        let weak = self.downgrade();
        self.shared.platform.request_animation_frame(Box::new(move || {
            if let Some(zoom) = Self::upgrade(&weak) {
                zoom.begin_zoom_out(node, then);
            }
        }));
    }

    fn begin_zoom_out(&self, node: NodeId, then: Option<Callback>) {
        if self.phase(node) != Some(ZoomPhase::ZoomingOut) {
            return;
        }

        let platform = &self.shared.platform;
        platform.remove_class(node, &self.shared.config.classes.zoomed);
        log::debug!("zooming out {node}");
        platform.set_transform(node, &ZoomTransform::IDENTITY);

        let weak = self.downgrade();
        platform.on_transition_end(
            node,
            Box::new(move || {
                if let Some(zoom) = Self::upgrade(&weak) {
                    zoom.finish_zoom_out(node, then);
                }
            }),
        );
    }

    fn finish_zoom_out(&self, node: NodeId, then: Option<Callback>) {
        let image = self.shared.platform.image_of(node);
        {
            let mut state = self.shared.state.borrow_mut();
            if state.phase(node) != Some(ZoomPhase::ZoomingOut) {
                return;
            }
            if let Some(element) = state.elements.get_mut(&node) {
                element.phase = ZoomPhase::Idle;
                element.session = None;
            }
            // A load that never completed may be retried by the next session.
            if let Some(image) = image {
                state.loading_images.remove(&image);
            }
        }

        self.shared
            .platform
            .remove_class(node, &self.shared.config.classes.active);
        self.emit(ZoomTopic::ZoomOutEnd, Some(node));

        {
            let mut state = self.shared.state.borrow_mut();
            if let Some(index) = state.zoomed.iter().position(|zoomed| *zoomed == node) {
                state.zoomed.remove(index);
            }
        }

        if let Some(then) = then {
            then();
        }
    }

    fn navigate(&self, direction: Direction) {
        let (current, target) = {
            let state = self.shared.state.borrow();
            if state.destroyed {
                return;
            }
            let Some(&current) = state.zoomed.last() else {
                return;
            };
            if state.phase(current) != Some(ZoomPhase::Zoomed) {
                return;
            }
            let Some(index) = state.registered.iter().position(|node| *node == current) else {
                return;
            };
            let target = match direction {
                Direction::Next => state.registered.get(index + 1),
                Direction::Prev => index
                    .checked_sub(1)
                    .and_then(|index| state.registered.get(index)),
            };
            let Some(&target) = target else {
                log::trace!("no {direction:?} element after {current}");
                return;
            };
            (current, target)
        };

        let topic = match direction {
            Direction::Next => ZoomTopic::ToggleNextImage,
            Direction::Prev => ZoomTopic::TogglePrevImage,
        };
        self.emit(topic, Some(current));

        let weak = self.downgrade();
        self.zoom_out_with(
            current,
            Some(Box::new(move || {
                if let Some(zoom) = Self::upgrade(&weak) {
                    zoom.zoom_in(target);
                }
            })),
        );
    }

    fn refresh_scroll(&self) {
        let dismiss = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            let scroll_y = self.shared.platform.scroll_offset();
            state.cache.last_scroll_y = scroll_y;
            state
                .dismissable_top()
                .filter(|(_, session)| session.scroll_exceeded(scroll_y, self.shared.config.offset))
                .map(|(top, _)| top)
        };
        if let Some(top) = dismiss {
            log::debug!("scroll moved past offset, dismissing {top}");
            self.zoom_out(top);
        }
    }

    fn refresh_viewport(&self) {
        let dismiss = {
            let mut state = self.shared.state.borrow_mut();
            state.resize_debounce.fired();
            if state.destroyed {
                return;
            }
            let viewport = self.shared.platform.viewport_size();
            state.cache = ViewportCache {
                viewport,
                last_scroll_y: self.shared.platform.scroll_offset(),
            };
            state
                .dismissable_top()
                .filter(|(_, session)| session.resize_exceeded(viewport, self.shared.config.offset))
                .map(|(top, _)| top)
        };
        if let Some(top) = dismiss {
            log::debug!("viewport resized past offset, dismissing {top}");
            self.zoom_out(top);
        }
    }

    /// Declared full-resolution size, falling back to the thumbnail's own
    /// size when the attributes are unusable.
    fn full_size(&self, node: NodeId, thumb: Rect) -> Size {
        match declared_size(&self.shared.platform, node) {
            Ok(size) => size,
            Err(err) => {
                log::warn!("{err}; zooming to thumbnail size");
                thumb.size()
            }
        }
    }

    fn schedule_promotion(&self, node: NodeId) {
        let delay = self.shared.config.promotion_delay_ms;
        if delay == 0 {
            self.promote(node);
            return;
        }
        let weak = self.downgrade();
        self.shared.platform.set_timeout(
            Box::new(move || {
                if let Some(zoom) = Self::upgrade(&weak) {
                    zoom.promote(node);
                }
            }),
            delay,
        );
    }

    fn promote(&self, node: NodeId) {
        if self.is_destroyed() {
            return;
        }
        let platform = &self.shared.platform;
        let Some(url) = platform.attribute(node, SOURCE_ATTRIBUTE) else {
            return;
        };
        if !has_allowed_extension(&url) {
            log::debug!("not promoting {node}: unsupported asset {url}");
            return;
        }
        let Some(image) = platform.image_of(node) else {
            log::trace!("not promoting {node}: no image content");
            return;
        };
        {
            let mut state = self.shared.state.borrow_mut();
            if state.loaded_images.contains(&image) || !state.loading_images.insert(image) {
                return;
            }
        }

        log::debug!("loading {url} for {node}");
        let weak = self.downgrade();
        let source = url.clone();
        platform.load_image(
            &url,
            Box::new(move || {
                if let Some(zoom) = Self::upgrade(&weak) {
                    zoom.finish_promotion(node, image, &source);
                }
            }),
        );
    }

    fn finish_promotion(&self, node: NodeId, image: NodeId, url: &str) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.loading_images.remove(&image);
            if state.destroyed || !state.loaded_images.insert(image) {
                return;
            }
        }

        let platform = &self.shared.platform;
        platform.set_image_source(image, url);
        for attribute in RESPONSIVE_ATTRIBUTES {
            if platform.has_attribute(image, attribute) {
                platform.remove_attribute(image, attribute);
            }
        }
        self.emit(ZoomTopic::ImageLoaded, Some(node));
    }
}

/// Reads `data-width`/`data-height` from `node`.
pub fn declared_size<P: Platform>(platform: &P, node: NodeId) -> Result<Size, ZoomError> {
    let width = dimension(platform, node, WIDTH_ATTRIBUTE)?;
    let height = dimension(platform, node, HEIGHT_ATTRIBUTE)?;
    Ok(Size::new(width, height))
}

fn dimension<P: Platform>(
    platform: &P,
    node: NodeId,
    attribute: &'static str,
) -> Result<f32, ZoomError> {
    let value = platform
        .attribute(node, attribute)
        .ok_or(ZoomError::MissingDimension { node, attribute })?;
    match value.trim().parse::<f32>() {
        Ok(parsed) if parsed.is_finite() && parsed > 0.0 => Ok(parsed),
        _ => Err(ZoomError::InvalidDimension {
            node,
            attribute,
            value,
        }),
    }
}
