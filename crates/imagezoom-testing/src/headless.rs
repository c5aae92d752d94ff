//! In-memory [`Platform`] backed by a plain node tree.
//!
//! Nothing runs on its own: animation frames, transition ends, image loads
//! and timers queue up until a test drains them. That makes every
//! intermediate state of a zoom observable.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use imagezoom_core::{Callback, NodeId, Platform, Rect, Size, TimerId, ZoomTransform};

/// One element of the headless tree.
#[derive(Clone, Debug)]
pub struct HeadlessNode {
    pub tag: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
    pub rect: Rect,
    pub transform: ZoomTransform,
    pub layout_flushes: u32,
}

impl HeadlessNode {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_owned(),
            parent,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            rect: Rect::default(),
            transform: ZoomTransform::IDENTITY,
            layout_flushes: 0,
        }
    }
}

struct PendingTimer {
    id: TimerId,
    due_ms: f64,
    callback: Callback,
}

struct PendingLoad {
    url: String,
    callback: Callback,
}

struct HeadlessState {
    nodes: Vec<HeadlessNode>,
    viewport: Size,
    scroll_y: f32,
    now_ms: f64,
    frames: Vec<Callback>,
    transitions: Vec<(NodeId, Callback)>,
    transitions_enabled: bool,
    timers: Vec<PendingTimer>,
    next_timer: u32,
    loads: Vec<PendingLoad>,
    load_requests: Vec<String>,
    failing_urls: Vec<String>,
}

/// Headless platform. Clones share the same tree and queues, so a test can
/// keep one handle while the controller owns another.
#[derive(Clone)]
pub struct HeadlessPlatform {
    inner: Rc<RefCell<HeadlessState>>,
}

impl HeadlessPlatform {
    pub fn new(viewport: Size) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HeadlessState {
                nodes: Vec::new(),
                viewport,
                scroll_y: 0.0,
                now_ms: 0.0,
                frames: Vec::new(),
                transitions: Vec::new(),
                transitions_enabled: true,
                timers: Vec::new(),
                next_timer: 1,
                loads: Vec::new(),
                load_requests: Vec::new(),
                failing_urls: Vec::new(),
            })),
        }
    }

    pub fn create_node(&self, tag: &str, parent: Option<NodeId>) -> NodeId {
        let mut state = self.inner.borrow_mut();
        let id = NodeId(state.nodes.len() as u32);
        state.nodes.push(HeadlessNode::new(tag, parent));
        if let Some(parent) = parent {
            state.nodes[parent.0 as usize].children.push(id);
        }
        id
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_node_mut(node, |node| {
            node.attributes.insert(name.to_owned(), value.to_owned());
        });
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.with_node_mut(node, |node| node.rect = rect);
    }

    /// Snapshot of `node`.
    pub fn node(&self, node: NodeId) -> HeadlessNode {
        self.inner.borrow().nodes[node.0 as usize].clone()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.inner.borrow().nodes[node.0 as usize]
            .classes
            .iter()
            .any(|existing| existing == class)
    }

    pub fn transform(&self, node: NodeId) -> ZoomTransform {
        self.inner.borrow().nodes[node.0 as usize].transform
    }

    pub fn set_viewport(&self, viewport: Size) {
        self.inner.borrow_mut().viewport = viewport;
    }

    pub fn set_scroll(&self, scroll_y: f32) {
        self.inner.borrow_mut().scroll_y = scroll_y;
    }

    /// Stops transition-end notifications from firing, as if the page had
    /// no CSS transition on the zoomed element.
    pub fn set_transitions_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().transitions_enabled = enabled;
    }

    /// Makes loads of `url` fail silently.
    pub fn fail_loads_of(&self, url: &str) {
        self.inner.borrow_mut().failing_urls.push(url.to_owned());
    }

    /// Every URL passed to `load_image`, in order.
    pub fn load_requests(&self) -> Vec<String> {
        self.inner.borrow().load_requests.clone()
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    pub fn pending_transitions(&self) -> usize {
        self.inner.borrow().transitions.len()
    }

    pub fn pending_loads(&self) -> usize {
        self.inner.borrow().loads.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn now(&self) -> f64 {
        self.inner.borrow().now_ms
    }

    /// Runs the callbacks queued for the current frame. Callbacks requested
    /// while the frame runs wait for the next one. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let frames = std::mem::take(&mut self.inner.borrow_mut().frames);
        let count = frames.len();
        for callback in frames {
            callback();
        }
        count
    }

    /// Completes every transition currently being listened for.
    pub fn finish_transitions(&self) -> usize {
        let transitions = {
            let mut state = self.inner.borrow_mut();
            if !state.transitions_enabled {
                return 0;
            }
            std::mem::take(&mut state.transitions)
        };
        let count = transitions.len();
        for (_, callback) in transitions {
            callback();
        }
        count
    }

    /// Completes the transitions listened for on `node` only.
    pub fn finish_transition(&self, node: NodeId) -> usize {
        let matching = {
            let mut state = self.inner.borrow_mut();
            if !state.transitions_enabled {
                return 0;
            }
            let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut state.transitions)
                .into_iter()
                .partition(|(target, _)| *target == node);
            state.transitions = rest;
            matching
        };
        let count = matching.len();
        for (_, callback) in matching {
            callback();
        }
        count
    }

    /// Delivers every pending image load except those marked failing.
    pub fn complete_loads(&self) -> usize {
        let (loads, failing) = {
            let mut state = self.inner.borrow_mut();
            (std::mem::take(&mut state.loads), state.failing_urls.clone())
        };
        let mut count = 0;
        for load in loads {
            if failing.contains(&load.url) {
                continue;
            }
            count += 1;
            (load.callback)();
        }
        count
    }

    /// Moves the clock forward, firing due timers in deadline order.
    pub fn advance_time(&self, millis: f64) -> usize {
        let target = self.inner.borrow().now_ms + millis;
        let mut fired = 0;
        loop {
            let next = {
                let mut state = self.inner.borrow_mut();
                let due = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due_ms <= target)
                    .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms))
                    .map(|(index, _)| index);
                match due {
                    Some(index) => {
                        let timer = state.timers.remove(index);
                        state.now_ms = state.now_ms.max(timer.due_ms);
                        Some(timer.callback)
                    }
                    None => {
                        state.now_ms = target;
                        None
                    }
                }
            };
            match next {
                Some(callback) => {
                    fired += 1;
                    callback();
                }
                None => return fired,
            }
        }
    }

    fn with_node_mut(&self, node: NodeId, f: impl FnOnce(&mut HeadlessNode)) {
        let mut state = self.inner.borrow_mut();
        match state.nodes.get_mut(node.0 as usize) {
            Some(node) => f(node),
            None => log::warn!("headless platform has no node {node}"),
        }
    }

    fn with_node<R>(&self, node: NodeId, default: R, f: impl FnOnce(&HeadlessNode) -> R) -> R {
        let state = self.inner.borrow();
        state.nodes.get(node.0 as usize).map(f).unwrap_or(default)
    }
}

impl Platform for HeadlessPlatform {
    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.with_node(node, Rect::default(), |node| node.rect)
    }

    fn viewport_size(&self) -> Size {
        self.inner.borrow().viewport
    }

    fn scroll_offset(&self) -> f32 {
        self.inner.borrow().scroll_y
    }

    fn now_ms(&self) -> f64 {
        self.inner.borrow().now_ms
    }

    fn request_animation_frame(&self, callback: Callback) {
        self.inner.borrow_mut().frames.push(callback);
    }

    fn on_transition_end(&self, node: NodeId, callback: Callback) {
        self.inner.borrow_mut().transitions.push((node, callback));
    }

    fn set_timeout(&self, callback: Callback, delay_ms: u32) -> TimerId {
        let mut state = self.inner.borrow_mut();
        let id = TimerId(state.next_timer);
        state.next_timer += 1;
        let due_ms = state.now_ms + delay_ms as f64;
        state.timers.push(PendingTimer {
            id,
            due_ms,
            callback,
        });
        id
    }

    fn clear_timeout(&self, timer: TimerId) {
        let removed = {
            let mut state = self.inner.borrow_mut();
            let index = state.timers.iter().position(|pending| pending.id == timer);
            index.map(|index| state.timers.remove(index))
        };
        drop(removed);
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.with_node(node, None, |node| node.parent)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, None, |node| node.attributes.get(name).cloned())
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.with_node_mut(node, |node| {
            node.attributes.remove(name);
        });
    }

    fn add_class(&self, node: NodeId, class: &str) {
        self.with_node_mut(node, |node| {
            if !node.classes.iter().any(|existing| existing == class) {
                node.classes.push(class.to_owned());
            }
        });
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        self.with_node_mut(node, |node| node.classes.retain(|existing| existing != class));
    }

    fn force_layout(&self, node: NodeId) {
        self.with_node_mut(node, |node| node.layout_flushes += 1);
    }

    fn set_transform(&self, node: NodeId, transform: &ZoomTransform) {
        self.with_node_mut(node, |node| node.transform = *transform);
    }

    fn image_of(&self, node: NodeId) -> Option<NodeId> {
        let state = self.inner.borrow();
        let element = state.nodes.get(node.0 as usize)?;
        element
            .children
            .iter()
            .rev()
            .copied()
            .find(|child| state.nodes[child.0 as usize].tag == "img")
    }

    fn set_image_source(&self, image: NodeId, url: &str) {
        self.set_attribute(image, "src", url);
    }

    fn load_image(&self, url: &str, on_load: Callback) {
        let mut state = self.inner.borrow_mut();
        state.load_requests.push(url.to_owned());
        state.loads.push(PendingLoad {
            url: url.to_owned(),
            callback: on_load,
        });
    }
}
