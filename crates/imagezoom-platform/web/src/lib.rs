//! Browser platform for imagezoom.
//!
//! [`WebPlatform`] implements [`Platform`] on top of `web-sys`, mapping DOM
//! elements to [`NodeId`]s through an interning table. [`JsImageZoom`] is
//! the `ImageZoom` class seen from JavaScript; it wires page events to the
//! controller.

mod bindings;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use imagezoom_core::{Callback, NodeId, Platform, Rect, Size, TimerId, ZoomTransform};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Element, HtmlElement, HtmlImageElement, Window};
use web_time::Instant;

pub use bindings::{JsImageZoom, JsSubscription};

struct PendingTimer {
    handle: i32,
    fired: Rc<Cell<bool>>,
    _closure: Closure<dyn FnMut()>,
}

struct WebInner {
    window: Window,
    nodes: RefCell<Vec<Element>>,
    timers: RefCell<Vec<PendingTimer>>,
    started: Instant,
}

/// Platform backed by the browser window. Clones share one node table.
#[derive(Clone)]
pub struct WebPlatform {
    inner: Rc<WebInner>,
}

impl WebPlatform {
    pub fn new(window: Window) -> Self {
        Self {
            inner: Rc::new(WebInner {
                window,
                nodes: RefCell::new(Vec::new()),
                timers: RefCell::new(Vec::new()),
                started: Instant::now(),
            }),
        }
    }

    pub fn from_global() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no global window exists")?;
        Ok(Self::new(window))
    }

    pub fn window(&self) -> &Window {
        &self.inner.window
    }

    /// Id for `element`, allocating one the first time it is seen.
    ///
    /// The table never shrinks; callers intern registered elements and their
    /// images only, resolving click targets in the DOM first.
    pub fn intern(&self, element: &Element) -> NodeId {
        let mut nodes = self.inner.nodes.borrow_mut();
        if let Some(index) = nodes.iter().position(|known| known == element) {
            return NodeId(index as u32);
        }
        nodes.push(element.clone());
        NodeId((nodes.len() - 1) as u32)
    }

    pub fn element(&self, node: NodeId) -> Option<Element> {
        self.inner.nodes.borrow().get(node.0 as usize).cloned()
    }

    fn html_element(&self, node: NodeId) -> Option<HtmlElement> {
        self.element(node)?.dyn_into::<HtmlElement>().ok()
    }

    // Closures of timers that already ran are dropped here, never from
    // inside their own invocation.
    fn prune_timers(&self) {
        self.inner
            .timers
            .borrow_mut()
            .retain(|timer| !timer.fired.get());
    }
}

fn warn_on_err(what: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        log::warn!("{what} failed: {err:?}");
    }
}

impl Platform for WebPlatform {
    fn bounding_rect(&self, node: NodeId) -> Rect {
        let Some(element) = self.element(node) else {
            return Rect::default();
        };
        let rect = element.get_bounding_client_rect();
        Rect::new(
            rect.left() as f32,
            rect.top() as f32,
            rect.width() as f32,
            rect.height() as f32,
        )
    }

    fn viewport_size(&self) -> Size {
        let window = &self.inner.window;
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|value| value.as_f64()).unwrap_or_default() as f32
        };
        Size::new(dimension(window.inner_width()), dimension(window.inner_height()))
    }

    fn scroll_offset(&self) -> f32 {
        self.inner.window.scroll_y().unwrap_or_default() as f32
    }

    fn now_ms(&self) -> f64 {
        self.inner.started.elapsed().as_secs_f64() * 1000.0
    }

    fn request_animation_frame(&self, callback: Callback) {
        let closure = Closure::once_into_js(move || callback());
        if let Err(err) = self
            .inner
            .window
            .request_animation_frame(closure.unchecked_ref())
        {
            log::warn!("requestAnimationFrame failed: {err:?}");
        }
    }

    fn on_transition_end(&self, node: NodeId, callback: Callback) {
        let Some(element) = self.element(node) else {
            return;
        };
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        let listener = Closure::once_into_js(move || callback());
        warn_on_err(
            "transitionend listener",
            element.add_event_listener_with_callback_and_add_event_listener_options(
                "transitionend",
                listener.unchecked_ref(),
                &options,
            ),
        );
    }

    fn set_timeout(&self, callback: Callback, delay_ms: u32) -> TimerId {
        self.prune_timers();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let closure: Closure<dyn FnMut()> = Closure::once(move || {
            callback();
            flag.set(true);
        });
        match self
            .inner
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay_ms as i32,
            ) {
            Ok(handle) => {
                self.inner.timers.borrow_mut().push(PendingTimer {
                    handle,
                    fired,
                    _closure: closure,
                });
                TimerId(handle as u32)
            }
            Err(err) => {
                log::warn!("setTimeout failed: {err:?}");
                TimerId(0)
            }
        }
    }

    fn clear_timeout(&self, timer: TimerId) {
        let handle = timer.0 as i32;
        self.inner.window.clear_timeout_with_handle(handle);
        self.inner
            .timers
            .borrow_mut()
            .retain(|pending| pending.handle != handle && !pending.fired.get());
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.element(node)?.parent_element()?;
        Some(self.intern(&parent))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.has_attribute(name))
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(element) = self.element(node) {
            warn_on_err("removeAttribute", element.remove_attribute(name));
        }
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(element) = self.element(node) {
            warn_on_err("classList.add", element.class_list().add_1(class));
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(element) = self.element(node) {
            warn_on_err("classList.remove", element.class_list().remove_1(class));
        }
    }

    fn force_layout(&self, node: NodeId) {
        if let Some(element) = self.html_element(node) {
            // reading a layout property flushes pending style changes
            let _ = element.offset_width();
        }
    }

    fn set_transform(&self, node: NodeId, transform: &ZoomTransform) {
        let Some(element) = self.html_element(node) else {
            return;
        };
        let style = element.style();
        let css = transform.to_css();
        for property in ["-webkit-transform", "transform"] {
            warn_on_err("style.setProperty", style.set_property(property, &css));
        }
    }

    fn image_of(&self, node: NodeId) -> Option<NodeId> {
        let image = self
            .element(node)?
            .query_selector("img:last-of-type")
            .ok()
            .flatten()?;
        Some(self.intern(&image))
    }

    fn set_image_source(&self, image: NodeId, url: &str) {
        let Some(element) = self.element(image) else {
            return;
        };
        match element.dyn_ref::<HtmlImageElement>() {
            Some(image) => image.set_src(url),
            None => warn_on_err("setAttribute", element.set_attribute("src", url)),
        }
    }

    fn load_image(&self, url: &str, on_load: Callback) {
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => {
                log::warn!("could not create image for {url}: {err:?}");
                return;
            }
        };
        // a failed load never calls back; the thumbnail stays
        let listener = Closure::once_into_js(move || on_load());
        image.set_onload(Some(listener.unchecked_ref()));
        image.set_src(url);
    }
}
