//! The `ImageZoom` class exported to JavaScript.

use std::cell::RefCell;

use imagezoom_core::{ImageZoom, Key, Subscription, ZoomConfig, ZoomTopic};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, KeyboardEvent};

use crate::WebPlatform;

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

/// Page listeners owned by one `ImageZoom` instance.
///
/// `detach` unhooks them from the page but keeps the closures alive until
/// the instance itself is freed, since `destroy()` may be called from inside
/// one of them.
#[derive(Default)]
struct EventBindings {
    listeners: Vec<Listener>,
    detached: bool,
}

impl EventBindings {
    fn listen(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.push(Listener {
            target: target.clone(),
            event,
            closure,
        });
        Ok(())
    }

    fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        for listener in &self.listeners {
            if let Err(err) = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            ) {
                log::warn!("could not remove {} listener: {err:?}", listener.event);
            }
        }
    }
}

impl Drop for EventBindings {
    fn drop(&mut self) {
        self.detach();
    }
}

/// `new ImageZoom(elems, options?)`
#[wasm_bindgen(js_name = ImageZoom)]
pub struct JsImageZoom {
    zoom: Option<ImageZoom<WebPlatform>>,
    bindings: RefCell<EventBindings>,
}

/// Handle returned by `ImageZoom.on`.
#[wasm_bindgen(js_name = Subscription)]
pub struct JsSubscription {
    inner: RefCell<Option<Subscription>>,
}

#[wasm_bindgen(js_class = Subscription)]
impl JsSubscription {
    pub fn remove(&self) {
        if let Some(subscription) = self.inner.borrow_mut().take() {
            subscription.remove();
        }
    }
}

#[wasm_bindgen(js_class = ImageZoom)]
impl JsImageZoom {
    /// `elems` is an element, a `NodeList` or any array-like of elements.
    /// Each one is registered if it carries the marker attribute, otherwise
    /// its marked descendants are. Clicks are delegated from each of them.
    #[wasm_bindgen(constructor)]
    pub fn new(elems: JsValue, options: JsValue) -> Result<JsImageZoom, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let roots = collect_elements(&elems);
        if roots.is_empty() {
            return Ok(Self {
                zoom: None,
                bindings: RefCell::new(EventBindings::default()),
            });
        }

        let platform = WebPlatform::from_global()?;
        let config = config_from(&options)?;
        let selector = marker_selector(&config.marker_attribute);

        let mut registered = Vec::new();
        for root in &roots {
            if root.matches(&selector)? {
                registered.push(platform.intern(root));
                continue;
            }
            let marked = root.query_selector_all(&selector)?;
            for index in 0..marked.length() {
                if let Some(element) = marked.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
                    registered.push(platform.intern(&element));
                }
            }
        }

        let zoom = ImageZoom::new(platform.clone(), registered, config);
        let mut bindings = EventBindings::default();

        for root in &roots {
            let zoom = zoom.clone();
            let platform = platform.clone();
            let selector = selector.clone();
            bindings.listen(root, "click", move |event| {
                // Resolve the marked ancestor in the DOM so only zoom targets
                // enter the node table.
                let Some(marked) = event
                    .target()
                    .and_then(|target| target.dyn_into::<Element>().ok())
                    .and_then(|target| target.closest(&selector).ok().flatten())
                else {
                    return;
                };
                if zoom.handle_click(platform.intern(&marked)) {
                    event.prevent_default();
                }
            })?;
        }

        let window: &EventTarget = platform.window();
        {
            let zoom = zoom.clone();
            bindings.listen(window, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if zoom.handle_key(Key::from_dom_key(&event.key())) {
                    event.prevent_default();
                }
            })?;
        }
        {
            let zoom = zoom.clone();
            bindings.listen(window, "scroll", move |_| zoom.handle_scroll())?;
        }
        {
            let zoom = zoom.clone();
            bindings.listen(window, "resize", move |_| zoom.handle_resize())?;
        }

        Ok(Self {
            zoom: Some(zoom),
            bindings: RefCell::new(bindings),
        })
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self, element: &Element) {
        if let Some(zoom) = &self.zoom {
            zoom.zoom_in(zoom.platform().intern(element));
        }
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self, element: &Element) {
        if let Some(zoom) = &self.zoom {
            zoom.zoom_out(zoom.platform().intern(element));
        }
    }

    pub fn next(&self) {
        if let Some(zoom) = &self.zoom {
            zoom.next();
        }
    }

    pub fn prev(&self) {
        if let Some(zoom) = &self.zoom {
            zoom.prev();
        }
    }

    #[wasm_bindgen(js_name = cancelCurrentZoom)]
    pub fn cancel_current_zoom(&self) {
        if let Some(zoom) = &self.zoom {
            zoom.cancel_current_zoom();
        }
    }

    pub fn destroy(&self) {
        self.bindings.borrow_mut().detach();
        if let Some(zoom) = &self.zoom {
            zoom.destroy();
        }
    }

    /// Subscribes `listener` to one of the lifecycle topics. The listener
    /// receives the affected element, or `null`. An unknown topic yields a
    /// subscription that never fires.
    pub fn on(&self, topic: &str, listener: Function) -> JsSubscription {
        let subscription = match (&self.zoom, parse_topic(topic)) {
            (Some(zoom), Some(topic)) => {
                let platform = zoom.platform().clone();
                zoom.on(topic, move |node| {
                    let payload = node
                        .and_then(|node| platform.element(node))
                        .map(JsValue::from)
                        .unwrap_or(JsValue::NULL);
                    if let Err(err) = listener.call1(&JsValue::NULL, &payload) {
                        log::warn!("{topic} listener threw: {err:?}");
                    }
                })
            }
            _ => Subscription::inert(),
        };
        JsSubscription {
            inner: RefCell::new(Some(subscription)),
        }
    }
}

fn collect_elements(elems: &JsValue) -> Vec<Element> {
    if elems.is_null() || elems.is_undefined() {
        return Vec::new();
    }
    if let Some(element) = elems.dyn_ref::<Element>() {
        return vec![element.clone()];
    }
    keep_ok(
        "ImageZoom element",
        Array::from(elems).iter().map(|item| item.dyn_into::<Element>()),
    )
}

/// Collects the `Ok` items, logging and skipping the rest.
fn keep_ok<T, E: std::fmt::Debug>(what: &str, items: impl Iterator<Item = Result<T, E>>) -> Vec<T> {
    items
        .filter_map(|item| match item {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("skipping {what}: {err:?}");
                None
            }
        })
        .collect()
}

fn parse_topic(name: &str) -> Option<ZoomTopic> {
    match name.parse::<ZoomTopic>() {
        Ok(topic) => Some(topic),
        Err(err) => {
            log::warn!("{err}; the listener will never be called");
            None
        }
    }
}

fn marker_selector(marker: &str) -> String {
    format!("[{marker}]")
}

fn number_option(options: &JsValue, key: &str) -> Result<Option<f64>, JsValue> {
    let value = Reflect::get(options, &JsValue::from_str(key))?;
    Ok(value.as_f64().filter(|value| value.is_finite() && *value >= 0.0))
}

/// Reads `{offset, resizeDebounce, scrollThrottle, promotionDelay}`.
fn config_from(options: &JsValue) -> Result<ZoomConfig, JsValue> {
    let mut config = ZoomConfig::new();
    if !options.is_object() {
        return Ok(config);
    }
    if let Some(offset) = number_option(options, "offset")? {
        config = config.with_offset(offset as f32);
    }
    if let Some(wait) = number_option(options, "resizeDebounce")? {
        config = config.with_resize_debounce(wait as u32);
    }
    if let Some(wait) = number_option(options, "scrollThrottle")? {
        config = config.with_scroll_throttle(wait as u32);
    }
    if let Some(delay) = number_option(options, "promotionDelay")? {
        config = config.with_promotion_delay(delay as u32);
    }
    if let Some(marker) = Reflect::get(options, &JsValue::from_str("marker"))?.as_string() {
        config = config.with_marker_attribute(marker);
    }
    Ok(config)
}
