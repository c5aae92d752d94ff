use std::cell::RefCell;
use std::rc::Rc;

use imagezoom_core::{ImageZoom, Key, NodeId, Rect, Size, ZoomConfig, ZoomTopic};

use crate::headless::HeadlessPlatform;

/// One lifecycle notification seen by the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub topic: ZoomTopic,
    pub node: Option<NodeId>,
}

impl RecordedEvent {
    pub fn new(topic: ZoomTopic, node: NodeId) -> Self {
        Self {
            topic,
            node: Some(node),
        }
    }
}

/// Declarative description of a zoomable thumbnail.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    pub rect: Rect,
    pub full_size: Size,
    pub href: String,
}

impl Thumbnail {
    pub fn new(rect: Rect, full_size: Size, href: impl Into<String>) -> Self {
        Self {
            rect,
            full_size,
            href: href.into(),
        }
    }
}

/// A thumbnail added to the harness: the marked anchor and its image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThumbnailNodes {
    pub container: NodeId,
    pub image: NodeId,
}

/// Headless harness for exercising a zoom controller in tests.
///
/// Owns a [`HeadlessPlatform`] with a page root, builds thumbnails on it,
/// starts an [`ImageZoom`] over them and records every lifecycle event.
pub struct ZoomTestRule {
    platform: HeadlessPlatform,
    root: NodeId,
    thumbnails: Vec<ThumbnailNodes>,
    zoom: Option<ImageZoom<HeadlessPlatform>>,
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl ZoomTestRule {
    /// Create a rule with a page of the given viewport size.
    pub fn new(viewport: Size) -> Self {
        let platform = HeadlessPlatform::new(viewport);
        let root = platform.create_node("body", None);
        Self {
            platform,
            root,
            thumbnails: Vec::new(),
            zoom: None,
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn platform(&self) -> &HeadlessPlatform {
        &self.platform
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds `<a data-zoomable href data-width data-height><img srcset sizes></a>`
    /// to the page. Thumbnails added before [`start`](Self::start) are
    /// registered with the controller.
    pub fn add_thumbnail(&mut self, thumbnail: Thumbnail) -> ThumbnailNodes {
        let platform = &self.platform;
        let container = platform.create_node("a", Some(self.root));
        platform.set_attribute(container, "data-zoomable", "");
        platform.set_attribute(container, "href", &thumbnail.href);
        platform.set_attribute(
            container,
            "data-width",
            &thumbnail.full_size.width.to_string(),
        );
        platform.set_attribute(
            container,
            "data-height",
            &thumbnail.full_size.height.to_string(),
        );
        platform.set_rect(container, thumbnail.rect);

        let image = platform.create_node("img", Some(container));
        platform.set_attribute(image, "src", "thumb.jpg");
        platform.set_attribute(image, "srcset", "thumb.jpg 1x, thumb@2x.jpg 2x");
        platform.set_attribute(image, "sizes", "100vw");
        platform.set_rect(image, thumbnail.rect);

        let nodes = ThumbnailNodes { container, image };
        self.thumbnails.push(nodes);
        nodes
    }

    /// Adds `count` 100x100 thumbnails in a row, each declaring an 800x600
    /// full-resolution JPEG.
    pub fn add_gallery(&mut self, count: usize) -> Vec<ThumbnailNodes> {
        (0..count)
            .map(|index| {
                let rect = Rect::new(20.0 + index as f32 * 120.0, 50.0, 100.0, 100.0);
                self.add_thumbnail(Thumbnail::new(
                    rect,
                    Size::new(800.0, 600.0),
                    format!("photos/{index}.jpg"),
                ))
            })
            .collect()
    }

    /// Starts a controller over every thumbnail added so far.
    pub fn start(&mut self, config: ZoomConfig) -> ImageZoom<HeadlessPlatform> {
        let elements: Vec<NodeId> = self.thumbnails.iter().map(|nodes| nodes.container).collect();
        let zoom = ImageZoom::new(self.platform.clone(), elements, config);
        for topic in ZoomTopic::ALL {
            let events = Rc::clone(&self.events);
            let _ = zoom.on(topic, move |node| {
                events.borrow_mut().push(RecordedEvent { topic, node })
            });
        }
        self.zoom = Some(zoom.clone());
        zoom
    }

    /// The controller started by [`start`](Self::start).
    pub fn zoom(&self) -> &ImageZoom<HeadlessPlatform> {
        self.zoom
            .as_ref()
            .expect("ZoomTestRule::start must be called first")
    }

    pub fn click(&self, target: NodeId) -> bool {
        self.zoom().handle_click(target)
    }

    pub fn press_key(&self, key: Key) -> bool {
        self.zoom().handle_key(key)
    }

    /// Scrolls the page to `scroll_y` and delivers the scroll event.
    pub fn scroll_to(&self, scroll_y: f32) {
        self.platform.set_scroll(scroll_y);
        self.zoom().handle_scroll();
    }

    /// Resizes the viewport and delivers the resize event.
    pub fn resize(&self, viewport: Size) {
        self.platform.set_viewport(viewport);
        self.zoom().handle_resize();
    }

    pub fn advance_frame(&self) -> usize {
        self.platform.run_frame()
    }

    pub fn finish_transitions(&self) -> usize {
        self.platform.finish_transitions()
    }

    pub fn complete_loads(&self) -> usize {
        self.platform.complete_loads()
    }

    pub fn advance_time(&self, millis: f64) -> usize {
        self.platform.advance_time(millis)
    }

    /// Runs frames, transitions and image loads until none are pending.
    /// Timers are left alone; use [`advance_time`](Self::advance_time).
    pub fn pump_until_idle(&self) {
        let mut rounds = 0;
        loop {
            rounds += 1;
            if rounds > 100 {
                panic!("pump_until_idle looped too many times!");
            }
            let progressed = self.platform.run_frame()
                + self.platform.finish_transitions()
                + self.platform.complete_loads();
            if progressed == 0 {
                break;
            }
        }
    }

    /// Zooms `node` in and settles every resulting callback.
    pub fn zoom_in_fully(&self, node: NodeId) {
        self.zoom().zoom_in(node);
        self.pump_until_idle();
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    pub fn topics(&self) -> Vec<ZoomTopic> {
        self.events.borrow().iter().map(|event| event.topic).collect()
    }

    /// Returns the recorded events and starts a fresh recording.
    pub fn take_events(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn count(&self, topic: ZoomTopic) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.topic == topic)
            .count()
    }
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
