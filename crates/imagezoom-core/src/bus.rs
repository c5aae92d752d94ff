//! Topic-keyed publish/subscribe used for zoom lifecycle notifications.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use crate::error::ZoomError;

/// Lifecycle notifications published by the zoom controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoomTopic {
    ZoomInStart,
    ZoomInEnd,
    ZoomOutStart,
    ZoomOutEnd,
    ImageLoaded,
    TogglePrevImage,
    ToggleNextImage,
}

impl ZoomTopic {
    pub const ALL: [ZoomTopic; 7] = [
        ZoomTopic::ZoomInStart,
        ZoomTopic::ZoomInEnd,
        ZoomTopic::ZoomOutStart,
        ZoomTopic::ZoomOutEnd,
        ZoomTopic::ImageLoaded,
        ZoomTopic::TogglePrevImage,
        ZoomTopic::ToggleNextImage,
    ];

    /// Name used on the JavaScript side.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomTopic::ZoomInStart => "zoomInStart",
            ZoomTopic::ZoomInEnd => "zoomInEnd",
            ZoomTopic::ZoomOutStart => "zoomOutStart",
            ZoomTopic::ZoomOutEnd => "zoomOutEnd",
            ZoomTopic::ImageLoaded => "imageLoaded",
            ZoomTopic::TogglePrevImage => "togglePrevImage",
            ZoomTopic::ToggleNextImage => "toggleNextImage",
        }
    }
}

impl fmt::Display for ZoomTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoomTopic {
    type Err = ZoomError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ZoomTopic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == name)
            .ok_or_else(|| ZoomError::UnknownTopic(name.to_owned()))
    }
}

type Listener<T> = Rc<dyn Fn(T) + 'static>;

struct Entry<K, T> {
    id: u64,
    topic: K,
    listener: Listener<T>,
}

struct BusInner<K, T> {
    next_id: u64,
    entries: Vec<Entry<K, T>>,
}

impl<K, T> BusInner<K, T> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }
}

/// Synchronous observer list keyed by topic.
///
/// Listeners may subscribe or unsubscribe (themselves or others) while a
/// publish is running. A listener removed mid-publish is not called again,
/// one added mid-publish first hears the next publish.
pub struct EventBus<K, T> {
    inner: Rc<RefCell<BusInner<K, T>>>,
}

impl<K, T> Clone for EventBus<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, T> EventBus<K, T>
where
    K: Copy + PartialEq + 'static,
    T: Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, topic: K, listener: impl Fn(T) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            topic,
            listener: Rc::new(listener),
        });
        drop(inner);

        let registry: Rc<dyn Registry> = self.inner.clone();
        Subscription {
            id,
            registry: Some(Rc::downgrade(&registry)),
        }
    }

    /// Delivers `payload` to every listener of `topic`, in subscription order.
    pub fn publish(&self, topic: K, payload: T) {
        // Copy listeners so callbacks run outside the borrow
        let listeners: Vec<(u64, Listener<T>)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.topic == topic)
            .map(|entry| (entry.id, Rc::clone(&entry.listener)))
            .collect();

        for (id, listener) in listeners {
            if !self.inner.borrow().contains(id) {
                continue;
            }
            listener(payload.clone());
        }
    }

    pub fn listener_count(&self, topic: K) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.topic == topic)
            .count()
    }

    /// Drops every listener. Outstanding [`Subscription`]s become inert.
    pub fn clear(&self) {
        // Listeners may own captured state with its own Drop; release them
        // after the borrow ends.
        let entries = std::mem::take(&mut self.inner.borrow_mut().entries);
        drop(entries);
    }
}

impl<K, T> Default for EventBus<K, T>
where
    K: Copy + PartialEq + 'static,
    T: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a bus used by [`Subscription`].
trait Registry {
    fn contains(&self, id: u64) -> bool;
    fn remove(&self, id: u64);
}

impl<K: 'static, T: 'static> Registry for RefCell<BusInner<K, T>> {
    fn contains(&self, id: u64) -> bool {
        self.borrow().contains(id)
    }

    fn remove(&self, id: u64) {
        let removed = {
            let mut inner = self.borrow_mut();
            let position = inner.entries.iter().position(|entry| entry.id == id);
            position.map(|index| inner.entries.remove(index))
        };
        drop(removed);
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::remove`] to unsubscribe.
pub struct Subscription {
    id: u64,
    registry: Option<Weak<dyn Registry>>,
}

impl Subscription {
    pub fn remove(mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.remove(self.id);
        }
    }

    /// Whether the listener is still registered with a live bus.
    pub fn is_active(&self) -> bool {
        self.registry
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|registry| registry.contains(self.id))
            .unwrap_or(false)
    }

    /// A handle that is not attached to any bus.
    pub fn inert() -> Self {
        Self {
            id: 0,
            registry: None,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/bus_tests.rs"]
mod tests;
