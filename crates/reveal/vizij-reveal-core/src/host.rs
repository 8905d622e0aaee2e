//! Host collaborator traits.
//!
//! The reveal core never touches a real document. Adapters (web, native UI, tests) implement
//! these traits and pass themselves into the `Reveal` operations, the same way binding
//! resolvers are passed into the animation engine.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::events::RevealEvent;
use crate::ids::{ElementId, NotifierHandle};

/// Computed size of a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Styling surface of one element.
pub trait Paintable {
    /// Current inline value of a presentation property (`opacity`, `transform`, ...).
    fn style(&self, property: &str) -> Option<String>;
    fn set_style(&mut self, property: &str, value: &str);
    fn remove_style(&mut self, property: &str);

    /// Inner markup.
    fn content(&self) -> String;
    fn set_content(&mut self, markup: &str);

    fn size(&self) -> Size;

    /// Attribute access, also used for effect-local scratch data.
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &str, value: &str);
    fn remove_attribute(&mut self, name: &str);

    fn child_count(&self) -> usize {
        0
    }

    fn set_child_style(&mut self, _index: usize, _property: &str, _value: &str) {}

    /// Commit pending style writes so the next write starts a transition from them.
    fn flush(&mut self) {}
}

/// Document-like access to elements.
pub trait Document {
    /// Elements matching a selector, in document order.
    fn query(&self, selector: &str) -> Vec<ElementId>;

    /// Elements carrying `attribute`, in document order.
    fn annotated(&self, attribute: &str) -> Vec<ElementId>;

    /// Paintable target for an element; `None` once the element is detached.
    fn target(&mut self, element: ElementId) -> Option<&mut dyn Paintable>;

    fn dispatch(&mut self, element: ElementId, event: &RevealEvent);

    fn prefers_reduced_motion(&self) -> bool {
        false
    }
}

/// Geometry handed to the visibility notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveGeometry {
    pub threshold: f64,
    pub root_margin: String,
}

/// Visibility transition reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisibilityChange {
    Enter,
    Exit,
}

/// Intersection-style notifier. Transitions come back through `Reveal::on_visibility`.
pub trait VisibilityNotifier {
    fn observe(&mut self, element: ElementId, geometry: &ObserveGeometry) -> NotifierHandle;
    fn unobserve(&mut self, handle: NotifierHandle);
}

/// Per-frame callback control. While started, the host calls `Reveal::tick` every frame.
pub trait FrameDriver {
    fn start_frames(&mut self);
    fn stop_frames(&mut self);
}

/// Everything the reveal system needs from its environment.
pub trait Host: Document + VisibilityNotifier + FrameDriver {}

impl<T: Document + VisibilityNotifier + FrameDriver + ?Sized> Host for T {}

/// Monotonic time source in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by `Instant`, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}
