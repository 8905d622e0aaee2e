//! In-memory host used by tests and as a reference adapter.
//!
//! Supports a small selector subset: `*`, `tag`, `#id`, `.class`, `[attr]`, compounds of those
//! (`div.card[data-reveal]`) and comma-separated lists.

use indexmap::IndexMap;

use crate::events::RevealEvent;
use crate::host::{
    Document, FrameDriver, ObserveGeometry, Paintable, Size, VisibilityNotifier,
};
use crate::ids::{ElementId, NotifierHandle};

/// One element of the headless document.
#[derive(Debug, Clone, Default)]
pub struct HeadlessElement {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    styles: IndexMap<String, String>,
    attributes: IndexMap<String, String>,
    content: String,
    size: Size,
    children: Vec<IndexMap<String, String>>,
    connected: bool,
    /// Number of `flush` calls observed.
    pub flushes: usize,
    /// Every `(property, value)` style write in order; removals are logged with an empty value.
    pub style_log: Vec<(String, String)>,
}

impl HeadlessElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            connected: true,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Shorthand for the default `data-reveal` configuration attribute.
    pub fn with_reveal(self, config: &str) -> Self {
        self.with_attribute("data-reveal", config)
    }

    pub fn with_content(mut self, markup: &str) -> Self {
        self.content = markup.to_string();
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    pub fn with_children(mut self, count: usize) -> Self {
        self.children = vec![IndexMap::new(); count];
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.styles.insert(property.to_string(), value.to_string());
        self
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn styles(&self) -> &IndexMap<String, String> {
        &self.styles
    }

    pub fn child_style(&self, index: usize, property: &str) -> Option<&str> {
        self.children
            .get(index)
            .and_then(|c| c.get(property))
            .map(String::as_str)
    }

    fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            return false;
        }
        if selector == "*" {
            return true;
        }
        let mut rest = selector;
        // Leading tag name
        let tag_end = rest
            .find(|c: char| c == '#' || c == '.' || c == '[')
            .unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&self.tag) {
            return false;
        }
        rest = &rest[tag_end..];
        while !rest.is_empty() {
            let kind = rest.as_bytes()[0];
            rest = &rest[1..];
            if kind == b'[' {
                let Some(close) = rest.find(']') else {
                    return false;
                };
                let attr = &rest[..close];
                rest = &rest[close + 1..];
                let ok = match attr.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim_matches(|c: char| c == '"' || c == '\'');
                        self.attributes.get(name.trim()).map(String::as_str) == Some(value)
                    }
                    None => self.attributes.contains_key(attr.trim()),
                };
                if !ok {
                    return false;
                }
                continue;
            }
            let end = rest
                .find(|c: char| c == '#' || c == '.' || c == '[')
                .unwrap_or(rest.len());
            let name = &rest[..end];
            rest = &rest[end..];
            let ok = match kind {
                b'#' => self.id.as_deref() == Some(name),
                b'.' => self.classes.iter().any(|c| c == name),
                _ => false,
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

impl Paintable for HeadlessElement {
    fn style(&self, property: &str) -> Option<String> {
        self.styles.get(property).cloned()
    }

    fn set_style(&mut self, property: &str, value: &str) {
        self.style_log.push((property.to_string(), value.to_string()));
        self.styles.insert(property.to_string(), value.to_string());
    }

    fn remove_style(&mut self, property: &str) {
        self.style_log.push((property.to_string(), String::new()));
        self.styles.shift_remove(property);
    }

    fn content(&self) -> String {
        self.content.clone()
    }

    fn set_content(&mut self, markup: &str) {
        self.content = markup.to_string();
    }

    fn size(&self) -> Size {
        self.size
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.shift_remove(name);
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn set_child_style(&mut self, index: usize, property: &str, value: &str) {
        if let Some(child) = self.children.get_mut(index) {
            child.insert(property.to_string(), value.to_string());
        }
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// In-memory document, visibility notifier and frame driver.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    elements: IndexMap<ElementId, HeadlessElement>,
    next_element: u32,
    events: Vec<RevealEvent>,
    observed: IndexMap<NotifierHandle, (ElementId, ObserveGeometry)>,
    next_handle: u32,
    frames_running: bool,
    /// Number of times the frame loop was started.
    pub frame_starts: usize,
    /// Number of times the frame loop was stopped.
    pub frame_stops: usize,
    /// Host media preference consulted under the `auto` reduced-motion policy.
    pub reduced_motion: bool,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: HeadlessElement) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.elements.insert(id, element);
        id
    }

    pub fn element(&self, id: ElementId) -> Option<&HeadlessElement> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut HeadlessElement> {
        self.elements.get_mut(&id)
    }

    /// Style value of an element, for assertions.
    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.elements
            .get(&id)
            .and_then(|e| e.styles.get(property))
            .map(String::as_str)
    }

    /// Remove the element from the document; it stays inspectable.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.connected = false;
        }
    }

    pub fn events(&self) -> &[RevealEvent] {
        &self.events
    }

    pub fn events_for(&self, id: ElementId) -> Vec<&RevealEvent> {
        self.events.iter().filter(|e| e.element == id).collect()
    }

    pub fn take_events(&mut self) -> Vec<RevealEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_observed(&self, id: ElementId) -> bool {
        self.observed.values().any(|(el, _)| *el == id)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    pub fn geometry_for(&self, id: ElementId) -> Option<&ObserveGeometry> {
        self.observed
            .values()
            .find(|(el, _)| *el == id)
            .map(|(_, g)| g)
    }

    #[inline]
    pub fn frames_running(&self) -> bool {
        self.frames_running
    }
}

impl Document for HeadlessHost {
    fn query(&self, selector: &str) -> Vec<ElementId> {
        let parts: Vec<&str> = selector.split(',').collect();
        self.elements
            .iter()
            .filter(|(_, e)| e.connected && parts.iter().any(|p| e.matches(p)))
            .map(|(id, _)| *id)
            .collect()
    }

    fn annotated(&self, attribute: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, e)| e.connected && e.attributes.contains_key(attribute))
            .map(|(id, _)| *id)
            .collect()
    }

    fn target(&mut self, element: ElementId) -> Option<&mut dyn Paintable> {
        self.elements
            .get_mut(&element)
            .filter(|e| e.connected)
            .map(|e| e as &mut dyn Paintable)
    }

    fn dispatch(&mut self, element: ElementId, event: &RevealEvent) {
        if self.elements.get(&element).is_some_and(|e| e.connected) {
            self.events.push(event.clone());
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}

impl VisibilityNotifier for HeadlessHost {
    fn observe(&mut self, element: ElementId, geometry: &ObserveGeometry) -> NotifierHandle {
        let handle = NotifierHandle(self.next_handle);
        self.next_handle += 1;
        self.observed.insert(handle, (element, geometry.clone()));
        handle
    }

    fn unobserve(&mut self, handle: NotifierHandle) {
        self.observed.shift_remove(&handle);
    }
}

impl FrameDriver for HeadlessHost {
    fn start_frames(&mut self) {
        if !self.frames_running {
            self.frames_running = true;
            self.frame_starts += 1;
        }
    }

    fn stop_frames(&mut self) {
        if self.frames_running {
            self.frames_running = false;
            self.frame_stops += 1;
        }
    }
}
