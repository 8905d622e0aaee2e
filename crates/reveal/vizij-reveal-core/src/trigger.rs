//! Visibility bindings: one notifier registration per observed element.

use indexmap::IndexMap;
use tracing::debug;

use crate::element::ElementConfig;
use crate::host::VisibilityNotifier;
use crate::ids::{ElementId, NotifierHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityBinding {
    pub element: ElementId,
    pub handle: NotifierHandle,
    /// False only when the element explicitly opted out (`once=false`).
    pub once: bool,
}

#[derive(Debug, Default)]
pub struct TriggerManager {
    bindings: IndexMap<ElementId, VisibilityBinding>,
}

impl TriggerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `element` with the geometry from `config`. Returns `false` if it was already bound.
    pub fn observe<N: VisibilityNotifier + ?Sized>(
        &mut self,
        notifier: &mut N,
        element: ElementId,
        config: &ElementConfig,
    ) -> bool {
        if self.bindings.contains_key(&element) {
            return false;
        }
        let handle = notifier.observe(element, &config.geometry());
        self.bindings.insert(
            element,
            VisibilityBinding {
                element,
                handle,
                once: config.once != Some(false),
            },
        );
        true
    }

    /// Handle a visibility enter. Returns whether a play should start. Trigger-once bindings
    /// are released here when the global setting also asks for it.
    pub fn on_enter<N: VisibilityNotifier + ?Sized>(
        &mut self,
        notifier: &mut N,
        element: ElementId,
        global_once: bool,
    ) -> bool {
        let Some(binding) = self.bindings.get(&element).copied() else {
            return false;
        };
        if binding.once && global_once {
            notifier.unobserve(binding.handle);
            self.bindings.shift_remove(&element);
            debug!("{} triggered once; unbound", element);
        }
        true
    }

    pub fn unobserve<N: VisibilityNotifier + ?Sized>(
        &mut self,
        notifier: &mut N,
        element: ElementId,
    ) -> bool {
        match self.bindings.shift_remove(&element) {
            Some(binding) => {
                notifier.unobserve(binding.handle);
                true
            }
            None => false,
        }
    }

    pub fn unobserve_all<N: VisibilityNotifier + ?Sized>(&mut self, notifier: &mut N) {
        for (_, binding) in self.bindings.drain(..) {
            notifier.unobserve(binding.handle);
        }
    }

    #[inline]
    pub fn is_bound(&self, element: ElementId) -> bool {
        self.bindings.contains_key(&element)
    }

    pub fn binding(&self, element: ElementId) -> Option<&VisibilityBinding> {
        self.bindings.get(&element)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
