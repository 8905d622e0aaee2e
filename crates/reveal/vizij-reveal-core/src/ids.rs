//! Identifiers and simple allocators for reveal entities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned element identity.
/// Keys are only meaningful inside the `Reveal` instance they were handed to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Handle returned by a visibility notifier when an element is observed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NotifierHandle(pub u32);

/// Identity of one `replay_all` batch.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub u32);

/// Monotonic allocator for batch ids, context generations and timer sequence numbers.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_batch: u32,
    next_generation: u64,
    next_timer: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_batch(&mut self) -> BatchId {
        let id = BatchId(self.next_batch);
        self.next_batch = self.next_batch.wrapping_add(1);
        id
    }

    /// Generations tag animation contexts so stale timers and signals can be ignored.
    #[inline]
    pub fn alloc_generation(&mut self) -> u64 {
        let id = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_timer(&mut self) -> u64 {
        let id = self.next_timer;
        self.next_timer = self.next_timer.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_batch(), BatchId(0));
        assert_eq!(alloc.alloc_batch(), BatchId(1));
        assert_eq!(alloc.alloc_generation(), 0);
        assert_eq!(alloc.alloc_generation(), 1);
        assert_eq!(alloc.alloc_timer(), 0);
        alloc.reset();
        assert_eq!(alloc.alloc_batch(), BatchId(0));
    }

    #[test]
    fn element_display_is_stable() {
        assert_eq!(ElementId(7).to_string(), "element#7");
    }
}
