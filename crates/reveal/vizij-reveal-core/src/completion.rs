//! Single-threaded completion handles.
//!
//! A [`Completion`] settles exactly once. It can be polled (`outcome`, `is_settled`) from a
//! frame loop or awaited as a `Future` on a local executor.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use serde::{Deserialize, Serialize};

use crate::error::RevealError;

/// How a play request ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayOutcome {
    Completed,
    /// Superseded by another play, a reset, a detached element or teardown.
    Abandoned,
    Failed(RevealError),
}

impl PlayOutcome {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Handle returned by `play`.
pub type PlayHandle = Completion<PlayOutcome>;

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    wakers: Vec<Waker>,
}

/// Read side of a one-shot result.
#[derive(Debug)]
pub struct Completion<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

/// Write side of a one-shot result.
#[derive(Debug)]
pub struct Resolver<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

/// Create a linked pending completion and its resolver.
pub fn pending<T>() -> (Completion<T>, Resolver<T>) {
    let slot = Rc::new(RefCell::new(Slot {
        value: None,
        wakers: Vec::new(),
    }));
    (
        Completion {
            slot: Rc::clone(&slot),
        },
        Resolver { slot },
    )
}

impl<T> Completion<T> {
    /// Completion that is already settled.
    pub fn ready(value: T) -> Self {
        let (completion, resolver) = pending();
        resolver.resolve(value);
        completion
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().value.is_some()
    }
}

impl<T: Clone> Completion<T> {
    pub fn outcome(&self) -> Option<T> {
        self.slot.borrow().value.clone()
    }
}

impl<T> Resolver<T> {
    /// Settle the completion. Only the first call has an effect; returns whether it did.
    pub fn resolve(&self, value: T) -> bool {
        let wakers = {
            let mut slot = self.slot.borrow_mut();
            if slot.value.is_some() {
                return false;
            }
            slot.value = Some(value);
            std::mem::take(&mut slot.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
        true
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().value.is_some()
    }
}

impl<T: Clone> Future for Completion<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = self.slot.borrow_mut();
        if let Some(value) = slot.value.as_ref() {
            return Poll::Ready(value.clone());
        }
        let waker = cx.waker();
        if !slot.wakers.iter().any(|w| w.will_wake(waker)) {
            slot.wakers.push(waker.clone());
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn first_resolution_wins() {
        let (handle, resolver) = pending::<PlayOutcome>();
        assert!(!handle.is_settled());
        assert!(resolver.resolve(PlayOutcome::Abandoned));
        assert!(!resolver.resolve(PlayOutcome::Completed));
        assert_eq!(handle.outcome(), Some(PlayOutcome::Abandoned));
    }

    #[test]
    fn future_wakes_on_resolve() {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);

        let (mut handle, resolver) = pending::<u32>();
        assert!(Pin::new(&mut handle).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut handle).poll(&mut cx).is_pending());
        resolver.resolve(7);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(Pin::new(&mut handle).poll(&mut cx), Poll::Ready(7));
    }

    #[test]
    fn ready_is_settled() {
        let handle = Completion::ready(PlayOutcome::Completed);
        assert!(handle.is_settled());
        assert!(handle.clone().outcome().unwrap().is_completed());
    }
}
