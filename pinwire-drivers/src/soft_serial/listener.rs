//! Receive-listener arbitration
//!
//! Only one software serial channel can receive at a time: sampling a
//! frame occupies the CPU with interrupts masked for the whole byte. The
//! registry records which channel owns receive and keeps the interrupt
//! dispatch table in step with it, so handing receive to a channel
//! detaches the previous owner in the same critical section.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use pinwire_hal::interrupt::{InterruptLine, InterruptRegistry, ListenerId};

struct Inner<R> {
    registry: R,
    active: Option<(ListenerId, InterruptLine)>,
}

/// Shared owner of the "currently listening" slot
pub struct ListenerRegistry<R> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<R>>>,
}

impl<R: InterruptRegistry> ListenerRegistry<R> {
    /// Create a registry with no active listener
    pub const fn new(registry: R) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                registry,
                active: None,
            })),
        }
    }

    /// Make `id` the active listener on `line`
    ///
    /// Detaches the previous listener first. Returns the displaced
    /// listener, if it was a different one.
    pub fn claim(&self, id: ListenerId, line: InterruptLine) -> Option<ListenerId> {
        self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            let previous = inner.active.take();
            if let Some((_, old_line)) = previous {
                inner.registry.detach(old_line);
            }
            inner.registry.attach(line, Some(id));
            inner.active = Some((id, line));
            previous
                .map(|(old_id, _)| old_id)
                .filter(|&old_id| old_id != id)
        })
    }

    /// Stop `id` listening
    ///
    /// Does nothing unless `id` is the active listener. Returns whether a
    /// detach happened.
    pub fn release(&self, id: ListenerId) -> bool {
        self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            match inner.active {
                Some((active_id, line)) if active_id == id => {
                    inner.registry.detach(line);
                    inner.active = None;
                    true
                }
                _ => false,
            }
        })
    }

    /// Currently active listener
    pub fn active(&self) -> Option<ListenerId> {
        self.inner
            .lock(|inner| inner.borrow().active.map(|(id, _)| id))
    }

    /// Check whether `id` is the active listener
    pub fn is_active(&self, id: ListenerId) -> bool {
        self.active() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    /// Records every attach call
    #[derive(Default)]
    struct RecordingRegistry {
        calls: Vec<(InterruptLine, Option<ListenerId>)>,
    }

    impl InterruptRegistry for RecordingRegistry {
        fn attach(&mut self, line: InterruptLine, listener: Option<ListenerId>) {
            self.calls.push((line, listener));
        }
    }

    fn calls(
        registry: &ListenerRegistry<RecordingRegistry>,
    ) -> Vec<(InterruptLine, Option<ListenerId>)> {
        registry
            .inner
            .lock(|inner| inner.borrow().registry.calls.clone())
    }

    #[test]
    fn test_claim_and_release() {
        let registry = ListenerRegistry::new(RecordingRegistry::default());
        let a = ListenerId(1);

        assert_eq!(registry.active(), None);
        assert_eq!(registry.claim(a, InterruptLine(2)), None);
        assert!(registry.is_active(a));

        assert!(registry.release(a));
        assert_eq!(registry.active(), None);
        // Second release is a no-op
        assert!(!registry.release(a));

        assert_eq!(
            calls(&registry),
            [
                (InterruptLine(2), Some(a)),
                (InterruptLine(2), None),
            ]
        );
    }

    #[test]
    fn test_claim_displaces_previous() {
        let registry = ListenerRegistry::new(RecordingRegistry::default());
        let a = ListenerId(1);
        let b = ListenerId(2);

        registry.claim(a, InterruptLine(0));
        assert_eq!(registry.claim(b, InterruptLine(1)), Some(a));
        assert!(registry.is_active(b));
        assert!(!registry.is_active(a));

        // A stale release from the displaced channel leaves b attached
        assert!(!registry.release(a));
        assert!(registry.is_active(b));

        assert_eq!(
            calls(&registry),
            [
                (InterruptLine(0), Some(a)),
                (InterruptLine(0), None),
                (InterruptLine(1), Some(b)),
            ]
        );
    }

    #[test]
    fn test_reclaim_same_listener() {
        let registry = ListenerRegistry::new(RecordingRegistry::default());
        let a = ListenerId(7);

        registry.claim(a, InterruptLine(3));
        assert_eq!(registry.claim(a, InterruptLine(3)), None);
        assert!(registry.is_active(a));
    }
}
