//! Receive ring buffer
//!
//! Bytes are pushed from the pin-change interrupt and popped from the
//! main loop. Every operation runs inside a critical section, so a receive
//! interrupt that fires while the main loop is reading is held off until
//! the read completes and never observes a half-updated head/tail pair.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::spsc::Queue;

/// Ring size in slots. One slot stays open to tell full from empty.
pub const RX_BUFFER_SIZE: usize = 64;

struct Ring {
    queue: Queue<u8, RX_BUFFER_SIZE>,
    /// Sticky: set when a byte arrives into a full ring
    overflow: bool,
}

/// Interrupt-safe receive buffer
pub struct ReceiveBuffer {
    ring: Mutex<CriticalSectionRawMutex, RefCell<Ring>>,
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiveBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(Ring {
                queue: Queue::new(),
                overflow: false,
            })),
        }
    }

    /// Number of bytes the buffer can hold
    pub const fn capacity(&self) -> usize {
        RX_BUFFER_SIZE - 1
    }

    /// Append a received byte
    ///
    /// When the buffer is full the byte is dropped, the oldest data is
    /// kept, and the overflow flag is set. Returns whether the byte was
    /// stored.
    pub fn push(&self, byte: u8) -> bool {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            if ring.queue.enqueue(byte).is_ok() {
                true
            } else {
                ring.overflow = true;
                false
            }
        })
    }

    /// Remove and return the oldest byte
    pub fn pop(&self) -> Option<u8> {
        self.ring.lock(|ring| ring.borrow_mut().queue.dequeue())
    }

    /// Return the oldest byte without removing it
    pub fn peek(&self) -> Option<u8> {
        self.ring.lock(|ring| ring.borrow().queue.peek().copied())
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().queue.len())
    }

    /// Check whether no bytes are buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the sticky overflow flag
    pub fn overflow(&self) -> bool {
        self.ring.lock(|ring| ring.borrow().overflow)
    }

    /// Discard buffered bytes, leaving the overflow flag alone
    pub fn clear(&self) {
        self.ring.lock(|ring| ring.borrow_mut().queue = Queue::new());
    }

    /// Discard buffered bytes and clear the overflow flag
    pub fn reset(&self) {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            ring.queue = Queue::new();
            ring.overflow = false;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use std::vec::Vec;

    #[derive(Debug, Clone)]
    enum Op {
        Push(u8),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![any::<u8>().prop_map(Op::Push), Just(Op::Pop)]
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = ReceiveBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop(), None);
        assert_eq!(buffer.peek(), None);
        assert!(!buffer.overflow());
        assert_eq!(buffer.capacity(), 63);
    }

    #[test]
    fn test_overflow_keeps_oldest() {
        let buffer = ReceiveBuffer::new();
        for byte in 0..63u8 {
            assert!(buffer.push(byte));
        }
        assert!(!buffer.overflow());

        assert!(!buffer.push(0xAA));
        assert!(buffer.overflow());
        assert_eq!(buffer.len(), 63);
        assert_eq!(buffer.peek(), Some(0));

        // Draining does not clear the flag
        while buffer.pop().is_some() {}
        assert!(buffer.overflow());

        buffer.reset();
        assert!(!buffer.overflow());
    }

    #[test]
    fn test_clear_keeps_overflow() {
        let buffer = ReceiveBuffer::new();
        for byte in 0..64u8 {
            buffer.push(byte);
        }
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.overflow());

        // Wraps cleanly after a clear
        for byte in 0..10u8 {
            buffer.push(byte);
        }
        assert_eq!(buffer.pop(), Some(0));
        assert_eq!(buffer.len(), 9);
    }

    #[test]
    fn test_push_deferred_during_read_section() {
        let buffer = ReceiveBuffer::new();
        buffer.push(0x11);

        let entered = AtomicBool::new(false);
        let pushed = AtomicBool::new(false);

        std::thread::scope(|s| {
            // Stands in for the receive interrupt
            s.spawn(|| {
                while !entered.load(Ordering::SeqCst) {
                    std::hint::spin_loop();
                }
                buffer.push(0x22);
                pushed.store(true, Ordering::SeqCst);
            });

            critical_section::with(|_| {
                entered.store(true, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));

                assert!(!pushed.load(Ordering::SeqCst));
                assert_eq!(buffer.len(), 1);
                assert_eq!(buffer.pop(), Some(0x11));
                assert_eq!(buffer.len(), 0);
                assert!(!pushed.load(Ordering::SeqCst));
            });
        });

        assert!(pushed.load(Ordering::SeqCst));
        assert_eq!(buffer.pop(), Some(0x22));
        assert!(buffer.is_empty());
    }

    proptest! {
        #[test]
        fn prop_available_tracks_pushes_and_pops(ops in proptest::collection::vec(op(), 0..300)) {
            let buffer = ReceiveBuffer::new();
            let mut model: VecDeque<u8> = VecDeque::new();
            let mut overflowed = false;

            for op in ops {
                match op {
                    Op::Push(byte) => {
                        let before = buffer.len();
                        let stored = buffer.push(byte);
                        if model.len() < 63 {
                            prop_assert!(stored);
                            model.push_back(byte);
                        } else {
                            prop_assert!(!stored);
                            prop_assert_eq!(buffer.len(), before);
                            overflowed = true;
                        }
                    }
                    Op::Pop => {
                        prop_assert_eq!(buffer.pop(), model.pop_front());
                    }
                }
                prop_assert_eq!(buffer.len(), model.len());
                prop_assert_eq!(buffer.overflow(), overflowed);
            }
        }

        #[test]
        fn prop_peek_is_idempotent(
            bytes in proptest::collection::vec(any::<u8>(), 0..80),
            pops in 0usize..80
        ) {
            let buffer = ReceiveBuffer::new();
            for &byte in &bytes {
                buffer.push(byte);
            }
            for _ in 0..pops {
                buffer.pop();
            }

            let len = buffer.len();
            let first = buffer.peek();
            let second = buffer.peek();
            prop_assert_eq!(first, second);
            prop_assert_eq!(buffer.len(), len);

            let kept: Vec<u8> = bytes.iter().copied().take(63).collect();
            prop_assert_eq!(first, kept.get(pops).copied());
        }
    }
}
