//! A thread-safe, single-slot byte channel with an open/closed flag.
//!
//! No queueing: the newest frame always wins, and a missed frame is
//! silently lost. The two control loops are periodic and idempotent, so
//! most-recent-wins semantics match the physical analog of a shared-memory
//! register between a sensor and a controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::codec::FRAME_LEN;

#[derive(Debug, Default)]
pub struct Channel {
    slot: Mutex<Vec<u8>>,
    open: AtomicBool,
}

impl Channel {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Vec::with_capacity(FRAME_LEN)),
            open: AtomicBool::new(false),
        }
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Copy `bytes` into the slot, replacing whatever was there.
    pub fn send(&self, bytes: &[u8]) {
        let mut slot = self.slot.lock().expect("channel mutex poisoned");
        slot.clear();
        slot.extend_from_slice(bytes);
    }

    /// Copy the slot's current contents out. Empty until the first `send`.
    pub fn receive(&self) -> Vec<u8> {
        let slot = self.slot.lock().expect("channel mutex poisoned");
        slot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_closed_with_empty_slot() {
        let c = Channel::new();
        assert!(!c.is_open());
        assert!(c.receive().is_empty());
    }

    #[test]
    fn open_close_round_trip() {
        let c = Channel::new();
        c.open();
        assert!(c.is_open());
        c.close();
        assert!(!c.is_open());
    }

    #[test]
    fn send_then_receive_round_trips() {
        let c = Channel::new();
        c.send(&[1, 2, 3]);
        assert_eq!(c.receive(), vec![1, 2, 3]);
    }

    #[test]
    fn p9_concurrent_send_receive_never_observes_partial_frame() {
        let channel = Arc::new(Channel::new());
        let frame_a = [0xAAu8; FRAME_LEN];
        let frame_b = [0xBBu8; FRAME_LEN];

        let writer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for i in 0..2000 {
                    channel.send(if i % 2 == 0 { &frame_a } else { &frame_b });
                }
            })
        };

        for _ in 0..2000 {
            let frame = channel.receive();
            assert!(frame.is_empty() || frame.len() == FRAME_LEN);
            if frame.len() == FRAME_LEN {
                assert!(frame.iter().all(|&b| b == 0xAA) || frame.iter().all(|&b| b == 0xBB));
            }
        }

        writer.join().unwrap();
    }
}
