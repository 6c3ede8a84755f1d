//! Bounded MPMC queues and the shared stop signal.
//!
//! The pipeline needs real backpressure between stages running at
//! different rates, so both queues are `crossbeam_channel::bounded`, sized
//! `3 * target_fps`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::frame::{AsciiItem, RawFrame};

/// A queue item, carrying a distinguished end-of-stream token so a closed
/// channel and a graceful EOS are never confused by a downstream consumer.
pub enum Item<T> {
    Frame(T),
    Eos,
}

pub type RawSender = Sender<Item<RawFrame>>;
pub type RawReceiver = Receiver<Item<RawFrame>>;
pub type AsciiSender = Sender<Item<AsciiItem>>;
pub type AsciiReceiver = Receiver<Item<AsciiItem>>;

pub fn raw_queue(fps: u32) -> (RawSender, RawReceiver) {
    bounded(queue_capacity(fps))
}

pub fn ascii_queue(fps: u32) -> (AsciiSender, AsciiReceiver) {
    bounded(queue_capacity(fps))
}

fn queue_capacity(fps: u32) -> usize {
    (3 * fps.max(1)) as usize
}

/// A single process-wide flag every stage polls between units of work.
/// Cloning is cheap (an `Arc` bump) — every stage gets its own handle.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_three_times_fps() {
        assert_eq!(queue_capacity(10), 30);
    }

    #[test]
    fn capacity_never_zero_for_zero_fps() {
        assert_eq!(queue_capacity(0), 3);
    }

    #[test]
    fn stop_signal_starts_clear() {
        let stop = StopSignal::new();
        assert!(!stop.is_set());
        stop.set();
        assert!(stop.is_set());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let stop = StopSignal::new();
        let other = stop.clone();
        other.set();
        assert!(stop.is_set());
    }
}
