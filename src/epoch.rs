use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing generation counter used to cancel in-flight
/// searches cooperatively.
///
/// The session bumps it on every new solve request and on every cancel;
/// the search thread captures the value active at its start and compares
/// on every step. The counter is read racily on purpose: a delayed read
/// only costs a few extra recursive steps before the search unwinds, it
/// never changes the result. Relaxed atomics rule out torn reads without
/// imposing any ordering the protocol doesn't need.
#[derive(Debug, Default)]
pub struct Epoch(AtomicU64);

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Increments the counter and returns the new value.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}
