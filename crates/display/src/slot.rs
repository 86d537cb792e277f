//! Capacity-one hand-off between the loader and the render loop.
//!
//! A `put` overwrites whatever the reader has not taken yet, so the renderer
//! only ever sees the newest content. Neither side waits on the other beyond
//! the few instructions the lock is held for.

use parking_lot::Mutex;

/// Single-value, latest-wins mailbox.
#[derive(Debug)]
pub struct Slot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { value: Mutex::new(None) }
    }
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning `true` if an untaken value was overwritten.
    pub fn put(&self, value: T) -> bool {
        self.value.lock().replace(value).is_some()
    }

    /// Take the pending value, if any.
    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.value.lock().is_none()
    }
}
