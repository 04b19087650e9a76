//! Flag-gated single-slot handoff between one producer and one consumer.
//!
//! A [`Slot`] holds at most one value. Occupancy is encoded by two flags:
//! the producer toggles `ready` after writing, the consumer copies `ready`
//! into `served` after reading. Equal flags mean the slot is empty, unequal
//! flags mean one value is pending.
//!
//! ```text
//!            publish                     consume
//! Producer ───────────▶ [ slot | ready ≠ served ] ───────────▶ Consumer
//!                        ready == served ⇒ empty
//! ```
//!
//! A second `publish` before the consumer has read the slot overwrites the
//! pending value (newest wins); [`Slot::try_publish`] refuses instead.
//!
//! # Memory ordering
//!
//! Flag stores use `Release` and flag loads use `Acquire`, so a consumer
//! that observes `ready != served` also observes the slot write. The value
//! itself lives behind a mutex, so a reader never sees a half-written
//! buffer even when the single-writer discipline is broken.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Occupancy of a [`Slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// `ready == served`: nothing to consume.
    Empty,
    /// `ready != served`: one value waiting.
    Full,
}

/// Outcome of [`Slot::publish`].
#[derive(Debug, PartialEq, Eq)]
pub enum Publish<T> {
    /// The slot was empty; the value is now pending.
    Stored,
    /// The slot already held an unread value, which is returned here.
    Replaced(T),
}

impl<T> Publish<T> {
    /// Whether an unread value was overwritten.
    pub fn replaced(&self) -> bool {
        matches!(self, Self::Replaced(_))
    }
}

struct Inner<T> {
    value: Mutex<Option<T>>,
    ready: AtomicBool,
    served: AtomicBool,
    notify: Notify,
}

/// Single-item handoff buffer shared by one producer and one consumer.
///
/// Cloning produces another handle to the same slot.
pub struct Slot<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (ready, served) = self.flags();
        f.debug_struct("Slot")
            .field("ready", &ready)
            .field("served", &served)
            .finish()
    }
}

impl<T> Slot<T> {
    /// Create an empty slot with both flags cleared.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(None),
                ready: AtomicBool::new(false),
                served: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    // A panic while holding the lock cannot leave the Option half-written.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current `(ready, served)` flag pair.
    pub fn flags(&self) -> (bool, bool) {
        (
            self.inner.ready.load(Ordering::Acquire),
            self.inner.served.load(Ordering::Acquire),
        )
    }

    /// Current occupancy.
    pub fn state(&self) -> SlotState {
        let (ready, served) = self.flags();
        if ready == served {
            SlotState::Empty
        } else {
            SlotState::Full
        }
    }

    /// Whether a value is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.state() == SlotState::Full
    }

    /// Write `value` into the slot and mark it pending.
    ///
    /// Producer side only. If a value is already pending it is replaced and
    /// handed back in [`Publish::Replaced`]; the flags stay unequal.
    pub fn publish(&self, value: T) -> Publish<T> {
        let outcome = {
            let mut guard = self.lock();
            let previous = guard.replace(value);
            let (ready, served) = self.flags();
            if ready == served {
                self.inner.ready.store(!ready, Ordering::Release);
                Publish::Stored
            } else {
                match previous {
                    Some(old) => Publish::Replaced(old),
                    None => Publish::Stored,
                }
            }
        };
        self.inner.notify.notify_one();
        outcome
    }

    /// Publish only if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns the value unchanged when another value is still pending.
    pub fn try_publish(&self, value: T) -> std::result::Result<(), T> {
        {
            let mut guard = self.lock();
            let (ready, served) = self.flags();
            if ready != served {
                return Err(value);
            }
            *guard = Some(value);
            self.inner.ready.store(!ready, Ordering::Release);
        }
        self.inner.notify.notify_one();
        Ok(())
    }

    /// Take the pending value, if any, and mark the slot empty.
    ///
    /// Consumer side only. Never blocks on an empty slot.
    pub fn poll_and_consume(&self) -> Option<T> {
        if !self.is_pending() {
            return None;
        }
        let mut guard = self.lock();
        let (ready, served) = self.flags();
        if ready == served {
            return None;
        }
        let value = guard.take();
        self.inner.served.store(ready, Ordering::Release);
        value
    }

    /// Alias for [`poll_and_consume`](Self::poll_and_consume).
    pub fn try_consume(&self) -> Option<T> {
        self.poll_and_consume()
    }

    async fn wait(&self) -> T {
        loop {
            // Register interest before checking so a publish in between
            // leaves a permit behind instead of being missed.
            let notified = self.inner.notify.notified();
            if let Some(value) = self.poll_and_consume() {
                return value;
            }
            notified.await;
        }
    }

    /// Wait for a value without spinning.
    ///
    /// Returns `None` once `cancel` fires.
    pub async fn consume(&self, cancel: &CancellationToken) -> Option<T> {
        tokio::select! {
            biased;
            value = self.wait() => Some(value),
            _ = cancel.cancelled() => None,
        }
    }

    /// Wait at most `timeout` for a value.
    pub async fn consume_timeout(&self, timeout: Duration) -> Option<T> {
        tokio::time::timeout(timeout, self.wait()).await.ok()
    }
}
