//! Single-slot progress observable.
//!
//! A [`ProgressChannel`] stores the latest progress snapshot and fans every
//! update out to its subscribers. Updates are delivered individually and in
//! order; nothing is coalesced, so a slow reader sees every step once it
//! catches up.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Latest-value observable shared between the generation thread and readers.
///
/// Cloning the channel yields another handle to the same slot.
pub struct ProgressChannel<T> {
    shared: Arc<Mutex<Slot<T>>>,
}

struct Slot<T> {
    current: Option<T>,
    subscribers: Vec<Subscriber<T>>,
    next_id: u64,
}

struct Subscriber<T> {
    id: u64,
    sender: Sender<T>,
}

impl<T> Clone for ProgressChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone> Default for ProgressChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ProgressChannel<T> {
    /// Creates an empty channel with no stored snapshot.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Slot {
                current: None,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Returns the latest snapshot, or `None` before the first update or
    /// after a reset.
    pub fn current(&self) -> Option<T> {
        self.lock().current.clone()
    }

    /// Registers a new subscriber.
    ///
    /// If a snapshot is stored it is queued on the subscription first, so
    /// a subscriber joining mid-generation starts from the latest step.
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::channel();
        let mut slot = self.lock();

        if let Some(current) = slot.current.clone() {
            // Receiver is alive, send cannot fail.
            let _ = sender.send(current);
        }

        let id = slot.next_id;
        slot.next_id += 1;
        slot.subscribers.push(Subscriber { id, sender });

        Subscription {
            id,
            receiver,
            channel: Arc::downgrade(&self.shared),
        }
    }

    /// Stores `snapshot` and delivers it to every subscriber before returning.
    ///
    /// Store and delivery happen under one lock, so a concurrent subscribe
    /// sees either the old value followed by this update or this value
    /// alone, never a gap.
    pub fn update(&self, snapshot: T) {
        let mut slot = self.lock();
        slot.subscribers
            .retain(|subscriber| subscriber.sender.send(snapshot.clone()).is_ok());
        slot.current = Some(snapshot);
    }

    /// Clears the stored snapshot. Subscribers are kept and are not notified.
    pub fn reset(&self) {
        self.lock().current = None;
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // A panicking reader cannot leave the slot half-written.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for ProgressChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressChannel").finish_non_exhaustive()
    }
}

/// Receiving end of a [`ProgressChannel`] subscription.
///
/// Dropping the subscription unsubscribes it.
pub struct Subscription<T> {
    id: u64,
    receiver: Receiver<T>,
    channel: Weak<Mutex<Slot<T>>>,
}

impl<T> Subscription<T> {
    /// Blocks until the next snapshot arrives.
    ///
    /// Returns `None` once the channel has been dropped and every queued
    /// snapshot has been read.
    pub fn recv(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Returns the next queued snapshot without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Takes every snapshot queued so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Stops receiving updates.
    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.channel.upgrade() {
            let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
            slot.subscribers.retain(|subscriber| subscriber.id != self.id);
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
