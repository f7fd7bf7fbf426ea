//! Process-wide registry mapping a subject key (a user login) to the set of
//! observer sinks currently watching that subject.
//!
//! Delivery is best-effort per sink: a full or closed sink loses that one
//! event, never the run. This component never returns errors; it degrades by
//! dropping undeliverable events.

use crate::events::Event;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

const LOG_TARGET: &str = "  registry";

/// Bounded capacity of each observer sink. A slow observer that falls this
/// far behind starts losing events; backpressure never reaches the producer.
const SINK_CAPACITY: usize = 64;

struct Sink {
    id: u64,
    tx: mpsc::Sender<Event>,
}

/// Subject-keyed broadcast registry.
///
/// The only shared mutable structure in the system; all operations are safe
/// under concurrent access from arbitrarily many runs and observer
/// connections. Entries self-delete when their subscriber set empties.
#[derive(Default)]
pub struct Registry {
    subjects: Mutex<HashMap<String, Vec<Sink>>>,
    next_id: AtomicU64,
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry").field("subjects", &self.subscriber_total()).finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new observer sink for `subject`.
    ///
    /// The returned subscription unsubscribes itself when dropped, so a sink's
    /// lifetime is exactly the observer connection's lifetime.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>, subject: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(SINK_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subjects = self.subjects.lock().unwrap_or_else(PoisonError::into_inner);
        subjects.entry(subject.to_owned()).or_default().push(Sink { id, tx });

        log::debug!(target: LOG_TARGET, "observer {id} subscribed to '{subject}'");

        Subscription {
            registry: Arc::clone(self),
            subject: subject.to_owned(),
            id,
            rx,
        }
    }

    /// Remove one sink from a subject; an emptied subject entry is removed
    /// from the map so abandoned subjects don't accumulate.
    pub fn unsubscribe(&self, subject: &str, id: u64) {
        let mut subjects = self.subjects.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sinks) = subjects.get_mut(subject) {
            sinks.retain(|sink| sink.id != id);
            if sinks.is_empty() {
                let _ = subjects.remove(subject);
            }
        }

        log::debug!(target: LOG_TARGET, "observer {id} unsubscribed from '{subject}'");
    }

    /// Deliver an event to every sink currently registered for `subject`.
    ///
    /// Best-effort: sinks that cannot accept the event are skipped, and an
    /// event published to a subject with no subscribers is dropped silently.
    pub fn publish(&self, subject: &str, event: &Event) {
        let subjects = self.subjects.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sinks) = subjects.get(subject) else {
            return;
        };

        for sink in sinks {
            if let Err(e) = sink.tx.try_send(event.clone()) {
                log::debug!(target: LOG_TARGET, "dropping event for observer {} of '{subject}': {e}", sink.id);
            }
        }
    }

    /// Number of sinks currently registered for `subject`.
    #[must_use]
    pub fn subscriber_count(&self, subject: &str) -> usize {
        let subjects = self.subjects.lock().unwrap_or_else(PoisonError::into_inner);
        subjects.get(subject).map_or(0, Vec::len)
    }

    fn subscriber_total(&self) -> usize {
        let subjects = self.subjects.lock().unwrap_or_else(PoisonError::into_inner);
        subjects.values().map(Vec::len).sum()
    }
}

/// An observer's live view of one subject's event stream.
#[derive(Debug)]
pub struct Subscription {
    registry: Arc<Registry>,
    subject: String,
    id: u64,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once the subscription is
    /// detached and the buffered events are drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.subject, self.id);
    }
}
