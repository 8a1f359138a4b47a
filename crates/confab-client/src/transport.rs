//! Transport contract consumed by the session layer.
//!
//! A transport queues outbound messages, triggers agent runs, and fans the
//! resulting protocol events out to subscribed observers in arrival order.
//! [`ObserverSet`] is the shared fan-out machinery transports embed;
//! [`Subscription`] is the owned handle an observer releases exactly once —
//! explicitly via [`Subscription::unsubscribe`] or implicitly on drop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;

use confab_core::{Event, Message};

use crate::errors::TransportError;

/// Receives every decoded protocol event from a live subscription.
///
/// The event's tag is its discriminant; one total dispatch method replaces a
/// per-tag handler table.
pub trait EventObserver: Send + Sync {
    /// Called once per event, in arrival order.
    fn on_event(&self, event: &Event);
}

/// An agent transport.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Register an observer for all subsequent events.
    fn subscribe(&self, observer: Arc<dyn EventObserver>) -> Subscription;

    /// Queue an outbound message for the next run.
    fn add_message(&self, message: Message);

    /// Trigger a run over the queued conversation.
    ///
    /// Events are dispatched to subscribers as they arrive; the future
    /// resolves once the run's event stream is drained. Failures propagate
    /// to the caller — the transport does not retry.
    async fn run_agent(&self) -> Result<(), TransportError>;
}

type Observers = Mutex<HashMap<u64, Arc<dyn EventObserver>>>;

/// Fan-out set of observers shared between a transport and its
/// subscriptions.
#[derive(Default)]
pub struct ObserverSet {
    observers: Arc<Observers>,
    next_id: AtomicU64,
}

impl ObserverSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer and hand back its owning subscription.
    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let _ = self.observers.lock().insert(id, observer);
        Subscription {
            observers: Arc::downgrade(&self.observers),
            id,
        }
    }

    /// Dispatch one event to every current observer.
    pub fn dispatch(&self, event: &Event) {
        // Snapshot outside the lock so an observer may unsubscribe (or a
        // subscription may drop) during dispatch without deadlocking.
        let observers: Vec<Arc<dyn EventObserver>> =
            self.observers.lock().values().cloned().collect();
        for observer in observers {
            observer.on_event(event);
        }
    }

    /// Number of active observers.
    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }
}

/// Owned handle to an active event subscription.
///
/// Unsubscribing is idempotent, and dropping the handle unsubscribes too, so
/// release is guaranteed even when the owning scope unwinds early.
#[derive(Debug)]
pub struct Subscription {
    observers: Weak<Observers>,
    id: u64,
}

impl Subscription {
    /// Remove the observer from the transport. Safe to call repeatedly.
    pub fn unsubscribe(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            let _ = observers.lock().remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
