//! Session lifecycle around one live subscription.
//!
//! [`SessionController`] glues a transport to the reducer: it owns the
//! [`ConversationState`], subscribes a reducing observer to the transport's
//! event stream, and publishes every post-reduction state over a watch
//! channel. All reduction happens under one mutex, so no two events are ever
//! folded concurrently against the same state; `send` may be in flight while
//! stream events interleave with it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use confab_core::{ConversationState, Event, Message, reduce};

use crate::errors::{SessionError, TransportError};
use crate::transport::{AgentTransport, EventObserver, Subscription};

/// Observer that folds each incoming event into the shared state.
///
/// The liveness flag is checked before reducing: once the session stops, an
/// in-flight event that still reaches this observer must not mutate
/// observable state.
struct ReducerObserver {
    state: Arc<Mutex<ConversationState>>,
    live: Arc<AtomicBool>,
    states_tx: Arc<watch::Sender<ConversationState>>,
}

impl EventObserver for ReducerObserver {
    fn on_event(&self, event: &Event) {
        if !self.live.load(Ordering::Acquire) {
            return;
        }
        let next = {
            let mut state = self.state.lock();
            reduce(&mut state, event);
            state.clone()
        };
        let _ = self.states_tx.send(next);
    }
}

/// Owns one conversation: a transport, the reconciled state, and at most one
/// active subscription.
///
/// The subscription handle is held exclusively here and released exactly
/// once — on [`SessionController::stop`] or on drop.
pub struct SessionController {
    transport: Arc<dyn AgentTransport>,
    state: Arc<Mutex<ConversationState>>,
    live: Arc<AtomicBool>,
    states_tx: Arc<watch::Sender<ConversationState>>,
    subscription: Option<Subscription>,
}

impl SessionController {
    /// Create a controller over the given transport. No subscription is
    /// opened until [`SessionController::start`].
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        let (states_tx, _states_rx) = watch::channel(ConversationState::new());
        Self {
            transport,
            state: Arc::new(Mutex::new(ConversationState::new())),
            live: Arc::new(AtomicBool::new(false)),
            states_tx: Arc::new(states_tx),
            subscription: None,
        }
    }

    /// Open the subscription and begin reducing incoming events.
    ///
    /// Rejects a second call while a subscription is active: silently
    /// re-subscribing could fork the transcript.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.subscription.is_some() {
            return Err(SessionError::AlreadyStarted);
        }
        self.live.store(true, Ordering::Release);
        let observer = Arc::new(ReducerObserver {
            state: Arc::clone(&self.state),
            live: Arc::clone(&self.live),
            states_tx: Arc::clone(&self.states_tx),
        });
        self.subscription = Some(self.transport.subscribe(observer));
        debug!("session started");
        Ok(())
    }

    /// Release the subscription.
    ///
    /// Safe before [`SessionController::start`] and safe to call repeatedly.
    /// Events the transport delivers after this call are discarded.
    pub fn stop(&mut self) {
        self.live.store(false, Ordering::Release);
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
            debug!("session stopped");
        }
    }

    /// Send a user message and trigger an agent run.
    ///
    /// The message is appended optimistically — visible to observers before
    /// the run resolves, and intentionally id-less so later content deltas
    /// can never merge into it. A transport failure propagates unchanged and
    /// the optimistic message stays in place; the next authoritative
    /// messages snapshot reconciles the transcript.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        let message = Message::user(text);
        let next = {
            let mut state = self.state.lock();
            state.push_message(message.clone());
            state.clone()
        };
        let _ = self.states_tx.send(next);

        self.transport.add_message(message);
        self.transport.run_agent().await
    }

    // ── Observable surface ───────────────────────────────────────────────

    /// Current transcript snapshot.
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().transcript().to_vec()
    }

    /// Current opaque side-state snapshot.
    pub fn side_state(&self) -> Option<Value> {
        self.state.lock().side_state().cloned()
    }

    /// Whether a run is in flight with no token received yet.
    pub fn is_running(&self) -> bool {
        self.state.lock().is_running()
    }

    /// Subscribe to the full state after every reduction.
    pub fn watch_states(&self) -> watch::Receiver<ConversationState> {
        self.states_tx.subscribe()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // Guaranteed release even when the owning scope is torn down by an
        // external error.
        self.stop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
