//! Event-to-state reduction.
//!
//! [`reduce`] folds one protocol event into a [`ConversationState`]. It is
//! total: no event, however malformed, may panic or surface an error.
//! Recoverable protocol anomalies (duplicate message starts, deltas for an
//! unknown id) are resolved by policy here and logged at `warn`; unknown
//! event tags are dropped silently.
//!
//! Content deltas are order-sensitive (append), so events must be fed in
//! arrival order. Snapshot events are idempotent: applying the same snapshot
//! twice yields the same state.

use tracing::{debug, warn};

use crate::events::Event;
use crate::messages::{Message, Role};
use crate::state::{ConversationState, RunIds};

/// Apply a single event to the state.
pub fn reduce(state: &mut ConversationState, event: &Event) {
    match event {
        Event::RunStarted {
            thread_id, run_id, ..
        } => {
            state.set_run(RunIds {
                thread_id: thread_id.clone(),
                run_id: run_id.clone(),
            });
            state.set_running(true);
        }

        Event::TextMessageStart {
            message_id, role, ..
        } => {
            let Some(id) = message_id else {
                return;
            };
            // First token received: the waiting phase is over.
            state.set_running(false);
            let role = role.clone().unwrap_or(Role::Assistant);
            if state.restart_message(id, role.clone()) {
                // Protocol anomaly. Restart the message in place rather than
                // duplicating its id in the transcript.
                warn!(message_id = %id, "duplicate TEXT_MESSAGE_START, restarting message");
            } else {
                state.push_message(Message {
                    id: Some(id.clone()),
                    role,
                    content: String::new(),
                });
            }
        }

        Event::TextMessageContent {
            message_id, delta, ..
        } => {
            let Some(id) = message_id else {
                return;
            };
            if !state.append_content(id, delta) {
                // Start event lost or out of order: keep the text visible
                // under a fresh assistant message. The original role metadata
                // is gone, but no content is dropped.
                warn!(message_id = %id, "content delta for unknown message, appending fallback");
                state.push_message(Message {
                    id: Some(id.clone()),
                    role: Role::Assistant,
                    content: delta.clone(),
                });
            }
        }

        // Terminal marker only; the message was already materialized by its
        // start event or the content fallback.
        Event::TextMessageEnd { .. } => {}

        Event::MessagesSnapshot { messages, .. } => {
            let Some(messages) = messages else {
                return;
            };
            state.replace_transcript(messages.clone());
        }

        Event::StateSnapshot {
            snapshot,
            state: alternate,
            ..
        } => {
            state.set_side_state(snapshot.clone().or_else(|| alternate.clone()));
        }

        Event::RunFinished { .. } => {
            // Terminal for this run only; the session stays open and a new
            // run may start at any time.
            state.set_running(false);
        }

        Event::Unknown(_) => {
            debug!(tag = event.tag(), "ignoring unknown event");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
