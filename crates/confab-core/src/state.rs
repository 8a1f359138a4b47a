//! Reconciled conversation state.

use std::collections::HashMap;

use serde_json::Value;

use crate::messages::{Message, Role};

/// Thread/run identifiers captured from the most recent run-started signal.
///
/// Passthrough only: nothing in the reducer consumes these, but collaborators
/// (resume, telemetry) may want them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunIds {
    /// Conversation thread identifier.
    pub thread_id: Option<String>,
    /// Identifier of the run.
    pub run_id: Option<String>,
}

/// The reconciled view of one conversation.
///
/// Created empty when a session starts, mutated exclusively through
/// [`crate::reducer::reduce`] and the controller's optimistic append, and
/// discarded when the session stops.
///
/// The transcript keeps arrival order; an id→position index is maintained
/// alongside it so message lookup stays O(1) on large transcripts. The
/// mutation helpers below are the only writers and keep the two coherent,
/// which also makes the at-most-one-message-per-id invariant structural.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversationState {
    transcript: Vec<Message>,
    index: HashMap<String, usize>,
    side_state: Option<Value>,
    is_running: bool,
    run: Option<RunIds>,
}

impl ConversationState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read surface ─────────────────────────────────────────────────────

    /// The ordered transcript.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Opaque application state pushed by the agent, if any snapshot arrived.
    pub fn side_state(&self) -> Option<&Value> {
        self.side_state.as_ref()
    }

    /// Whether a run is in flight and no token has arrived yet.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Identifiers of the most recent run, if one started.
    pub fn run(&self) -> Option<&RunIds> {
        self.run.as_ref()
    }

    /// Position of the message with the given id, if present.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    // ── Mutation surface ─────────────────────────────────────────────────

    /// Append a message to the transcript.
    ///
    /// If the message carries an id that already exists, the existing entry
    /// is overwritten in place instead — the transcript never holds two
    /// messages with the same id.
    pub fn push_message(&mut self, message: Message) {
        match message.id.as_deref().and_then(|id| self.index.get(id)) {
            Some(&position) => self.transcript[position] = message,
            None => {
                if let Some(id) = message.id.clone() {
                    let _ = self.index.insert(id, self.transcript.len());
                }
                self.transcript.push(message);
            }
        }
    }

    /// Reset an existing message to empty content and the given role,
    /// keeping its position. Returns `false` when the id is unknown.
    pub fn restart_message(&mut self, id: &str, role: Role) -> bool {
        let Some(&position) = self.index.get(id) else {
            return false;
        };
        let message = &mut self.transcript[position];
        message.content.clear();
        message.role = role;
        true
    }

    /// Append a content fragment to the message with the given id.
    /// Returns `false` when the id is unknown.
    pub fn append_content(&mut self, id: &str, delta: &str) -> bool {
        let Some(&position) = self.index.get(id) else {
            return false;
        };
        self.transcript[position].content.push_str(delta);
        true
    }

    /// Discard the transcript and rebuild it from an authoritative snapshot,
    /// preserving snapshot order.
    pub fn replace_transcript(&mut self, messages: Vec<Message>) {
        self.transcript.clear();
        self.index.clear();
        for message in messages {
            self.push_message(message);
        }
    }

    /// Replace the opaque side-state wholesale. Last writer wins.
    pub fn set_side_state(&mut self, value: Option<Value>) {
        self.side_state = value;
    }

    /// Set the run-in-flight flag.
    pub fn set_running(&mut self, running: bool) {
        self.is_running = running;
    }

    /// Record the identifiers of the run that just started.
    pub fn set_run(&mut self, run: RunIds) {
        self.run = Some(run);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn identified(id: &str, content: &str) -> Message {
        Message {
            id: Some(id.to_string()),
            role: Role::Assistant,
            content: content.to_string(),
        }
    }

    #[test]
    fn push_keeps_index_in_step() {
        let mut state = ConversationState::new();
        state.push_message(identified("m1", "a"));
        state.push_message(Message::user("hi"));
        state.push_message(identified("m2", "b"));

        assert_eq!(state.position_of("m1"), Some(0));
        assert_eq!(state.position_of("m2"), Some(2));
        assert_eq!(state.transcript().len(), 3);
    }

    #[test]
    fn push_with_duplicate_id_overwrites_in_place() {
        let mut state = ConversationState::new();
        state.push_message(identified("m1", "old"));
        state.push_message(identified("m2", "keep"));
        state.push_message(identified("m1", "new"));

        assert_eq!(state.transcript().len(), 2);
        assert_eq!(state.transcript()[0].content, "new");
        assert_eq!(state.position_of("m1"), Some(0));
    }

    #[test]
    fn restart_clears_content_in_place() {
        let mut state = ConversationState::new();
        state.push_message(identified("m1", "partial"));
        assert!(state.restart_message("m1", Role::Assistant));
        assert_eq!(state.transcript()[0].content, "");
        assert!(!state.restart_message("missing", Role::Assistant));
    }

    #[test]
    fn replace_transcript_rebuilds_index() {
        let mut state = ConversationState::new();
        state.push_message(identified("old", "x"));
        state.replace_transcript(vec![identified("a", "1"), identified("b", "2")]);

        assert_eq!(state.position_of("old"), None);
        assert_eq!(state.position_of("b"), Some(1));
        assert!(state.append_content("a", "!"));
        assert_eq!(state.transcript()[0].content, "1!");
    }
}
