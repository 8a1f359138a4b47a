//! Protocol events consumed by the reducer.
//!
//! The event stream is a tagged union keyed by a `type` field with
//! SCREAMING_SNAKE tags (`RUN_STARTED`, `TEXT_MESSAGE_CONTENT`, …). Fields a
//! producer may omit are explicit `Option`s rather than decode errors: a
//! malformed event must reduce as a no-op, never fail the stream. Tags this
//! client does not know decode losslessly into [`Event::Unknown`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::{Message, Role};

/// Common optional fields carried by every protocol event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseEvent {
    /// Event timestamp in milliseconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Raw event data from external systems.
    #[serde(rename = "rawEvent", skip_serializing_if = "Option::is_none")]
    pub raw_event: Option<Value>,
}

/// A discriminated agent-protocol event.
///
/// Consumed strictly in arrival order; ordering is a contract of the
/// transport, not re-derived here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An agent run began.
    #[serde(rename = "RUN_STARTED")]
    RunStarted {
        /// Conversation thread identifier, passed through to collaborators.
        #[serde(rename = "threadId", skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        /// Run identifier, passed through to collaborators.
        #[serde(rename = "runId", skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        /// Common optional fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// A streamed text message opened.
    #[serde(rename = "TEXT_MESSAGE_START")]
    TextMessageStart {
        /// Identity of the message being streamed. Absent → the event is a no-op.
        #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        /// Message role; resolved to assistant at reduction time when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        /// Common optional fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// An incremental content fragment for an open message.
    #[serde(rename = "TEXT_MESSAGE_CONTENT")]
    TextMessageContent {
        /// Identity of the target message. Absent → the event is a no-op.
        #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        /// Text fragment to append. A missing delta appends nothing.
        #[serde(default)]
        delta: String,
        /// Common optional fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// A streamed text message closed. Terminal marker only.
    #[serde(rename = "TEXT_MESSAGE_END")]
    TextMessageEnd {
        /// Identity of the closed message.
        #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        /// Common optional fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Authoritative full replacement of the transcript.
    #[serde(rename = "MESSAGES_SNAPSHOT")]
    MessagesSnapshot {
        /// Replacement message list. Absent → the event is a no-op.
        #[serde(skip_serializing_if = "Option::is_none")]
        messages: Option<Vec<Message>>,
        /// Common optional fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Authoritative full replacement of the opaque side-state.
    #[serde(rename = "STATE_SNAPSHOT")]
    StateSnapshot {
        /// New side-state; takes precedence over `state` when both are set.
        #[serde(skip_serializing_if = "Option::is_none")]
        snapshot: Option<Value>,
        /// Alternate field some producers emit instead of `snapshot`.
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<Value>,
        /// Common optional fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// The current agent run completed.
    #[serde(rename = "RUN_FINISHED")]
    RunFinished {
        /// Conversation thread identifier.
        #[serde(rename = "threadId", skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        /// Run identifier.
        #[serde(rename = "runId", skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        /// Optional run result payload.
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        /// Common optional fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Any event tag this client does not know about.
    ///
    /// Unknown and future tags must be ignored without error; the raw payload
    /// is preserved so nothing is lost in transit.
    #[serde(untagged)]
    Unknown(Value),
}

impl Event {
    /// The wire tag of the event, or the raw `type` field for unknown events.
    pub fn tag(&self) -> &str {
        match self {
            Event::RunStarted { .. } => "RUN_STARTED",
            Event::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            Event::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            Event::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            Event::MessagesSnapshot { .. } => "MESSAGES_SNAPSHOT",
            Event::StateSnapshot { .. } => "STATE_SNAPSHOT",
            Event::RunFinished { .. } => "RUN_FINISHED",
            Event::Unknown(value) => value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    // ── Decoding ─────────────────────────────────────────────────────────

    #[test]
    fn run_started_decodes() {
        let event: Event = serde_json::from_value(json!({
            "type": "RUN_STARTED",
            "threadId": "t1",
            "runId": "r1",
            "timestamp": 1_700_000_000_000u64,
        }))
        .unwrap();
        assert_matches!(event, Event::RunStarted { thread_id: Some(t), run_id: Some(r), base } => {
            assert_eq!(t, "t1");
            assert_eq!(r, "r1");
            assert_eq!(base.timestamp, Some(1_700_000_000_000));
        });
    }

    #[test]
    fn text_message_content_decodes() {
        let event: Event = serde_json::from_value(json!({
            "type": "TEXT_MESSAGE_CONTENT",
            "messageId": "m1",
            "delta": "Hel",
        }))
        .unwrap();
        assert_matches!(event, Event::TextMessageContent { message_id: Some(id), delta, .. } => {
            assert_eq!(id, "m1");
            assert_eq!(delta, "Hel");
        });
    }

    #[test]
    fn missing_message_id_still_decodes() {
        // A producer bug must not fail the stream; the reducer no-ops instead.
        let event: Event = serde_json::from_value(json!({
            "type": "TEXT_MESSAGE_START",
        }))
        .unwrap();
        assert_matches!(event, Event::TextMessageStart { message_id: None, .. });
    }

    #[test]
    fn missing_delta_decodes_as_empty() {
        let event: Event = serde_json::from_value(json!({
            "type": "TEXT_MESSAGE_CONTENT",
            "messageId": "m1",
        }))
        .unwrap();
        assert_matches!(event, Event::TextMessageContent { delta, .. } => {
            assert_eq!(delta, "");
        });
    }

    #[test]
    fn unknown_tag_decodes_to_passthrough() {
        let payload = json!({
            "type": "TOOL_CALL_START",
            "toolCallId": "tc1",
        });
        let event: Event = serde_json::from_value(payload.clone()).unwrap();
        assert_matches!(event, Event::Unknown(value) => {
            assert_eq!(value, payload);
        });
    }

    #[test]
    fn unknown_tag_reports_its_type() {
        let event: Event =
            serde_json::from_value(json!({"type": "STEP_STARTED", "stepName": "s"})).unwrap();
        assert_eq!(event.tag(), "STEP_STARTED");
    }

    #[test]
    fn state_snapshot_decodes_both_fields() {
        let event: Event = serde_json::from_value(json!({
            "type": "STATE_SNAPSHOT",
            "snapshot": {"count": 1},
            "state": {"count": 2},
        }))
        .unwrap();
        assert_matches!(event, Event::StateSnapshot { snapshot: Some(_), state: Some(_), .. });
    }

    #[test]
    fn messages_snapshot_decodes_message_list() {
        let event: Event = serde_json::from_value(json!({
            "type": "MESSAGES_SNAPSHOT",
            "messages": [
                {"id": "m1", "role": "user", "content": "hi"},
                {"id": "m2", "role": "assistant", "content": "hello"},
            ],
        }))
        .unwrap();
        assert_matches!(event, Event::MessagesSnapshot { messages: Some(messages), .. } => {
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].role, Role::User);
        });
    }

    // ── Encoding ─────────────────────────────────────────────────────────

    #[test]
    fn wire_tags_round_trip() {
        let event = Event::RunFinished {
            thread_id: Some("t1".into()),
            run_id: Some("r1".into()),
            result: None,
            base: BaseEvent::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RUN_FINISHED");
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
