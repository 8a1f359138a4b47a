//! HTTP/SSE agent transport.
//!
//! [`HttpAgent`] speaks the AG-UI run protocol: a run is one POST of the
//! queued conversation to the agent endpoint, answered with a
//! `text/event-stream` body whose `data:` payloads are protocol events.
//! Each decoded event is folded into the agent's own conversation tracking
//! and fanned out to subscribers as it arrives, so the awaited
//! [`HttpAgent::run_agent`] overlaps with event dispatch on the same task.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use confab_core::{ConversationState, Event, Message, reduce};

use crate::errors::TransportError;
use crate::transport::{AgentTransport, EventObserver, ObserverSet, Subscription};

/// Wire shape of a run request.
#[derive(Debug, Serialize)]
struct RunAgentInput<'a> {
    #[serde(rename = "threadId")]
    thread_id: &'a str,
    #[serde(rename = "runId")]
    run_id: &'a str,
    messages: &'a [Message],
    tools: &'a [Value],
    context: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a Value>,
}

/// HTTP transport for one AG-UI agent endpoint.
///
/// The agent tracks the conversation internally: queued outbound messages
/// and everything a run streams back are reduced into a private
/// [`ConversationState`], and each run POSTs that full history. One
/// `HttpAgent` is one conversation thread (the thread id is minted at
/// construction and reused for every run).
pub struct HttpAgent {
    url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
    thread_id: String,
    state: Mutex<ConversationState>,
    observers: ObserverSet,
}

impl HttpAgent {
    /// Create a transport for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bearer_token: None,
            client: reqwest::Client::new(),
            thread_id: Uuid::now_v7().to_string(),
            state: Mutex::new(ConversationState::new()),
            observers: ObserverSet::new(),
        }
    }

    /// Attach a bearer credential sent with every run request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The conversation thread id minted for this agent.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Decode one SSE data payload and feed it through tracking + fan-out.
    fn ingest(&self, data: &str) {
        let event: Event = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(error) => {
                warn!(%error, data, "skipping undecodable event payload");
                return;
            }
        };
        {
            let mut state = self.state.lock();
            reduce(&mut state, &event);
        }
        self.observers.dispatch(&event);
    }
}

#[async_trait]
impl AgentTransport for HttpAgent {
    fn subscribe(&self, observer: std::sync::Arc<dyn EventObserver>) -> Subscription {
        self.observers.subscribe(observer)
    }

    fn add_message(&self, message: Message) {
        self.state.lock().push_message(message);
    }

    async fn run_agent(&self) -> Result<(), TransportError> {
        let run_id = Uuid::now_v7().to_string();
        let (messages, side_state) = {
            let state = self.state.lock();
            (state.transcript().to_vec(), state.side_state().cloned())
        };
        debug!(
            thread_id = %self.thread_id,
            run_id = %run_id,
            message_count = messages.len(),
            "starting agent run"
        );

        let body = RunAgentInput {
            thread_id: &self.thread_id,
            run_id: &run_id,
            messages: &messages,
            tools: &[],
            context: &[],
            state: side_state.as_ref(),
        };
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut events = response.bytes_stream().eventsource();
        while let Some(item) = events.next().await {
            let sse = item.map_err(|error| TransportError::Stream {
                message: error.to_string(),
            })?;
            self.ingest(&sse.data);
        }
        debug!(run_id = %run_id, "agent run stream drained");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use confab_core::Role;

    struct Collector(Mutex<Vec<Event>>);

    impl EventObserver for Collector {
        fn on_event(&self, event: &Event) {
            self.0.lock().push(event.clone());
        }
    }

    fn sse_body(payloads: &[Value]) -> String {
        payloads
            .iter()
            .map(|p| format!("data: {p}\n\n"))
            .collect()
    }

    fn sse_response(payloads: &[Value]) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(sse_body(payloads), "text/event-stream")
    }

    #[tokio::test]
    async fn run_dispatches_decoded_events_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run"))
            .respond_with(sse_response(&[
                json!({"type": "RUN_STARTED", "threadId": "t", "runId": "r"}),
                json!({"type": "TEXT_MESSAGE_START", "messageId": "m1"}),
                json!({"type": "TEXT_MESSAGE_CONTENT", "messageId": "m1", "delta": "hi"}),
                json!({"type": "RUN_FINISHED", "threadId": "t", "runId": "r"}),
            ]))
            .mount(&server)
            .await;

        let agent = HttpAgent::new(format!("{}/run", server.uri()));
        let collector = Arc::new(Collector(Mutex::new(Vec::new())));
        let _subscription = agent.subscribe(collector.clone());

        agent.run_agent().await.unwrap();

        let events = collector.0.lock();
        assert_eq!(events.len(), 4);
        assert_matches!(&events[0], Event::RunStarted { .. });
        assert_matches!(&events[2], Event::TextMessageContent { delta, .. } => {
            assert_eq!(delta, "hi");
        });
    }

    #[tokio::test]
    async fn agent_tracks_the_conversation_internally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "hello"}],
            })))
            .respond_with(sse_response(&[
                json!({"type": "TEXT_MESSAGE_START", "messageId": "m1"}),
                json!({"type": "TEXT_MESSAGE_CONTENT", "messageId": "m1", "delta": "world"}),
            ]))
            .expect(1)
            .mount(&server)
            .await;

        let agent = HttpAgent::new(server.uri());
        agent.add_message(Message::user("hello"));
        agent.run_agent().await.unwrap();

        // The streamed assistant reply joined the internal history.
        let state = agent.state.lock();
        assert_eq!(state.transcript().len(), 2);
        assert_eq!(state.transcript()[1].role, Role::Assistant);
        assert_eq!(state.transcript()[1].content, "world");
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer sekrit"))
            .respond_with(sse_response(&[]))
            .expect(1)
            .mount(&server)
            .await;

        let agent = HttpAgent::new(server.uri()).with_bearer_token("sekrit");
        agent.run_agent().await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let agent = HttpAgent::new(server.uri());
        let error = agent.run_agent().await.unwrap_err();
        assert_matches!(error, TransportError::Api { status: 503, message } => {
            assert_eq!(message, "overloaded");
        });
    }

    #[tokio::test]
    async fn undecodable_payloads_are_skipped_not_fatal() {
        let server = MockServer::start().await;
        let body = "data: not json\n\ndata: {\"type\": \"RUN_FINISHED\"}\n\n";
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let agent = HttpAgent::new(server.uri());
        let collector = Arc::new(Collector(Mutex::new(Vec::new())));
        let _subscription = agent.subscribe(collector.clone());

        agent.run_agent().await.unwrap();
        assert_eq!(collector.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn unknown_tags_still_reach_observers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(sse_response(&[
                json!({"type": "TOOL_CALL_START", "toolCallId": "tc"}),
            ]))
            .mount(&server)
            .await;

        let agent = HttpAgent::new(server.uri());
        let collector = Arc::new(Collector(Mutex::new(Vec::new())));
        let _subscription = agent.subscribe(collector.clone());

        agent.run_agent().await.unwrap();
        assert_matches!(&collector.0.lock()[0], Event::Unknown(_));
    }
}
