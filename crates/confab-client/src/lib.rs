//! # confab-client
//!
//! Agent transport and session lifecycle over the `confab-core` reducer.
//!
//! - **Transport contract**: [`transport::AgentTransport`] +
//!   [`transport::EventObserver`] — queue outbound messages, trigger runs,
//!   fan incoming protocol events out to subscribers
//! - **HTTP transport**: [`http::HttpAgent`] — POSTs the conversation to an
//!   AG-UI endpoint and decodes the SSE response stream
//! - **Session**: [`session::SessionController`] — owns one subscription and
//!   one [`confab_core::ConversationState`], reduces every event, and
//!   publishes each new state to watchers
//!
//! ## Crate Position
//!
//! Sits between `confab-core` (pure reduction) and consumers (a UI layer or
//! the `confab` binary).

#![deny(unsafe_code)]

pub mod errors;
pub mod http;
pub mod session;
pub mod transport;

pub use errors::{SessionError, TransportError};
pub use http::HttpAgent;
pub use session::SessionController;
pub use transport::{AgentTransport, EventObserver, ObserverSet, Subscription};
