//! Client error types.

use thiserror::Error;

/// Errors surfaced by an agent transport.
///
/// These are never absorbed by the session layer: a failed `send` or run
/// trigger propagates unchanged to the caller, and the core does not retry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Agent endpoint returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the endpoint.
        message: String,
    },

    /// The SSE stream broke mid-run.
    #[error("SSE stream error: {message}")]
    Stream {
        /// Error description.
        message: String,
    },
}

/// Errors surfaced by [`crate::session::SessionController`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// `start()` was called while a subscription is already active.
    /// Starting twice must never create two independent transcripts.
    #[error("session already started")]
    AlreadyStarted,
}
