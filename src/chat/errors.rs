//! Chat error types.

use thiserror::Error;

/// Errors from the chat completion backend.
#[derive(Debug, Error)]
pub enum ChatError {
    /// TCP/HTTP connection to the model endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Non-2xx HTTP response from the model endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body was not a chat completion.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// The model answered with no text.
    #[error("model returned an empty reply")]
    EmptyReply,
}
