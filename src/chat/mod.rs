//! Chat — fallback conversation with an OpenAI-compatible model.
//!
//! Submodules:
//! - `client`: `ChatCompletion` trait and the session-keeping HTTP client
//! - `speech`: shortening replies for text-to-speech
//! - `types`: Chat Completions request/response types
//! - `errors`: chat error types

pub mod client;
pub mod errors;
pub mod speech;
pub mod types;

pub use client::{ChatClient, ChatCompletion};
pub use errors::ChatError;
pub use speech::speech_excerpt;
pub use types::{ChatMessage, Role};
