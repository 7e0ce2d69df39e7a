//! Dispatch error taxonomy.
//!
//! Every variant is caught where the collaborator is invoked and turned
//! into a bot message; none of them escapes `CommandDispatcher::dispatch`.

use thiserror::Error;

/// Failures met while handling one utterance.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A time phrase could not be understood.
    #[error("unrecognized time expression: {raw}")]
    RecognitionFailure { raw: String },

    /// A place could not be geocoded or no route exists.
    #[error("lookup failed: {what}")]
    LookupFailure { what: String },

    /// The user or platform refused access to a capability.
    #[error("permission denied: {capability}")]
    PermissionDenied { capability: String },

    /// A downstream service (chat, calendar, notification, linking) failed.
    #[error("{service} failed: {reason}")]
    IntegrationFailure { service: String, reason: String },
}

impl DispatchError {
    pub fn integration(service: &str, reason: impl ToString) -> Self {
        DispatchError::IntegrationFailure {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the feature should be skipped quietly rather than reported.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DispatchError::PermissionDenied { .. })
    }
}
