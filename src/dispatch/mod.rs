//! Dispatch — turning utterances into actions.
//!
//! Submodules:
//! - `dispatcher`: `CommandDispatcher`, the per-utterance orchestrator
//! - `state`: `ConversationState`, the caller-side reducer over events
//! - `collaborators`: host traits (linking, alarms, speech, confirmation, clock)
//! - `links`: search, video, maps and alarm URL builders
//! - `alarm`: alarm payloads and texts
//! - `types`: request ids, results, events, messages
//! - `errors`: the dispatch error taxonomy

pub mod alarm;
pub mod collaborators;
pub mod dispatcher;
pub mod errors;
pub mod links;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{
    AlarmBackend, ChannelConfirmer, Clock, Confirmer, Linker, PendingConfirmation, Speaker,
    SystemClock,
};
pub use dispatcher::{Collaborators, CommandDispatcher};
pub use errors::DispatchError;
pub use state::ConversationState;
pub use types::{
    AlarmNotification, Author, CalendarEvent, ConfirmationRequest, ConversationEvent,
    DispatchResult, DispatcherState, MapOverlay, Message, RequestId,
};
