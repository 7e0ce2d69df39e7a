//! Dispatch types: request ids, results, conversation events.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::geo::{Coordinate, RoutePath};
use crate::history::RouteSearchRecord;
use crate::intent::Intent;

// ─── Request Correlation ────────────────────────────────────────────────────

/// Opaque id of one submitted utterance.
///
/// Ids grow with submission order, so a larger id is a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Whether the dispatcher is resolving anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    Idle,
    Processing,
}

// ─── Results ────────────────────────────────────────────────────────────────

/// Outcome of one `dispatch` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchResult {
    /// An intent ran (the chat fallback included). `summary` is the final
    /// text shown to the user.
    Handled {
        request_id: RequestId,
        intent: Intent,
        summary: String,
    },
    /// Blank input; nothing was done.
    Unhandled,
}

impl DispatchResult {
    pub fn intent(&self) -> Option<&Intent> {
        match self {
            DispatchResult::Handled { intent, .. } => Some(intent),
            DispatchResult::Unhandled => None,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            DispatchResult::Handled { summary, .. } => Some(summary),
            DispatchResult::Unhandled => None,
        }
    }

    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            DispatchResult::Handled { request_id, .. } => Some(*request_id),
            DispatchResult::Unhandled => None,
        }
    }
}

// ─── Conversation ───────────────────────────────────────────────────────────

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Bot,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub author: Author,
    pub text: String,
    /// The request this message belongs to. `None` for the welcome message.
    pub request_id: Option<RequestId>,
    /// Placeholder waiting for a network reply.
    pub is_loading: bool,
    /// A map should be rendered under this message.
    pub show_map: bool,
    pub timestamp: DateTime<FixedOffset>,
}

impl Message {
    pub fn new(
        author: Author,
        text: impl Into<String>,
        request_id: Option<RequestId>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author,
            text: text.into(),
            request_id,
            is_loading: false,
            show_map: false,
            timestamp,
        }
    }

    pub fn loading(mut self) -> Self {
        self.is_loading = true;
        self
    }

    pub fn with_map(mut self) -> Self {
        self.show_map = true;
        self
    }
}

/// Map overlay for one directions request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOverlay {
    /// Message the map is drawn under.
    pub message_id: String,
    pub start_name: String,
    pub end_name: String,
    pub start: Coordinate,
    pub end: Coordinate,
    /// Empty until the route arrives.
    pub route: RoutePath,
    pub distance_km: Option<f64>,
}

/// State change emitted by the dispatcher, tagged with its request.
///
/// The caller folds these into a [`ConversationState`](super::ConversationState).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversationEvent {
    RequestStarted {
        request_id: RequestId,
    },
    MessageAdded {
        message: Message,
    },
    /// Replace the text (and flags) of an earlier message in place.
    MessageUpdated {
        request_id: RequestId,
        message_id: String,
        text: String,
        is_loading: bool,
        show_map: bool,
    },
    /// Both endpoints resolved; the route is still loading.
    MapLocated {
        request_id: RequestId,
        overlay: MapOverlay,
    },
    MapRouted {
        request_id: RequestId,
        route: RoutePath,
        distance_km: f64,
    },
    HistoryShown {
        request_id: RequestId,
        records: Vec<RouteSearchRecord>,
    },
    HistoryCleared {
        request_id: RequestId,
    },
    RequestFinished {
        request_id: RequestId,
    },
}

impl ConversationEvent {
    /// The request this event belongs to, if any.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            ConversationEvent::RequestStarted { request_id }
            | ConversationEvent::MessageUpdated { request_id, .. }
            | ConversationEvent::MapLocated { request_id, .. }
            | ConversationEvent::MapRouted { request_id, .. }
            | ConversationEvent::HistoryShown { request_id, .. }
            | ConversationEvent::HistoryCleared { request_id }
            | ConversationEvent::RequestFinished { request_id } => Some(*request_id),
            ConversationEvent::MessageAdded { message } => message.request_id,
        }
    }
}

// ─── Alarm Payloads ─────────────────────────────────────────────────────────

/// Calendar entry created for an alarm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Reminder offset from `start`, in minutes.
    pub reminder_offset_minutes: i64,
}

/// Action button on an alarm notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub identifier: String,
    pub title: String,
    pub is_destructive: bool,
}

/// Local notification fired at the alarm time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmNotification {
    pub title: String,
    pub body: String,
    pub category: String,
    pub fire_at: DateTime<FixedOffset>,
    pub actions: Vec<NotificationAction>,
}

/// Sent to the user before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationRequest {
    pub request_id: RequestId,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}
