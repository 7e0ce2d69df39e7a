//! ConversationState — the caller-owned view of the conversation.
//!
//! A reducer over [`ConversationEvent`]s. The dispatcher never touches this
//! state directly; it emits events tagged with a request id and the caller
//! folds them in. Map overlays are stored per request, and the displayed
//! overlay only moves forward to newer requests, so a slow earlier request
//! finishing late cannot replace a newer one's map.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset};

use super::types::{Author, ConversationEvent, MapOverlay, Message, RequestId};
use crate::history::RouteSearchRecord;

/// Greeting shown before the first utterance.
pub const WELCOME_MESSAGE: &str = "Xin chào! Tôi có thể giúp gì cho bạn?";

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub overlays: HashMap<RequestId, MapOverlay>,
    /// Request whose overlay is displayed.
    pub active_overlay: Option<RequestId>,
    /// Records shown in the history panel, if it is open.
    pub history_panel: Option<Vec<RouteSearchRecord>>,
    pub pending: BTreeSet<RequestId>,
}

impl ConversationState {
    /// Fresh conversation holding only the welcome message.
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            messages: vec![Message::new(Author::Bot, WELCOME_MESSAGE, None, now)],
            overlays: HashMap::new(),
            active_overlay: None,
            history_panel: None,
            pending: BTreeSet::new(),
        }
    }

    /// No request is being resolved.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn displayed_overlay(&self) -> Option<&MapOverlay> {
        self.active_overlay.and_then(|id| self.overlays.get(&id))
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Fold one event into the state.
    pub fn apply(&mut self, event: ConversationEvent) {
        match event {
            ConversationEvent::RequestStarted { request_id } => {
                self.pending.insert(request_id);
            }
            ConversationEvent::MessageAdded { message } => {
                self.messages.push(message);
            }
            ConversationEvent::MessageUpdated {
                message_id,
                text,
                is_loading,
                show_map,
                ..
            } => {
                if let Some(msg) = self.messages.iter_mut().find(|m| m.id == message_id) {
                    msg.text = text;
                    msg.is_loading = is_loading;
                    msg.show_map = show_map;
                }
            }
            ConversationEvent::MapLocated {
                request_id,
                overlay,
            } => {
                self.overlays.insert(request_id, overlay);
                if self.active_overlay.map_or(true, |active| request_id >= active) {
                    self.active_overlay = Some(request_id);
                }
            }
            ConversationEvent::MapRouted {
                request_id,
                route,
                distance_km,
            } => {
                if let Some(overlay) = self.overlays.get_mut(&request_id) {
                    overlay.route = route;
                    overlay.distance_km = Some(distance_km);
                }
            }
            ConversationEvent::HistoryShown { records, .. } => {
                self.history_panel = Some(records);
            }
            ConversationEvent::HistoryCleared { .. } => {
                if self.history_panel.is_some() {
                    self.history_panel = Some(Vec::new());
                }
            }
            ConversationEvent::RequestFinished { request_id } => {
                self.pending.remove(&request_id);
            }
        }
    }

    /// Owned-state variant of [`apply`](Self::apply).
    pub fn reduce(mut self, event: ConversationEvent) -> Self {
        self.apply(event);
        self
    }

    /// Close the history panel.
    pub fn hide_history(&mut self) {
        self.history_panel = None;
    }
}
