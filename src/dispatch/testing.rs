//! In-memory collaborators for dispatcher tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use tokio::sync::mpsc;

use super::collaborators::{AlarmBackend, Clock, Confirmer, Linker, Speaker};
use super::dispatcher::{Collaborators, CommandDispatcher};
use super::errors::DispatchError;
use super::state::ConversationState;
use super::types::{
    AlarmNotification, CalendarEvent, ConfirmationRequest, ConversationEvent,
};
use crate::chat::{ChatCompletion, ChatError};
use crate::config::{AssistantConfig, Platform};
use crate::geo::{Coordinate, GeoError, GeoRoutingPipeline, GeoService};
use crate::history::route_history::DEFAULT_CAPACITY;
use crate::history::{MemoryHistoryStore, RouteHistory};

// ─── Geo ────────────────────────────────────────────────────────────────────

pub struct FakeGeo {
    places: HashMap<String, Coordinate>,
    delays: HashMap<String, Duration>,
    geometry: Option<String>,
}

impl FakeGeo {
    /// Knows no places at all.
    pub fn empty() -> Self {
        Self {
            places: HashMap::new(),
            delays: HashMap::new(),
            geometry: None,
        }
    }

    /// Knows "Hồ Gươm" and "Ngã Tư Sở"; routes return `geometry`.
    pub fn hanoi(geometry: Option<&str>) -> Self {
        Self::empty()
            .with_place("Hồ Gươm", Coordinate::new(21.0288, 105.8525))
            .with_place("Ngã Tư Sở", Coordinate::new(21.0031, 105.8201))
            .with_geometry(geometry)
    }

    pub fn with_place(mut self, name: &str, coord: Coordinate) -> Self {
        self.places.insert(name.to_string(), coord);
        self
    }

    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    pub fn with_geometry(mut self, geometry: Option<&str>) -> Self {
        self.geometry = geometry.map(String::from);
        self
    }
}

#[async_trait]
impl GeoService for FakeGeo {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeoError> {
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.places.get(query).copied())
    }

    async fn route_geometry(
        &self,
        _from: Coordinate,
        _to: Coordinate,
    ) -> Result<Option<String>, GeoError> {
        Ok(self.geometry.clone())
    }
}

// ─── Host ───────────────────────────────────────────────────────────────────

/// `can_open` answers from a prefix allow-list; `open` succeeds unless the
/// URL matches a rejected prefix. Every successful open is recorded.
#[derive(Default)]
pub struct RecordingLinker {
    accepts: Option<Vec<String>>,
    rejects: Vec<String>,
    opened: Mutex<Vec<String>>,
}

impl RecordingLinker {
    pub fn accepting_all() -> Self {
        Self::default()
    }

    pub fn accepting(prefixes: &[&str]) -> Self {
        Self {
            accepts: Some(prefixes.iter().map(|p| p.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn rejecting_prefix(prefix: &str) -> Self {
        Self {
            rejects: vec![prefix.to_string()],
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Linker for RecordingLinker {
    async fn can_open(&self, url: &str) -> bool {
        match &self.accepts {
            Some(prefixes) => prefixes.iter().any(|p| url.starts_with(p.as_str())),
            None => true,
        }
    }

    async fn open(&self, url: &str) -> Result<(), DispatchError> {
        if self.rejects.iter().any(|p| url.starts_with(p.as_str())) {
            return Err(DispatchError::integration("linking", "no handler"));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAlarms {
    fail: bool,
    calendar: Mutex<Vec<CalendarEvent>>,
    notifications: Mutex<Vec<AlarmNotification>>,
}

impl RecordingAlarms {
    /// Calendar refuses permission, notifications error out.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calendar_events(&self) -> Vec<CalendarEvent> {
        self.calendar.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<AlarmNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlarmBackend for RecordingAlarms {
    async fn add_calendar_event(&self, event: &CalendarEvent) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError::PermissionDenied {
                capability: "calendar".into(),
            });
        }
        self.calendar.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn schedule_notification(
        &self,
        notification: &AlarmNotification,
    ) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError::integration("notifications", "scheduler offline"));
        }
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
    stops: Mutex<usize>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }

    fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
    }
}

pub struct FixedConfirmer {
    answer: bool,
    asked: Mutex<usize>,
}

impl FixedConfirmer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        *self.asked.lock().unwrap()
    }
}

#[async_trait]
impl Confirmer for FixedConfirmer {
    async fn confirm(&self, _request: ConfirmationRequest) -> bool {
        *self.asked.lock().unwrap() += 1;
        self.answer
    }
}

pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// 2026-10-19 08:00 in Hanoi.
pub fn hanoi_morning() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(7 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 19, 8, 0, 0)
        .unwrap()
}

// ─── Chat ───────────────────────────────────────────────────────────────────

pub struct CountingChat {
    failure: Mutex<Option<ChatError>>,
    calls: Mutex<Vec<String>>,
}

impl CountingChat {
    pub const REPLY: &'static str = "Đây là câu trả lời.";

    pub fn replying() -> Self {
        Self {
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails the first call with `error`, replies afterwards.
    pub fn failing(error: ChatError) -> Self {
        Self {
            failure: Mutex::new(Some(error)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletion for CountingChat {
    async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        self.calls.lock().unwrap().push(text.to_string());
        match self.failure.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(Self::REPLY.to_string()),
        }
    }
}

// ─── Harness ────────────────────────────────────────────────────────────────

/// Pieces a test may swap before the dispatcher is built.
pub struct Parts {
    pub platform: Platform,
    pub linker: Arc<RecordingLinker>,
    pub alarms: Arc<RecordingAlarms>,
    pub speaker: Arc<RecordingSpeaker>,
    pub confirmer: Arc<FixedConfirmer>,
    pub chat: Arc<CountingChat>,
    pub history: RouteHistory,
}

pub struct Harness {
    pub dispatcher: CommandDispatcher,
    pub linker: Arc<RecordingLinker>,
    pub alarms: Arc<RecordingAlarms>,
    pub speaker: Arc<RecordingSpeaker>,
    pub confirmer: Arc<FixedConfirmer>,
    pub chat: Arc<CountingChat>,
    events: Mutex<mpsc::UnboundedReceiver<ConversationEvent>>,
}

impl Harness {
    pub fn new(geo: FakeGeo) -> Self {
        Self::with(geo, |_| {})
    }

    pub fn with(geo: FakeGeo, customize: impl FnOnce(&mut Parts)) -> Self {
        let mut parts = Parts {
            platform: Platform::Desktop,
            linker: Arc::new(RecordingLinker::accepting_all()),
            alarms: Arc::new(RecordingAlarms::default()),
            speaker: Arc::new(RecordingSpeaker::default()),
            confirmer: Arc::new(FixedConfirmer::new(true)),
            chat: Arc::new(CountingChat::replying()),
            history: RouteHistory::open(Box::new(MemoryHistoryStore::new()), DEFAULT_CAPACITY),
        };
        customize(&mut parts);

        let config = AssistantConfig {
            platform: parts.platform,
            ..AssistantConfig::default()
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Collaborators {
            linker: parts.linker.clone(),
            alarms: parts.alarms.clone(),
            speaker: parts.speaker.clone(),
            confirmer: parts.confirmer.clone(),
            clock: Arc::new(FixedClock(hanoi_morning())),
        };
        let dispatcher = CommandDispatcher::new(
            &config,
            GeoRoutingPipeline::new(Arc::new(geo)),
            parts.chat.clone(),
            parts.history,
            host,
            tx,
        );

        Self {
            dispatcher,
            linker: parts.linker,
            alarms: parts.alarms,
            speaker: parts.speaker,
            confirmer: parts.confirmer,
            chat: parts.chat,
            events: Mutex::new(rx),
        }
    }

    /// Every event emitted so far.
    pub fn drain(&self) -> Vec<ConversationEvent> {
        let mut rx = self.events.lock().unwrap();
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Fold every event emitted so far into a fresh conversation.
    pub fn fold_events(&self) -> ConversationState {
        self.drain()
            .into_iter()
            .fold(ConversationState::new(hanoi_morning()), ConversationState::reduce)
    }
}
