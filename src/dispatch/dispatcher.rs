//! CommandDispatcher — one utterance in, one handled intent out.
//!
//! Classifies with [`IntentMatchers`], runs the matching handler, and falls
//! back to the chat backend. Handlers never touch UI state: every visible
//! change is a [`ConversationEvent`] tagged with the request id, sent to
//! the caller's channel. Failures from collaborators are caught in the
//! handler that called them and turned into a bot message.
//!
//! Each `dispatch` call is Processing from its first poll until it returns
//! (or is dropped). Several calls may be in flight at once; they share only
//! the route history, which is locked briefly and never across an await.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::alarm;
use super::collaborators::{AlarmBackend, Clock, Confirmer, Linker, Speaker};
use super::errors::DispatchError;
use super::links;
use super::types::{
    Author, ConfirmationRequest, ConversationEvent, DispatchResult, DispatcherState, MapOverlay,
    Message, RequestId,
};
use crate::chat::{speech_excerpt, ChatCompletion};
use crate::config::{AssistantConfig, Platform};
use crate::geo::{round_km, GeoRoutingPipeline, RouteOutcome, RoutePath};
use crate::history::{RouteHistory, RouteSearchRecord};
use crate::intent::{next_occurrence, Intent, IntentMatchers, TimeExpressionParser};

// ─── Texts ──────────────────────────────────────────────────────────────────

pub const EMPTY_HISTORY_MESSAGE: &str = "Bạn chưa có lịch sử tìm kiếm bản đồ nào.";
pub const HISTORY_CLEARED_MESSAGE: &str = "Đã xóa lịch sử tìm kiếm bản đồ";
pub const HISTORY_CLEAR_CANCELLED_MESSAGE: &str = "Đã hủy xóa lịch sử tìm kiếm bản đồ.";
pub const HISTORY_CLEAR_FAILED_MESSAGE: &str =
    "Không thể xóa lịch sử tìm kiếm bản đồ. Vui lòng thử lại sau.";
pub const CHAT_LOADING_MESSAGE: &str = "Đang xử lý câu hỏi của bạn...";
pub const CHAT_APOLOGY_MESSAGE: &str =
    "Xin lỗi, tôi đang gặp sự cố khi xử lý yêu cầu của bạn. Vui lòng thử lại sau.";
const CHAT_APOLOGY_SPOKEN: &str = "Xin lỗi, tôi đang gặp sự cố khi xử lý yêu cầu của bạn";
const CLOCK_APP_UNAVAILABLE: &str = "Không thể mở ứng dụng đồng hồ";

// ─── Collaborators ──────────────────────────────────────────────────────────

/// Host integrations handed to the dispatcher.
#[derive(Clone)]
pub struct Collaborators {
    pub linker: Arc<dyn Linker>,
    pub alarms: Arc<dyn AlarmBackend>,
    pub speaker: Arc<dyn Speaker>,
    pub confirmer: Arc<dyn Confirmer>,
    pub clock: Arc<dyn Clock>,
}

// ─── CommandDispatcher ──────────────────────────────────────────────────────

pub struct CommandDispatcher {
    matchers: IntentMatchers,
    time_parser: TimeExpressionParser,
    geo: GeoRoutingPipeline,
    chat: Arc<dyn ChatCompletion>,
    host: Collaborators,
    history: Mutex<RouteHistory>,
    events: mpsc::UnboundedSender<ConversationEvent>,
    platform: Platform,
    next_request: AtomicU64,
    in_flight: Mutex<BTreeSet<RequestId>>,
}

/// Marks a request Processing for as long as it lives.
struct InFlight<'a> {
    dispatcher: &'a CommandDispatcher,
    request_id: RequestId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.dispatcher.finish(self.request_id);
    }
}

impl CommandDispatcher {
    pub fn new(
        config: &AssistantConfig,
        geo: GeoRoutingPipeline,
        chat: Arc<dyn ChatCompletion>,
        history: RouteHistory,
        host: Collaborators,
        events: mpsc::UnboundedSender<ConversationEvent>,
    ) -> Self {
        Self {
            matchers: IntentMatchers::new(config.directions.clone()),
            time_parser: TimeExpressionParser::new(&config.time.pm_markers),
            geo,
            chat,
            host,
            history: Mutex::new(history),
            events,
            platform: config.platform,
            next_request: AtomicU64::new(1),
            in_flight: Mutex::new(BTreeSet::new()),
        }
    }

    /// Idle when no dispatch is in flight.
    pub fn state(&self) -> DispatcherState {
        if self.lock_in_flight().is_empty() {
            DispatcherState::Idle
        } else {
            DispatcherState::Processing
        }
    }

    /// Saved route searches, most recent first.
    pub fn history(&self) -> Vec<RouteSearchRecord> {
        self.lock_history().recent().to_vec()
    }

    /// Handle one utterance end to end.
    ///
    /// Blank input is `Unhandled`. Anything else produces exactly one
    /// `Handled` result, the chat fallback included.
    pub async fn dispatch(&self, utterance: &str) -> DispatchResult {
        let text = utterance.trim();
        if text.is_empty() {
            return DispatchResult::Unhandled;
        }

        let guard = self.begin();
        let request_id = guard.request_id;

        self.host.speaker.stop();
        self.emit(ConversationEvent::MessageAdded {
            message: Message::new(Author::User, text, Some(request_id), self.host.clock.now()),
        });

        let intent = match self.matchers.match_intent(text) {
            Some((matcher, intent)) => {
                tracing::info!(
                    request_id = %request_id,
                    matcher = ?matcher,
                    intent = intent.kind(),
                    "utterance classified"
                );
                intent
            }
            None => {
                tracing::info!(request_id = %request_id, "no matcher fired, falling back to chat");
                Intent::Chat {
                    prompt: text.to_string(),
                }
            }
        };

        let summary = self.handle(request_id, &intent).await;
        drop(guard);

        DispatchResult::Handled {
            request_id,
            intent,
            summary,
        }
    }

    /// Re-run a saved search as a fresh directions request.
    ///
    /// Goes straight to the directions handler, whatever the labels say.
    /// The search is recorded again and becomes the most recent entry.
    /// `Unhandled` if no record has this id.
    pub async fn replay_history(&self, record_id: &str) -> DispatchResult {
        let record = self.lock_history().find(record_id).cloned();
        let Some(record) = record else {
            tracing::warn!(record_id, "history record not found");
            return DispatchResult::Unhandled;
        };

        let guard = self.begin();
        let request_id = guard.request_id;
        tracing::info!(request_id = %request_id, record_id, "replaying route search");

        self.host.speaker.stop();
        self.emit(ConversationEvent::MessageAdded {
            message: Message::new(
                Author::User,
                record.replay_utterance(),
                Some(request_id),
                self.host.clock.now(),
            ),
        });

        let summary = self
            .handle_directions(request_id, &record.start_label, &record.end_label)
            .await;
        drop(guard);

        DispatchResult::Handled {
            request_id,
            intent: Intent::Directions {
                start: record.start_label,
                end: record.end_label,
            },
            summary,
        }
    }

    /// Open walking directions in the maps app, or the website when the
    /// app link fails. Returns the URL that opened.
    pub async fn open_in_maps(&self, start: &str, end: &str) -> Result<String, DispatchError> {
        if let Some(url) = links::native_maps_url(self.platform, start, end) {
            match self.host.linker.open(&url).await {
                Ok(()) => return Ok(url),
                Err(e) => tracing::warn!(error = %e, "cannot open maps app, using website"),
            }
        }
        let url = links::web_maps_url(start, end);
        self.host.linker.open(&url).await?;
        Ok(url)
    }

    // ─── Request Lifecycle ──────────────────────────────────────────────

    fn begin(&self) -> InFlight<'_> {
        let request_id = RequestId(self.next_request.fetch_add(1, Ordering::Relaxed));
        self.lock_in_flight().insert(request_id);
        self.emit(ConversationEvent::RequestStarted { request_id });
        InFlight {
            dispatcher: self,
            request_id,
        }
    }

    fn finish(&self, request_id: RequestId) {
        self.lock_in_flight().remove(&request_id);
        self.emit(ConversationEvent::RequestFinished { request_id });
        tracing::debug!(request_id = %request_id, "request finished");
    }

    fn emit(&self, event: ConversationEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("conversation receiver dropped, event discarded");
        }
    }

    /// Post a bot message and return its id.
    fn say(&self, request_id: RequestId, text: &str) -> String {
        let message = Message::new(Author::Bot, text, Some(request_id), self.host.clock.now());
        let id = message.id.clone();
        self.emit(ConversationEvent::MessageAdded { message });
        id
    }

    fn update(
        &self,
        request_id: RequestId,
        message_id: &str,
        text: &str,
        is_loading: bool,
        show_map: bool,
    ) {
        self.emit(ConversationEvent::MessageUpdated {
            request_id,
            message_id: message_id.to_string(),
            text: text.to_string(),
            is_loading,
            show_map,
        });
    }

    fn lock_history(&self) -> MutexGuard<'_, RouteHistory> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, BTreeSet<RequestId>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ─── Handlers ───────────────────────────────────────────────────────

    async fn handle(&self, request_id: RequestId, intent: &Intent) -> String {
        match intent {
            Intent::Directions { start, end } => {
                self.handle_directions(request_id, start, end).await
            }
            Intent::Alarm { raw_time_text } => self.handle_alarm(request_id, raw_time_text).await,
            Intent::Search { query } => self.handle_search(request_id, query).await,
            Intent::Media { query } => self.handle_media(request_id, query).await,
            Intent::HistoryQuery => self.handle_history_query(request_id),
            Intent::HistoryClear => self.handle_history_clear(request_id).await,
            Intent::TimeQuery => self.handle_time_query(request_id),
            Intent::Chat { prompt } => self.handle_chat(request_id, prompt).await,
        }
    }

    async fn handle_directions(&self, request_id: RequestId, start: &str, end: &str) -> String {
        // Recorded before geocoding: the search itself succeeded.
        self.lock_history()
            .record(start, end, self.host.clock.now().with_timezone(&chrono::Utc));

        let message = Message::new(
            Author::Bot,
            format!("Đang tìm đường đi từ {start} đến {end}..."),
            Some(request_id),
            self.host.clock.now(),
        )
        .with_map();
        let message_id = message.id.clone();
        self.emit(ConversationEvent::MessageAdded { message });

        let outcome = self
            .geo
            .plan_route(start, end, |from, to| {
                self.emit(ConversationEvent::MapLocated {
                    request_id,
                    overlay: MapOverlay {
                        message_id: message_id.clone(),
                        start_name: start.to_string(),
                        end_name: end.to_string(),
                        start: from,
                        end: to,
                        route: RoutePath::default(),
                        distance_km: None,
                    },
                });
            })
            .await;

        match outcome {
            RouteOutcome::Found(plan) => {
                let km = round_km(plan.distance_km);
                tracing::info!(
                    request_id = %request_id,
                    points = plan.path.len(),
                    distance_km = km,
                    "route found"
                );
                self.emit(ConversationEvent::MapRouted {
                    request_id,
                    route: plan.path,
                    distance_km: km,
                });
                let text = format!("Đường đi từ {start} đến {end} (khoảng {km} km)");
                self.update(request_id, &message_id, &text, false, true);
                self.host
                    .speaker
                    .speak(&format!("Đã tìm thấy đường đi từ {start} đến {end}"));
                text
            }
            RouteOutcome::PlaceNotFound { name } => {
                let err = DispatchError::LookupFailure { what: name.clone() };
                tracing::info!(request_id = %request_id, error = %err, "directions degraded");
                let text = format!("Không thể tìm thấy địa điểm {name}");
                self.update(request_id, &message_id, &text, false, false);
                self.host.speaker.speak(&text);
                text
            }
            RouteOutcome::RouteUnavailable { .. } => {
                let err = DispatchError::LookupFailure {
                    what: format!("route {start} -> {end}"),
                };
                tracing::info!(request_id = %request_id, error = %err, "directions degraded");
                let text = format!("Không tìm được đường đi từ {start} đến {end}");
                // Endpoints are known, so the map keeps its markers.
                self.update(request_id, &message_id, &text, false, true);
                self.host.speaker.speak(&text);
                text
            }
        }
    }

    async fn handle_alarm(&self, request_id: RequestId, raw: &str) -> String {
        let now = self.host.clock.now();
        let target = self
            .time_parser
            .parse(raw)
            .hour_minute()
            .and_then(|(hour, minute)| Some((hour, minute, next_occurrence(&now, hour, minute)?)));

        let Some((hour, minute, target)) = target else {
            let err = DispatchError::RecognitionFailure {
                raw: raw.to_string(),
            };
            tracing::info!(request_id = %request_id, error = %err, "alarm not set");
            let text = alarm::unrecognized_time_message(raw);
            self.say(request_id, &text);
            return text;
        };

        let readable = alarm::readable_time(hour, minute);
        tracing::info!(
            request_id = %request_id,
            hour,
            minute,
            alarm_at = %target,
            platform = ?self.platform,
            "setting alarm"
        );

        let confirmation = match self.platform {
            Platform::Android => self
                .open_clock_app(hour, minute)
                .await
                .map(|()| alarm::android_requested_message(&readable)),
            Platform::Ios => Ok(alarm::ios_instructions(hour, minute)),
            Platform::Desktop => Ok(alarm::reminder_set_message(&readable)),
        };

        match confirmation {
            Ok(text) => {
                self.schedule_reminders(request_id, target).await;
                self.say(request_id, &text);
                text
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "alarm failed");
                let reason = match &e {
                    DispatchError::IntegrationFailure { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                let text = alarm::alarm_failed_message(&reason);
                self.say(request_id, &text);
                text
            }
        }
    }

    async fn open_clock_app(&self, hour: u32, minute: u32) -> Result<(), DispatchError> {
        let uris = links::android_alarm_uris(hour, minute);
        match links::open_first_available(self.host.linker.as_ref(), &uris).await {
            Ok(Some(url)) => {
                tracing::debug!(url = %url, "clock app opened");
                Ok(())
            }
            Ok(None) => Err(DispatchError::integration("clock app", CLOCK_APP_UNAVAILABLE)),
            Err(e) => {
                tracing::warn!(error = %e, "clock link failed");
                Err(DispatchError::integration("clock app", CLOCK_APP_UNAVAILABLE))
            }
        }
    }

    /// Calendar entry and notification. Failures here never fail the alarm.
    async fn schedule_reminders(
        &self,
        request_id: RequestId,
        target: chrono::DateTime<chrono::FixedOffset>,
    ) {
        if let Err(e) = self
            .host
            .alarms
            .add_calendar_event(&alarm::calendar_event(target))
            .await
        {
            log_reminder_failure(request_id, "calendar", &e);
        }

        if let Err(e) = self
            .host
            .alarms
            .schedule_notification(&alarm::alarm_notification(target))
            .await
        {
            log_reminder_failure(request_id, "notification", &e);
        }
    }

    async fn handle_search(&self, request_id: RequestId, query: &str) -> String {
        let text = format!("Đang mở Google tìm kiếm \"{query}\"...");
        self.say(request_id, &text);

        let url = links::google_search_url(query);
        if let Err(e) = self.host.linker.open(&url).await {
            tracing::warn!(request_id = %request_id, error = %e, "cannot open search");
        }

        self.host
            .speaker
            .speak(&format!("Đang mở Google tìm kiếm {query}"));
        text
    }

    async fn handle_media(&self, request_id: RequestId, query: &str) -> String {
        let text = format!("Đang mở video \"{query}\" trên YouTube...");
        self.say(request_id, &text);

        let candidates = links::youtube_candidates(query);
        let (apps, browser) = candidates.split_at(candidates.len() - 1);
        let opened = match links::open_first_available(self.host.linker.as_ref(), apps).await {
            Ok(opened) => opened,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "cannot open YouTube app");
                None
            }
        };
        if opened.is_none() {
            if let Err(e) = self.host.linker.open(&browser[0]).await {
                tracing::warn!(request_id = %request_id, error = %e, "cannot open YouTube");
            }
        }

        self.host
            .speaker
            .speak(&format!("Đang mở video {query} trên YouTube"));
        text
    }

    fn handle_history_query(&self, request_id: RequestId) -> String {
        let records = self.history();
        if records.is_empty() {
            self.say(request_id, EMPTY_HISTORY_MESSAGE);
            self.host.speaker.speak(EMPTY_HISTORY_MESSAGE);
            return EMPTY_HISTORY_MESSAGE.to_string();
        }

        let text = format!("Đây là {} tìm kiếm bản đồ gần đây của bạn.", records.len());
        self.emit(ConversationEvent::HistoryShown {
            request_id,
            records,
        });
        self.say(request_id, &text);
        text
    }

    async fn handle_history_clear(&self, request_id: RequestId) -> String {
        let approved = self
            .host
            .confirmer
            .confirm(ConfirmationRequest {
                request_id,
                title: "Xóa lịch sử".to_string(),
                message: "Bạn có chắc chắn muốn xóa tất cả lịch sử tìm kiếm bản đồ?".to_string(),
                confirm_label: "Xóa".to_string(),
                cancel_label: "Hủy".to_string(),
            })
            .await;

        if !approved {
            tracing::info!(request_id = %request_id, "history clear cancelled");
            self.say(request_id, HISTORY_CLEAR_CANCELLED_MESSAGE);
            return HISTORY_CLEAR_CANCELLED_MESSAGE.to_string();
        }

        let cleared = self.lock_history().clear();
        match cleared {
            Ok(()) => {
                self.emit(ConversationEvent::HistoryCleared { request_id });
                self.say(request_id, HISTORY_CLEARED_MESSAGE);
                self.host.speaker.speak(HISTORY_CLEARED_MESSAGE);
                HISTORY_CLEARED_MESSAGE.to_string()
            }
            Err(e) => {
                let err = DispatchError::integration("history store", e);
                tracing::warn!(request_id = %request_id, error = %err, "history clear failed");
                self.say(request_id, HISTORY_CLEAR_FAILED_MESSAGE);
                HISTORY_CLEAR_FAILED_MESSAGE.to_string()
            }
        }
    }

    fn handle_time_query(&self, request_id: RequestId) -> String {
        let now = self.host.clock.now();
        let text = format!(
            "Bây giờ là {}, ngày {}",
            now.format("%H:%M:%S"),
            now.format("%-d/%-m/%Y")
        );
        self.host.speaker.speak(&text);
        self.say(request_id, &text);
        text
    }

    async fn handle_chat(&self, request_id: RequestId, prompt: &str) -> String {
        let message = Message::new(
            Author::Bot,
            CHAT_LOADING_MESSAGE,
            Some(request_id),
            self.host.clock.now(),
        )
        .loading();
        let message_id = message.id.clone();
        self.emit(ConversationEvent::MessageAdded { message });

        match self.chat.send_message(prompt).await {
            Ok(reply) => {
                self.update(request_id, &message_id, &reply, false, false);
                self.host.speaker.speak(&speech_excerpt(&reply));
                reply
            }
            Err(e) => {
                let err = DispatchError::integration("chat", e);
                tracing::warn!(request_id = %request_id, error = %err, "chat fallback failed");
                self.update(request_id, &message_id, CHAT_APOLOGY_MESSAGE, false, false);
                self.host.speaker.speak(CHAT_APOLOGY_SPOKEN);
                CHAT_APOLOGY_MESSAGE.to_string()
            }
        }
    }
}

fn log_reminder_failure(request_id: RequestId, what: &str, e: &DispatchError) {
    if e.is_permission_denied() {
        tracing::info!(request_id = %request_id, reminder = what, error = %e, "reminder skipped");
    } else {
        tracing::warn!(request_id = %request_id, reminder = what, error = %e, "reminder failed");
    }
}
