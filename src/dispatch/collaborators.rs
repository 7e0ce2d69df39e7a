//! Host-side collaborators the dispatcher drives.
//!
//! Everything platform-specific (opening URLs, calendars, notifications,
//! text-to-speech, confirmation dialogs, the wall clock) sits behind these
//! traits so the dispatcher can run headless and in tests.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use tokio::sync::{mpsc, oneshot};

use super::errors::DispatchError;
use super::types::{AlarmNotification, CalendarEvent, ConfirmationRequest};

/// Opens URLs and app deep links.
#[async_trait]
pub trait Linker: Send + Sync {
    /// Whether some installed handler accepts this URL.
    async fn can_open(&self, url: &str) -> bool;

    async fn open(&self, url: &str) -> Result<(), DispatchError>;
}

/// Calendar and local-notification access for alarms.
#[async_trait]
pub trait AlarmBackend: Send + Sync {
    async fn add_calendar_event(&self, event: &CalendarEvent) -> Result<(), DispatchError>;

    async fn schedule_notification(
        &self,
        notification: &AlarmNotification,
    ) -> Result<(), DispatchError>;
}

/// Text-to-speech. Fire-and-forget.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str);

    /// Cut off whatever is being spoken.
    fn stop(&self);
}

/// Asks the user to approve a destructive action.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// `true` only on explicit approval.
    async fn confirm(&self, request: ConfirmationRequest) -> bool;
}

/// Source of "now" in the user's local offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

// ─── Implementations ────────────────────────────────────────────────────────

/// The machine's local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Confirmation request paired with the channel for its answer.
#[derive(Debug)]
pub struct PendingConfirmation {
    pub request: ConfirmationRequest,
    pub respond: oneshot::Sender<bool>,
}

/// Forwards confirmation requests to a UI task over a channel.
///
/// The UI side receives [`PendingConfirmation`]s and answers through
/// `respond`. A closed channel or a dropped responder counts as "no".
#[derive(Debug, Clone)]
pub struct ChannelConfirmer {
    tx: mpsc::Sender<PendingConfirmation>,
}

impl ChannelConfirmer {
    /// Create the confirmer and the receiving end for the UI.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PendingConfirmation>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Confirmer for ChannelConfirmer {
    async fn confirm(&self, request: ConfirmationRequest) -> bool {
        let request_id = request.request_id;
        let (respond, answer) = oneshot::channel();

        if self
            .tx
            .send(PendingConfirmation { request, respond })
            .await
            .is_err()
        {
            tracing::warn!(
                request_id = %request_id,
                "confirmation channel closed, treating as rejected"
            );
            return false;
        }

        match answer.await {
            Ok(approved) => approved,
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    "confirmation dropped, treating as rejected"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::types::RequestId;

    fn request() -> ConfirmationRequest {
        ConfirmationRequest {
            request_id: RequestId(1),
            title: "Xóa lịch sử".into(),
            message: "?".into(),
            confirm_label: "Xóa".into(),
            cancel_label: "Hủy".into(),
        }
    }

    #[tokio::test]
    async fn test_channel_confirmer_approved() {
        let (confirmer, mut rx) = ChannelConfirmer::new(4);
        let ui = tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            assert_eq!(pending.request.confirm_label, "Xóa");
            pending.respond.send(true).unwrap();
        });
        assert!(confirmer.confirm(request()).await);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_confirmer_dropped_is_rejected() {
        let (confirmer, mut rx) = ChannelConfirmer::new(4);
        let ui = tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            drop(pending.respond);
        });
        assert!(!confirmer.confirm(request()).await);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_confirmer_closed_is_rejected() {
        let (confirmer, rx) = ChannelConfirmer::new(4);
        drop(rx);
        assert!(!confirmer.confirm(request()).await);
    }

    #[test]
    fn test_system_clock_tracks_utc() {
        let drift = SystemClock.now().signed_duration_since(chrono::Utc::now());
        assert!(drift.num_seconds().abs() < 5);
    }
}
