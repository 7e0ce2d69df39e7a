//! Voice Router demo REPL.
//!
//! Reads utterances from stdin, dispatches them, and prints the
//! conversation as it changes. Links, alarms and speech are printed instead
//! of performed. Lines starting with `:` are REPL commands.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use voice_router::chat::ChatClient;
use voice_router::config::load_or_default;
use voice_router::dispatch::{
    AlarmBackend, AlarmNotification, Author, CalendarEvent, Clock, Collaborators,
    CommandDispatcher, ConfirmationRequest, Confirmer, ConversationEvent, ConversationState,
    DispatchError, Linker, Speaker, SystemClock,
};
use voice_router::geo::{GeoRoutingPipeline, HttpGeoClient};

const HELP: &str = "\
:history        list saved route searches
:replay <n>     re-run search number n
:maps <n>       open search number n in the maps app
:help           show this help
:quit           exit";

// ─── Console Collaborators ──────────────────────────────────────────────────

/// Accepts web URLs only; app schemes are reported as unavailable.
struct ConsoleLinker;

#[async_trait]
impl Linker for ConsoleLinker {
    async fn can_open(&self, url: &str) -> bool {
        url.starts_with("https://") || url.starts_with("http://")
    }

    async fn open(&self, url: &str) -> Result<(), DispatchError> {
        if !self.can_open(url).await {
            return Err(DispatchError::integration("linking", format!("no handler for {url}")));
        }
        println!("  [mở] {url}");
        Ok(())
    }
}

struct ConsoleAlarms;

#[async_trait]
impl AlarmBackend for ConsoleAlarms {
    async fn add_calendar_event(&self, event: &CalendarEvent) -> Result<(), DispatchError> {
        println!(
            "  [lịch] {} {} → {}",
            event.title,
            event.start.format("%d/%m/%Y %H:%M"),
            event.end.format("%H:%M")
        );
        Ok(())
    }

    async fn schedule_notification(
        &self,
        notification: &AlarmNotification,
    ) -> Result<(), DispatchError> {
        println!(
            "  [thông báo] {} lúc {}",
            notification.body,
            notification.fire_at.format("%d/%m/%Y %H:%M")
        );
        Ok(())
    }
}

struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, text: &str) {
        println!("  [nói] {text}");
    }

    fn stop(&self) {}
}

/// Reads the answer from the same line queue the REPL reads from.
struct ConsoleConfirmer {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
}

#[async_trait]
impl Confirmer for ConsoleConfirmer {
    async fn confirm(&self, request: ConfirmationRequest) -> bool {
        print!(
            "{}: {} [{}/{}] (y/N) ",
            request.title, request.message, request.confirm_label, request.cancel_label
        );
        let _ = std::io::stdout().flush();

        match self.lines.lock().await.recv().await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "có"),
            None => false,
        }
    }
}

// ─── Event Printer ──────────────────────────────────────────────────────────

fn print_event(event: &ConversationEvent) {
    match event {
        ConversationEvent::MessageAdded { message } if message.author == Author::Bot => {
            println!("bot: {}", message.text);
        }
        ConversationEvent::MessageUpdated { text, .. } => {
            println!("bot: {text}");
        }
        ConversationEvent::MapLocated { overlay, .. } => {
            println!(
                "  [bản đồ] {} ({:.5}, {:.5}) → {} ({:.5}, {:.5})",
                overlay.start_name,
                overlay.start.latitude,
                overlay.start.longitude,
                overlay.end_name,
                overlay.end.latitude,
                overlay.end.longitude
            );
        }
        ConversationEvent::MapRouted {
            route, distance_km, ..
        } => {
            println!("  [bản đồ] {} điểm, {distance_km} km", route.len());
        }
        ConversationEvent::HistoryShown { records, .. } => {
            for (i, record) in records.iter().enumerate() {
                println!(
                    "  {}. {} → {} ({})",
                    i + 1,
                    record.start_label,
                    record.end_label,
                    record.timestamp.format("%d/%m/%Y %H:%M")
                );
            }
        }
        _ => {}
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_path = voice_router::init_tracing().context("failed to initialize logging")?;

    let cwd = std::env::current_dir().context("cannot read current directory")?;
    let config = load_or_default(&cwd).context("failed to load configuration")?;

    let geo = HttpGeoClient::new(config.geo.clone()).context("failed to build geo client")?;
    let chat = ChatClient::new(config.chat.clone()).context("failed to build chat client")?;
    let history = voice_router::open_history(&config.history);

    // Stdin lines feed both the REPL loop and the confirmer.
    let (line_tx, line_rx) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });
    let lines = Arc::new(Mutex::new(line_rx));

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let clock = Arc::new(SystemClock);
    let host = Collaborators {
        linker: Arc::new(ConsoleLinker),
        alarms: Arc::new(ConsoleAlarms),
        speaker: Arc::new(ConsoleSpeaker),
        confirmer: Arc::new(ConsoleConfirmer {
            lines: lines.clone(),
        }),
        clock: clock.clone(),
    };

    let dispatcher = CommandDispatcher::new(
        &config,
        GeoRoutingPipeline::new(Arc::new(geo)),
        Arc::new(chat),
        history,
        host,
        events_tx,
    );

    let mut state = ConversationState::new(clock.now());
    if let Some(welcome) = state.last_message() {
        println!("bot: {}", welcome.text);
    }
    println!("(log: {}; :help for commands)", log_path.display());

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.lock().await.recv().await else {
            break;
        };
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) | (":q", _) => break,
            (":help", _) => println!("{HELP}"),
            (":history", _) => {
                let records = dispatcher.history();
                if records.is_empty() {
                    println!("(trống)");
                }
                for (i, record) in records.iter().enumerate() {
                    println!("  {}. {} → {}", i + 1, record.start_label, record.end_label);
                }
            }
            (":replay", arg) | (":maps", arg) => {
                let record = arg
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| dispatcher.history().get(i).cloned());
                let Some(record) = record else {
                    println!("(không có mục này)");
                    continue;
                };
                if line.starts_with(":replay") {
                    state.hide_history();
                    dispatcher.replay_history(&record.id).await;
                } else if let Err(e) = dispatcher
                    .open_in_maps(&record.start_label, &record.end_label)
                    .await
                {
                    println!("(không mở được bản đồ: {e})");
                }
            }
            _ => {
                dispatcher.dispatch(line).await;
            }
        }

        while let Ok(event) = events_rx.try_recv() {
            print_event(&event);
            state.apply(event);
        }
        tracing::debug!(
            messages = state.messages.len(),
            idle = state.is_idle(),
            "conversation updated"
        );
    }

    tracing::info!("=== Voice Router stopped ===");
    Ok(())
}
