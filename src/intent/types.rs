//! Intent and parsed-time types.

use serde::Serialize;

/// The classified goal of one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Set an alarm. The time phrase is parsed by the handler, not the
    /// matcher, so an unparseable phrase still classifies as an alarm.
    Alarm { raw_time_text: String },
    /// Open a web search.
    Search { query: String },
    /// Open a video search.
    Media { query: String },
    /// Route between two named places.
    Directions { start: String, end: String },
    /// Show saved route searches.
    HistoryQuery,
    /// Wipe saved route searches.
    HistoryClear,
    /// Tell the current time.
    TimeQuery,
    /// Nothing matched; hand the text to the chat backend.
    Chat { prompt: String },
}

impl Intent {
    /// Short stable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Alarm { .. } => "alarm",
            Intent::Search { .. } => "search",
            Intent::Media { .. } => "media",
            Intent::Directions { .. } => "directions",
            Intent::HistoryQuery => "history_query",
            Intent::HistoryClear => "history_clear",
            Intent::TimeQuery => "time_query",
            Intent::Chat { .. } => "chat",
        }
    }
}

/// Result of parsing a time phrase.
///
/// When not `Unrecognized`, hour is in `0..=23` and minute in `0..=59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParsedTime {
    At { hour: u32, minute: u32 },
    Unrecognized,
}

impl ParsedTime {
    /// `(hour, minute)` if the phrase was understood.
    pub fn hour_minute(&self) -> Option<(u32, u32)> {
        match *self {
            ParsedTime::At { hour, minute } => Some((hour, minute)),
            ParsedTime::Unrecognized => None,
        }
    }
}
