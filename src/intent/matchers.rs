//! IntentMatchers — ordered, pattern-based recognizers.
//!
//! Each matcher is a pure `fn(&str) -> Option<Intent>`. [`IntentMatchers`]
//! runs them in a fixed order and the first hit wins:
//!
//! 1. history (clear before query)
//! 2. web search
//! 3. media search
//! 4. alarm
//! 5. directions
//! 6. time query
//!
//! Specific triggers come before broad ones: directions keywords show up
//! inside many other phrasings, and history phrases contain "tìm kiếm".
//! Keyword checks run on lowercased text; payloads are cut from the
//! original text so place names and queries keep their casing.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Intent;
use crate::config::DirectionsConfig;

// ─── Vocabulary ──────────────────────────────────────────────────────────────

/// Phrases that wipe the route history. Both tone-mark placements of "xóa".
const HISTORY_CLEAR_PHRASES: &[&str] = &["xóa lịch sử", "xoá lịch sử"];

/// Phrases that open the route history.
const HISTORY_QUERY_PHRASES: &[&str] = &[
    "lịch sử tìm kiếm",
    "lịch sử bản đồ",
    "lịch sử chỉ đường",
    "xem lịch sử",
];

/// Keywords that mark a directions request.
const DIRECTIONS_KEYWORDS: &[&str] = &["chỉ đường", "đường đi", "làm sao để đi"];

/// Keywords that mark a question about the current time.
const TIME_QUERY_KEYWORDS: &[&str] = &["mấy giờ", "thời gian"];

static SEARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:tìm kiếm|tìm|search|google)\s+(.+)").expect("valid regex")
});

static MEDIA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:mở|tìm|phát|nghe|xem)\s+(?:bài hát|video|nhạc|youtube|clip)\s+(.+)")
        .expect("valid regex")
});

static ALARM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:đặt|cài|hẹn|báo|set)\s+(?:báo thức|báo|alarm|thức dậy|thức giấc)\s+(?:lúc|vào|cho|at|for)?\s*(.+)",
    )
    .expect("valid regex")
});

static FROM_TO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)từ\s+(.+?)\s+đến\s+(.+)").expect("valid regex"));

// ─── Matcher Table ───────────────────────────────────────────────────────────

/// Which recognizer produced an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    History,
    Search,
    Media,
    Alarm,
    Directions,
    TimeQuery,
}

/// Recognizers in priority order.
const PRIORITY: &[MatcherKind] = &[
    MatcherKind::History,
    MatcherKind::Search,
    MatcherKind::Media,
    MatcherKind::Alarm,
    MatcherKind::Directions,
    MatcherKind::TimeQuery,
];

/// The ordered matcher set, carrying the directions fallback pair.
#[derive(Debug, Clone)]
pub struct IntentMatchers {
    directions: DirectionsConfig,
}

impl Default for IntentMatchers {
    fn default() -> Self {
        Self::new(DirectionsConfig::default())
    }
}

impl IntentMatchers {
    pub fn new(directions: DirectionsConfig) -> Self {
        Self { directions }
    }

    /// First matching intent in priority order, with the matcher that fired.
    pub fn match_intent(&self, text: &str) -> Option<(MatcherKind, Intent)> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return None;
        }

        PRIORITY.iter().find_map(|&kind| {
            let intent = match kind {
                MatcherKind::History => match_history(&normalized),
                MatcherKind::Search => match_search(text),
                MatcherKind::Media => match_media(text),
                MatcherKind::Alarm => match_alarm(text),
                MatcherKind::Directions => match_directions(text, &self.directions),
                MatcherKind::TimeQuery => match_time_query(&normalized),
            };
            intent.map(|i| (kind, i))
        })
    }

    /// Classify `text`, falling back to [`Intent::Chat`] when nothing matches.
    pub fn classify(&self, text: &str) -> Intent {
        match self.match_intent(text) {
            Some((kind, intent)) => {
                tracing::debug!(matcher = ?kind, intent = intent.kind(), "intent matched");
                intent
            }
            None => Intent::Chat {
                prompt: text.trim().to_string(),
            },
        }
    }
}

// ─── Matchers ────────────────────────────────────────────────────────────────

/// Lowercase and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// History clear beats history query, whatever else the text contains.
pub fn match_history(normalized: &str) -> Option<Intent> {
    if HISTORY_CLEAR_PHRASES.iter().any(|p| normalized.contains(p)) {
        return Some(Intent::HistoryClear);
    }
    if HISTORY_QUERY_PHRASES.iter().any(|p| normalized.contains(p)) {
        return Some(Intent::HistoryQuery);
    }
    None
}

/// "tìm kiếm X", "google X" — the query is everything after the verb.
pub fn match_search(text: &str) -> Option<Intent> {
    trailing_capture(&SEARCH_RE, text, 1).map(|query| Intent::Search { query })
}

/// "mở video X", "nghe nhạc X" — the query is everything after the noun.
pub fn match_media(text: &str) -> Option<Intent> {
    trailing_capture(&MEDIA_RE, text, 1).map(|query| Intent::Media { query })
}

/// "đặt báo thức lúc X" — X is kept raw; parsing happens in the handler.
pub fn match_alarm(text: &str) -> Option<Intent> {
    trailing_capture(&ALARM_RE, text, 1).map(|raw_time_text| Intent::Alarm { raw_time_text })
}

/// Directions keyword or a "từ X đến Y" phrase.
///
/// Endpoints come from "từ X đến Y" when present, otherwise from the
/// configured fallback pair.
pub fn match_directions(text: &str, fallback: &DirectionsConfig) -> Option<Intent> {
    let normalized = normalize(text);
    let from_to = extract_route_endpoints(text);

    let has_keyword = DIRECTIONS_KEYWORDS.iter().any(|k| normalized.contains(k));
    if !has_keyword && from_to.is_none() {
        return None;
    }

    let (start, end) = from_to.unwrap_or_else(|| {
        (
            fallback.default_start.clone(),
            fallback.default_end.clone(),
        )
    });
    Some(Intent::Directions { start, end })
}

/// "mấy giờ", "thời gian".
pub fn match_time_query(normalized: &str) -> Option<Intent> {
    TIME_QUERY_KEYWORDS
        .iter()
        .any(|k| normalized.contains(k))
        .then_some(Intent::TimeQuery)
}

/// Split "từ X đến Y" into trimmed `(X, Y)`; `None` if either side is empty.
pub fn extract_route_endpoints(text: &str) -> Option<(String, String)> {
    let caps = FROM_TO_RE.captures(text)?;
    let start = clean_payload(caps.get(1)?.as_str());
    let end = clean_payload(caps.get(2)?.as_str());
    if start.is_empty() || end.is_empty() {
        return None;
    }
    Some((start, end))
}

fn trailing_capture(re: &Regex, text: &str, group: usize) -> Option<String> {
    let caps = re.captures(text)?;
    let payload = clean_payload(caps.get(group)?.as_str());
    (!payload.is_empty()).then_some(payload)
}

/// Trim whitespace and trailing sentence punctuation.
fn clean_payload(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(['?', '!', '.', ',', ';'])
        .trim_end()
        .to_string()
}
