//! TimeExpressionParser — loose Vietnamese time phrases to hour/minute.
//!
//! Understands "7 giờ", "7h", "30 phút", "3:45", "3 45" and a bare "5 tối",
//! with an optional afternoon/evening marker ("chiều", "tối", "pm"). The parser is
//! date-agnostic; [`next_occurrence`] turns its result into an instant.

use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveTime, TimeZone};
use regex::Regex;

use super::types::ParsedTime;

/// `H:M` or `H M`. Takes precedence over everything else.
static COMBINED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,2})[:\s]([0-9]{1,2})").expect("valid regex"));

/// A number followed by an hour unit.
static HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]{1,2})\s*(?:giờ|gio|h|:)").expect("valid regex"));

/// A number followed by a minute unit. A bare `p` must end the word so the
/// "p" of "pm" is not read as minutes.
static MINUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]{1,2})\s*(?:phút|phut|p\b)").expect("valid regex"));

/// A standalone 1-2 digit number, the hour of last resort ("5 tối").
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])([0-9]{1,2})(?:[^0-9]|$)").expect("valid regex"));

/// Parses time phrases with a configurable set of PM markers.
#[derive(Debug, Clone)]
pub struct TimeExpressionParser {
    /// Lowercased afternoon/evening tokens.
    pm_markers: Vec<String>,
}

impl Default for TimeExpressionParser {
    fn default() -> Self {
        Self::new(&crate::config::TimeConfig::default().pm_markers)
    }
}

impl TimeExpressionParser {
    pub fn new(pm_markers: &[String]) -> Self {
        Self {
            pm_markers: pm_markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    /// Parse a time phrase into an hour/minute pair.
    ///
    /// A combined `H:M` match wins outright. Otherwise hour and minute are
    /// matched independently. Without an hour unit, the first standalone
    /// number that is not the minute becomes the hour; a missing field
    /// defaults to 0. With a PM
    /// marker, hours below 12 gain 12 ("12 giờ chiều" stays 12). Anything
    /// out of range afterwards is `Unrecognized`.
    pub fn parse(&self, text: &str) -> ParsedTime {
        let lowered = text.to_lowercase();
        let is_pm = self.pm_markers.iter().any(|m| lowered.contains(m.as_str()));

        let (hour, minute) = if let Some(caps) = COMBINED_RE.captures(text) {
            (parse_number(caps.get(1)), parse_number(caps.get(2)))
        } else {
            let minute_match = MINUTE_RE.captures(text).and_then(|c| c.get(1));
            let hour = match HOUR_RE.captures(text) {
                Some(caps) => parse_number(caps.get(1)),
                None => bare_hour(text, minute_match.map(|m| m.start())),
            };
            (hour, minute_match.map_or(Some(0), |m| parse_number(Some(m))))
        };

        let (Some(mut hour), Some(minute)) = (hour, minute) else {
            return ParsedTime::Unrecognized;
        };

        if is_pm && hour < 12 {
            hour += 12;
        }

        if hour > 23 || minute > 59 {
            return ParsedTime::Unrecognized;
        }

        ParsedTime::At { hour, minute }
    }
}

fn parse_number(m: Option<regex::Match<'_>>) -> Option<u32> {
    m.and_then(|m| m.as_str().parse().ok())
}

/// First standalone number not starting at `minute_start`, or 0.
fn bare_hour(text: &str, minute_start: Option<usize>) -> Option<u32> {
    NUMBER_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find(|m| Some(m.start()) != minute_start)
        .map_or(Some(0), |m| parse_number(Some(m)))
}

/// The next instant at `hour:minute` (seconds zeroed), relative to `now`.
///
/// Today if that moment has not passed yet, otherwise tomorrow. Returns
/// `None` only for out-of-range input or a local time that does not exist
/// on either day.
pub fn next_occurrence<Tz: TimeZone>(
    now: &DateTime<Tz>,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Tz>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let tz = now.timezone();
    let today = now.date_naive();

    let candidate = tz.from_local_datetime(&today.and_time(time)).earliest()?;
    if candidate >= *now {
        return Some(candidate);
    }

    let tomorrow = today.checked_add_days(Days::new(1))?;
    tz.from_local_datetime(&tomorrow.and_time(time)).earliest()
}

#[cfg(test)]
mod tests {
    use chrono::{Timelike, Utc};

    use super::*;

    fn parse(text: &str) -> ParsedTime {
        TimeExpressionParser::default().parse(text)
    }

    fn at(hour: u32, minute: u32) -> ParsedTime {
        ParsedTime::At { hour, minute }
    }

    #[test]
    fn test_hour_with_morning_marker() {
        assert_eq!(parse("7 giờ sáng"), at(7, 0));
    }

    #[test]
    fn test_combined_with_pm_marker() {
        assert_eq!(parse("3:45 chiều"), at(15, 45));
    }

    #[test]
    fn test_combined_space_separated() {
        assert_eq!(parse("6 30"), at(6, 30));
    }

    #[test]
    fn test_every_well_formed_h_m() {
        let parser = TimeExpressionParser::default();
        for hour in 0..24 {
            for minute in 0..60 {
                let text = format!("{hour}:{minute:02}");
                assert_eq!(parser.parse(&text), at(hour, minute), "input {text}");
            }
        }
    }

    #[test]
    fn test_pm_adds_twelve_below_noon() {
        let parser = TimeExpressionParser::default();
        for hour in 1..12 {
            for marker in ["chiều", "tối", "pm", "PM"] {
                let text = format!("{hour} giờ {marker}");
                assert_eq!(parser.parse(&text), at(hour + 12, 0), "input {text}");
            }
        }
    }

    #[test]
    fn test_bare_hour_with_pm_marker() {
        let parser = TimeExpressionParser::default();
        for hour in 1..=11 {
            for marker in ["chiều", "tối", "pm", "PM"] {
                let text = format!("{hour} {marker}");
                assert_eq!(parser.parse(&text), at(hour + 12, 0), "input {text}");
            }
        }
        assert_eq!(parse("lúc 5pm"), at(17, 0));
    }

    #[test]
    fn test_bare_hour_without_marker() {
        assert_eq!(parse("lúc 6 sáng"), at(6, 0));
        assert_eq!(parse("7"), at(7, 0));
    }

    #[test]
    fn test_bare_hour_skips_minute_number() {
        assert_eq!(parse("15 phút 8 tối"), at(20, 15));
    }

    #[test]
    fn test_twelve_pm_stays_twelve() {
        assert_eq!(parse("12 giờ chiều"), at(12, 0));
        assert_eq!(parse("12 chiều"), at(12, 0));
        assert_eq!(parse("12 tối"), at(12, 0));
    }

    #[test]
    fn test_minute_only_defaults_hour_to_zero() {
        assert_eq!(parse("30 phút"), at(0, 30));
    }

    #[test]
    fn test_separate_hour_and_minute() {
        assert_eq!(parse("7 giờ 15 phút tối"), at(19, 15));
        assert_eq!(parse("8h"), at(8, 0));
        assert_eq!(parse("9 gio 5 phut"), at(9, 5));
    }

    #[test]
    fn test_combined_takes_precedence() {
        // "10 giờ" alone would give 10:00; the combined "7:20" wins.
        assert_eq!(parse("10 giờ hoặc 7:20"), at(7, 20));
    }

    #[test]
    fn test_out_of_range_is_unrecognized() {
        assert_eq!(parse("25:00"), ParsedTime::Unrecognized);
        assert_eq!(parse("7:60"), ParsedTime::Unrecognized);
        assert_eq!(parse("24 giờ"), ParsedTime::Unrecognized);
        assert_eq!(parse("99 phút"), ParsedTime::Unrecognized);
        // 13 with a PM marker is still 13, not 25.
        assert_eq!(parse("13 giờ chiều"), at(13, 0));
        assert_eq!(parse("20 giờ 75 phút"), ParsedTime::Unrecognized);
    }

    #[test]
    fn test_short_minute_unit() {
        assert_eq!(parse("6h 45p"), at(6, 45));
        // "pm" is a marker, not minutes.
        assert_eq!(parse("9 giờ 5 pm"), at(21, 0));
        assert_eq!(parse("3 pm"), at(15, 0));
    }

    #[test]
    fn test_no_numbers_is_midnight() {
        // Both patterns absent: both fields default to 0.
        assert_eq!(parse("sáng mai"), at(0, 0));
    }

    #[test]
    fn test_custom_pm_markers() {
        let parser = TimeExpressionParser::new(&["evening".to_string()]);
        assert_eq!(parser.parse("7 h Evening"), at(19, 0));
        assert_eq!(parser.parse("7 giờ chiều"), at(7, 0));
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 6, 30, 0).unwrap();
        let next = next_occurrence(&now, 7, 0).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_rolls_over() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let next = next_occurrence(&now, 7, 0).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 20, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_same_minute_later_second_rolls_over() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 7, 0, 30).unwrap();
        let next = next_occurrence(&now, 7, 0).unwrap();
        assert_eq!(next.date_naive().to_string(), "2026-10-20");
        assert_eq!(next.second(), 0);
    }

    #[test]
    fn test_next_occurrence_exactly_now_is_today() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap();
        assert_eq!(next_occurrence(&now, 7, 0).unwrap(), now);
    }

    #[test]
    fn test_next_occurrence_month_end() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 0, 0).unwrap();
        let next = next_occurrence(&now, 6, 0).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2027, 1, 1, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_rejects_invalid() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap();
        assert!(next_occurrence(&now, 24, 0).is_none());
    }
}
