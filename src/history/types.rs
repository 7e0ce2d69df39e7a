//! Route search record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One saved directions search.
///
/// Serialized with the field names the mobile client already writes under
/// the `mapHistory` key, so both can share one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSearchRecord {
    pub id: String,
    #[serde(rename = "startLocation")]
    pub start_label: String,
    #[serde(rename = "endLocation")]
    pub end_label: String,
    pub timestamp: DateTime<Utc>,
}

impl RouteSearchRecord {
    pub fn new(start_label: &str, end_label: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start_label: start_label.to_string(),
            end_label: end_label.to_string(),
            timestamp,
        }
    }

    /// The utterance that replays this search through the dispatcher.
    pub fn replay_utterance(&self) -> String {
        format!("đường đi từ {} đến {}", self.start_label, self.end_label)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_serializes_with_client_field_names() {
        let record = RouteSearchRecord {
            id: "abc".into(),
            start_label: "Hồ Gươm".into(),
            end_label: "Ngã Tư Sở".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["startLocation"], "Hồ Gươm");
        assert_eq!(json["endLocation"], "Ngã Tư Sở");
        assert_eq!(json["timestamp"], "2026-10-19T07:00:00Z");
    }

    #[test]
    fn test_reads_client_written_json() {
        let json = r#"{"id":"x1","startLocation":"A","endLocation":"B","timestamp":"2026-10-19T07:00:00.000Z"}"#;
        let record: RouteSearchRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.start_label, "A");
        assert_eq!(record.end_label, "B");
    }

    #[test]
    fn test_replay_utterance() {
        let record = RouteSearchRecord::new("Lăng Bác", "Hồ Tây", Utc::now());
        assert_eq!(record.replay_utterance(), "đường đi từ Lăng Bác đến Hồ Tây");
    }
}
