//! Alarm payloads and user-facing alarm texts.

use chrono::{DateTime, Duration, FixedOffset};

use super::types::{AlarmNotification, CalendarEvent, NotificationAction};

/// Length of the calendar entry created for an alarm.
const CALENDAR_EVENT_MINUTES: i64 = 5;

const ALARM_TITLE: &str = "Báo thức";

/// `h:mm SA` / `h:mm CH` (12-hour clock, Vietnamese AM/PM).
pub fn readable_time(hour: u32, minute: u32) -> String {
    let period = if hour < 12 { "SA" } else { "CH" };
    let h12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{h12}:{minute:02} {period}")
}

/// Shown when the time phrase cannot be understood.
pub fn unrecognized_time_message(raw: &str) -> String {
    format!(
        "Không hiểu định dạng thời gian \"{raw}\". Thử lại với \"7 giờ sáng\" hoặc \"3:45 chiều\"."
    )
}

/// iOS cannot create clock alarms from outside the Clock app.
pub fn ios_instructions(hour: u32, minute: u32) -> String {
    format!("Vui lòng tạo báo thức cho {hour:02}:{minute:02} trong ứng dụng Đồng hồ.")
}

pub fn android_requested_message(readable: &str) -> String {
    format!(
        "Báo thức cho {readable} đã được yêu cầu. Vui lòng xác nhận nếu ứng dụng đồng hồ mở ra."
    )
}

pub fn reminder_set_message(readable: &str) -> String {
    format!("Đã đặt báo thức cho {readable}.")
}

pub fn alarm_failed_message(reason: &str) -> String {
    format!("Không thể đặt báo thức: {reason}")
}

/// Five-minute calendar entry starting at the alarm, reminding at start.
pub fn calendar_event(at: DateTime<FixedOffset>) -> CalendarEvent {
    CalendarEvent {
        title: ALARM_TITLE.to_string(),
        start: at,
        end: at + Duration::minutes(CALENDAR_EVENT_MINUTES),
        reminder_offset_minutes: 0,
    }
}

/// Local notification with snooze and dismiss actions.
pub fn alarm_notification(at: DateTime<FixedOffset>) -> AlarmNotification {
    AlarmNotification {
        title: ALARM_TITLE.to_string(),
        body: "Đã đến giờ báo thức của bạn!".to_string(),
        category: "alarm".to_string(),
        fire_at: at,
        actions: vec![
            NotificationAction {
                identifier: "snooze".to_string(),
                title: "Báo lại sau 5 phút".to_string(),
                is_destructive: false,
            },
            NotificationAction {
                identifier: "dismiss".to_string(),
                title: "Tắt báo thức".to_string(),
                is_destructive: true,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_readable_time() {
        assert_eq!(readable_time(7, 0), "7:00 SA");
        assert_eq!(readable_time(15, 45), "3:45 CH");
        assert_eq!(readable_time(0, 30), "12:30 SA");
        assert_eq!(readable_time(12, 5), "12:05 CH");
    }

    #[test]
    fn test_ios_instructions_zero_padded() {
        assert_eq!(
            ios_instructions(7, 5),
            "Vui lòng tạo báo thức cho 07:05 trong ứng dụng Đồng hồ."
        );
    }

    #[test]
    fn test_calendar_event_lasts_five_minutes() {
        let at = FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 20, 7, 0, 0)
            .unwrap();
        let event = calendar_event(at);
        assert_eq!(event.end - event.start, Duration::minutes(5));
        assert_eq!(event.title, "Báo thức");
    }

    #[test]
    fn test_notification_actions() {
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 20, 7, 0, 0)
            .unwrap();
        let n = alarm_notification(at);
        let ids: Vec<&str> = n.actions.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(ids, vec!["snooze", "dismiss"]);
        assert!(n.actions[1].is_destructive);
        assert_eq!(n.fire_at, at);
    }
}
