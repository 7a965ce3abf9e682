use calendar_core::grid::Day;
use calendar_core::reminder::ReminderId;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub reminder_id: ReminderId,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Local>,
}

/// Platform-specific notification adapters will implement this trait.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: NotificationRequest);
    fn clear_for_reminder(&self, id: &ReminderId);
}

/// Notifications owed for `day`: one per notify-enabled reminder, at the start
/// of its time range or at `default_hour` when it has none.
pub fn notifications_for_day(day: &Day, default_hour: u32) -> Vec<NotificationRequest> {
    let Some(date) = day.date().to_naive() else {
        return Vec::new();
    };
    day.reminders()
        .iter()
        .map(|occurrence| occurrence.reminder())
        .filter(|reminder| reminder.notify)
        .filter_map(|reminder| {
            let (hours, minutes, body) = match &reminder.range {
                Some(range) => {
                    let body = match range.to {
                        Some(to) => format!("{} - {}", range.from, to),
                        None => format!("At {}", range.from),
                    };
                    (range.from.hours, range.from.minutes, body)
                }
                None => (default_hour, 0, format!("Due on {}", day.date())),
            };
            let naive = date.and_hms_opt(hours, minutes, 0)?;
            // Skips times that do not exist locally (DST gaps).
            let scheduled_for = Local.from_local_datetime(&naive).earliest()?;
            Some(NotificationRequest {
                reminder_id: reminder.id.clone(),
                title: reminder.text.clone(),
                body,
                scheduled_for,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_core::date::CalendarDate;
    use calendar_core::reminder::{ClockTime, Reminder, TimeRange};
    use calendar_core::CalendarEngine;
    use chrono::Timelike;

    #[test]
    fn only_notify_enabled_reminders_produce_requests() {
        let date = CalendarDate::new(2024, 6, 15).unwrap();
        let mut engine = CalendarEngine::new();
        engine
            .add_reminder(
                Reminder::new("a", "Stand-up", date)
                    .with_notify(true)
                    .with_range(TimeRange {
                        from: ClockTime::new(9, 15).unwrap(),
                        to: Some(ClockTime::new(9, 30).unwrap()),
                    }),
            )
            .unwrap();
        engine
            .add_reminder(Reminder::new("b", "Quiet", date))
            .unwrap();
        engine
            .add_reminder(Reminder::new("c", "All day", date).with_notify(true))
            .unwrap();

        let day = engine.day(date).expect("day");
        let requests = notifications_for_day(day, 8);
        assert_eq!(requests.len(), 2);

        let standup = &requests[0];
        assert_eq!(standup.reminder_id.as_str(), "a");
        assert_eq!(standup.body, "09:15 - 09:30");
        assert_eq!(standup.scheduled_for.hour(), 9);
        assert_eq!(standup.scheduled_for.minute(), 15);

        let all_day = &requests[1];
        assert_eq!(all_day.scheduled_for.hour(), 8);
        assert_eq!(all_day.body, "Due on 2024-07-15");
    }
}
