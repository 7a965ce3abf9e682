use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use calendar_core::date::CalendarDate;
use calendar_core::reminder::ReminderId;
use calendar_core::snapshot::CalendarSnapshot;
use calendar_service::config::ServiceConfig;
use calendar_service::notifications::{NotificationRequest, NotificationSink};
use calendar_service::request::ReminderRequest;
use calendar_service::store::{JsonFileStore, MemoryStore, ReminderStore};
use calendar_service::CalendarService;
use parking_lot::Mutex;
use serde_json::json;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq)]
enum SinkEvent {
    Scheduled(NotificationRequest),
    Cleared(ReminderId),
}

#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl NotificationSink for RecordingSink {
    fn schedule(&self, notification: NotificationRequest) {
        self.events.lock().push(SinkEvent::Scheduled(notification));
    }

    fn clear_for_reminder(&self, id: &ReminderId) {
        self.events.lock().push(SinkEvent::Cleared(id.clone()));
    }
}

/// Memory store whose saves can be switched to fail.
#[derive(Clone, Default)]
struct FlakyStore {
    failing: Arc<AtomicBool>,
    inner: Arc<MemoryStore>,
}

impl ReminderStore for FlakyStore {
    fn load(&self) -> anyhow::Result<CalendarSnapshot> {
        self.inner.load()
    }

    fn save(&self, snapshot: &CalendarSnapshot) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.save(snapshot)
    }
}

fn request(value: serde_json::Value) -> ReminderRequest {
    serde_json::from_value(value).expect("request json")
}

fn date(year: i32, month: u32, day: u32) -> CalendarDate {
    CalendarDate::new(year, month, day).expect("valid date")
}

fn memory_service() -> CalendarService {
    CalendarService::builder()
        .with_store(Box::new(MemoryStore::default()))
        .build()
        .expect("build service")
}

#[test]
fn reminders_survive_a_restart() {
    calendar_service::logging::init_tracing();
    let temp = tempdir().expect("tempdir");
    let config = ServiceConfig {
        store_path: temp.path().join("calendar.json"),
        ..ServiceConfig::default()
    };

    let service = CalendarService::builder()
        .with_config(config.clone())
        .build()
        .expect("build service");
    let id = service
        .create_reminder(request(json!({
            "id": "bins",
            "text": "Put the bins out",
            "color": "#00aa55",
            "year": 2024, "month": 10, "day": 4,
            "repeat": { "type": "week", "ends": "occurrences", "count": 10 }
        })))
        .expect("create");
    // The last occurrence falls in 2025, which exists once it is looked at.
    service.month_view(2025, 0).expect("january");
    let before = service.occurrences_of(&id);
    assert_eq!(before.len(), 10);
    assert_eq!(before[0], date(2024, 10, 4));
    assert_eq!(before[9], date(2025, 0, 6));
    drop(service);

    let reloaded = CalendarService::builder()
        .with_config(config)
        .build()
        .expect("rebuild service");
    assert_eq!(reloaded.occurrences_of(&id), before);
    assert_eq!(reloaded.reminder(&id).expect("stored").text, "Put the bins out");

    let stored = JsonFileStore::new(temp.path().join("calendar.json"));
    let raw = std::fs::read_to_string(stored.path()).expect("read store");
    assert!(raw.contains("\"bins\""));
}

#[test]
fn update_and_remove_keep_grid_and_store_in_sync() {
    let service = memory_service();
    let id = service
        .create_reminder(request(json!({
            "text": "Water plants",
            "year": 2025, "month": 2, "day": 3,
            "repeat": { "type": "custom", "gap": { "count": 3, "unit": "days" }, "ends": "never" }
        })))
        .expect("create");
    assert!(service.future_reminders().iter().any(|entry| entry.id() == &id));

    service
        .update_reminder(
            &id,
            request(json!({ "text": "Water plants once", "year": 2025, "month": 2, "day": 5 })),
        )
        .expect("update");
    assert_eq!(service.occurrences_of(&id), vec![date(2025, 2, 5)]);
    assert!(service.future_reminders().is_empty());
    assert_eq!(service.snapshot().reminders.len(), 1);

    service.remove_reminder(&id).expect("remove");
    assert!(service.occurrences_of(&id).is_empty());
    assert!(service.reminders().is_empty());
    assert!(service.remove_reminder(&id).is_err());
}

#[test]
fn invalid_request_is_rejected_before_the_engine() {
    let service = memory_service();
    let err = service
        .create_reminder(request(json!({
            "text": "Broken",
            "year": 2025, "month": 0, "day": 10,
            "repeat": { "type": "custom", "gap": { "count": 0, "unit": "weeks" } }
        })))
        .unwrap_err();
    assert!(err.to_string().contains("gap"));
    assert!(service.reminders().is_empty());
    assert!(service.snapshot().future_reminders.is_empty());
}

#[test]
fn month_view_marks_overflow_cells() {
    let service = memory_service();
    service
        .create_reminder(request(json!({
            "id": "payday",
            "text": "Payday",
            "year": 2025, "month": 0, "day": 31,
            "repeat": { "type": "month", "ends": "never" }
        })))
        .expect("create");

    // February 2025 starts on a Saturday and ends on a Friday.
    let view = service.month_view(2025, 1).expect("february");
    assert_eq!(view.cells.len(), 42);
    assert_eq!(view.cells.iter().filter(|cell| cell.in_month).count(), 28);
    assert!(!view.cells[0].in_month);
    assert_eq!(view.cells[4].date, date(2025, 0, 31));
    assert_eq!(view.cells[4].reminders[0].id.as_str(), "payday");
    let feb_28 = view
        .cells
        .iter()
        .find(|cell| cell.date == date(2025, 1, 28))
        .expect("last day of february");
    assert_eq!(feb_28.reminders.len(), 1);
    assert!(feb_28.reminders[0].repeating);

    assert!(service.month_view(2025, 12).is_err());
}

#[test]
fn notify_reminders_today_reach_the_sink() {
    let sink = RecordingSink::default();
    let service = CalendarService::builder()
        .with_store(Box::new(MemoryStore::default()))
        .with_notification_sink(Box::new(sink.clone()))
        .build()
        .expect("build service");

    let today = CalendarDate::today();
    let id = service
        .create_reminder(request(json!({
            "text": "Standup",
            "year": today.year, "month": today.month, "day": today.day,
            "range": { "from": { "hours": 9, "minutes": 45 } },
            "notify": true
        })))
        .expect("create");

    let badge = service.today().expect("today");
    assert!(badge.is_today);
    assert_eq!(badge.reminders.len(), 1);

    service.remove_reminder(&id).expect("remove");
    let events = sink.events.lock().clone();
    assert!(matches!(
        events.as_slice(),
        [
            SinkEvent::Cleared(first),
            SinkEvent::Scheduled(scheduled),
            SinkEvent::Cleared(last),
        ] if first == &id && scheduled.reminder_id == id && scheduled.body == "At 09:45" && last == &id
    ));
}

#[test]
fn concurrent_writers_are_serialised() {
    let service = Arc::new(memory_service());
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for n in 0..5 {
                    service
                        .create_reminder(request(json!({
                            "id": format!("w{worker}-{n}"),
                            "text": "daily",
                            "year": 2025, "month": 11, "day": 20 + n,
                            "repeat": { "type": "day", "ends": "never" }
                        })))
                        .expect("create");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }

    assert_eq!(service.reminders().len(), 20);
    let queued = service.future_reminders();
    assert_eq!(queued.len(), 20);
    let mut ids: Vec<_> = queued.iter().map(|entry| entry.id().clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    let view = service.month_view(2025, 11).expect("december");
    let last = view
        .cells
        .iter()
        .find(|cell| cell.date == date(2025, 11, 31))
        .expect("dec 31");
    assert_eq!(last.reminders.len(), 20);
}

#[test]
fn failed_save_leaves_memory_matching_the_store() {
    let store = FlakyStore::default();
    let service = CalendarService::builder()
        .with_store(Box::new(store.clone()))
        .build()
        .expect("build service");
    let form = json!({
        "id": "rent",
        "text": "Pay rent",
        "year": 2025, "month": 0, "day": 1,
        "repeat": { "type": "month", "ends": "never" }
    });
    let id = ReminderId::new("rent");

    store.failing.store(true, Ordering::SeqCst);
    let err = service.create_reminder(request(form.clone())).unwrap_err();
    assert!(format!("{err:#}").contains("disk full"));
    assert!(service.reminders().is_empty());
    assert!(service.future_reminders().is_empty());
    assert!(service.occurrences_of(&id).is_empty());

    store.failing.store(false, Ordering::SeqCst);
    service
        .create_reminder(request(form))
        .expect("retry after the store recovers");
    assert_eq!(store.inner.snapshot().reminders.len(), 1);
    let placed = service.occurrences_of(&id);
    assert!(!placed.is_empty());

    store.failing.store(true, Ordering::SeqCst);
    assert!(service
        .update_reminder(
            &id,
            request(json!({ "text": "Pay rent once", "year": 2025, "month": 0, "day": 2 })),
        )
        .is_err());
    assert_eq!(service.reminder(&id).expect("kept").text, "Pay rent");
    assert_eq!(service.occurrences_of(&id), placed);

    assert!(service.remove_reminder(&id).is_err());
    assert!(service.reminder(&id).is_some());
    assert_eq!(service.occurrences_of(&id), placed);
    assert_eq!(store.inner.snapshot().reminders.len(), 1);
}
