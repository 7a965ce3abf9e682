use anyhow::{Context, Result};
use calendar_core::date::CalendarDate;
use calendar_core::future::FutureReminderEntry;
use calendar_core::grid::{Day, DISPLAY_CELLS};
use calendar_core::reminder::{Reminder, ReminderId, TimeRange};
use calendar_core::snapshot::CalendarSnapshot;
use calendar_core::CalendarEngine;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    config::ServiceConfig,
    notifications::{self, NotificationSink},
    request::ReminderRequest,
    store::{JsonFileStore, ReminderStore},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSummary {
    pub id: ReminderId,
    pub text: String,
    pub color: String,
    pub range: Option<TimeRange>,
    pub repeating: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayView {
    pub date: CalendarDate,
    pub in_month: bool,
    pub is_today: bool,
    pub reminders: Vec<ReminderSummary>,
}

impl DayView {
    fn from_day(day: &Day, in_month: bool, today: CalendarDate) -> Self {
        Self {
            date: day.date(),
            in_month,
            is_today: day.date() == today,
            reminders: day
                .reminders()
                .iter()
                .map(|occurrence| {
                    let reminder = occurrence.reminder();
                    ReminderSummary {
                        id: reminder.id.clone(),
                        text: reminder.text.clone(),
                        color: reminder.color.clone(),
                        range: reminder.range,
                        repeating: reminder.is_repeating(),
                    }
                })
                .collect(),
        }
    }
}

/// Owned 42-cell month for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayView>,
}

pub struct CalendarService {
    engine: RwLock<CalendarEngine>,
    store: Box<dyn ReminderStore>,
    notification_sink: Option<Box<dyn NotificationSink>>,
    config: ServiceConfig,
}

pub struct CalendarServiceBuilder {
    config: ServiceConfig,
    store: Option<Box<dyn ReminderStore>>,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

impl Default for CalendarServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            store: None,
            notification_sink: None,
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: Box<dyn ReminderStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    /// Loads the stored rules, rebuilds the grid around today and schedules
    /// today's notifications.
    pub fn build(self) -> Result<CalendarService> {
        let store = self
            .store
            .unwrap_or_else(|| -> Box<dyn ReminderStore> {
                Box::new(JsonFileStore::new(&self.config.store_path))
            });
        let snapshot = store.load().context("loading reminders")?;
        let reminder_count = snapshot.reminders.len();
        let mut engine = CalendarEngine::restore(snapshot).context("restoring reminders")?;

        let this_year = CalendarDate::today().year;
        let preload = self.config.preload_years as i32;
        for year in this_year - preload..=this_year + preload {
            engine
                .ensure_year(year)
                .with_context(|| format!("generating year {year}"))?;
        }
        tracing::info!(
            reminders = reminder_count,
            queued = engine.future_queue().len(),
            "calendar service ready"
        );

        let service = CalendarService {
            engine: RwLock::new(engine),
            store,
            notification_sink: self.notification_sink,
            config: self.config,
        };
        {
            let mut engine = service.engine.write();
            service.schedule_today(&mut engine, None);
        }
        Ok(service)
    }
}

impl CalendarService {
    pub fn builder() -> CalendarServiceBuilder {
        CalendarServiceBuilder::new()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn month_view(&self, year: i32, month: u32) -> Result<MonthView> {
        let today = CalendarDate::today();
        let mut engine = self.engine.write();
        let display = engine.visible_month(year, month)?;
        let mut cells = Vec::with_capacity(DISPLAY_CELLS);
        cells.extend(display.previous.iter().map(|day| DayView::from_day(day, false, today)));
        cells.extend(display.current.iter().map(|day| DayView::from_day(day, true, today)));
        cells.extend(display.next.iter().map(|day| DayView::from_day(day, false, today)));
        Ok(MonthView { year, month, cells })
    }

    pub fn day_view(&self, date: CalendarDate) -> Result<DayView> {
        let today = CalendarDate::today();
        let mut engine = self.engine.write();
        let day = engine
            .day_for(date)
            .with_context(|| format!("no calendar day for {date}"))?;
        Ok(DayView::from_day(day, true, today))
    }

    /// Today's reminders, used for badges.
    pub fn today(&self) -> Result<DayView> {
        self.day_view(CalendarDate::today())
    }

    pub fn reminders(&self) -> Vec<Reminder> {
        self.engine.read().reminders().cloned().collect()
    }

    pub fn reminder(&self, id: &ReminderId) -> Option<Reminder> {
        self.engine.read().reminder(id).cloned()
    }

    pub fn future_reminders(&self) -> Vec<FutureReminderEntry> {
        self.engine.read().future_queue().iter().cloned().collect()
    }

    pub fn occurrences_of(&self, id: &ReminderId) -> Vec<CalendarDate> {
        self.engine.read().occurrences_of(id)
    }

    pub fn snapshot(&self) -> CalendarSnapshot {
        self.engine.read().snapshot()
    }

    #[instrument(skip(self, request))]
    pub fn create_reminder(&self, request: ReminderRequest) -> Result<ReminderId> {
        let reminder = request.into_reminder(Utc::now())?;
        let id = reminder.id.clone();
        let mut engine = self.engine.write();
        self.commit(&mut engine, |engine| engine.add_reminder(reminder))?;
        self.schedule_today(&mut engine, Some(&id));
        tracing::info!(reminder = %id, "reminder created");
        Ok(id)
    }

    #[instrument(skip(self, request))]
    pub fn update_reminder(&self, id: &ReminderId, request: ReminderRequest) -> Result<()> {
        let reminder = request.into_reminder(Utc::now())?;
        let mut engine = self.engine.write();
        self.commit(&mut engine, |engine| engine.update_reminder(id, reminder))?;
        self.schedule_today(&mut engine, Some(id));
        tracing::info!(reminder = %id, "reminder updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn remove_reminder(&self, id: &ReminderId) -> Result<()> {
        let mut engine = self.engine.write();
        self.commit(&mut engine, |engine| engine.remove_reminder(id))?;
        if let Some(sink) = &self.notification_sink {
            sink.clear_for_reminder(id);
        }
        tracing::info!(reminder = %id, "reminder removed");
        Ok(())
    }
}

impl CalendarService {
    /// Applies `change` and saves the result. When either step fails the
    /// engine is put back as it was, so memory never runs ahead of the store.
    fn commit<T>(
        &self,
        engine: &mut CalendarEngine,
        change: impl FnOnce(&mut CalendarEngine) -> calendar_core::Result<T>,
    ) -> Result<T> {
        let before = engine.clone();
        let outcome = match change(engine) {
            Ok(value) => self.persist(engine).map(|()| value),
            Err(err) => Err(err.into()),
        };
        if outcome.is_err() {
            *engine = before;
            tracing::warn!("reminder change rolled back");
        }
        outcome
    }

    fn persist(&self, engine: &CalendarEngine) -> Result<()> {
        self.store
            .save(&engine.snapshot())
            .context("saving reminders")
    }

    /// Clears and re-schedules today's notifications, for one reminder or for
    /// all of them.
    fn schedule_today(&self, engine: &mut CalendarEngine, only: Option<&ReminderId>) {
        let Some(sink) = &self.notification_sink else {
            return;
        };
        if let Some(id) = only {
            sink.clear_for_reminder(id);
        }
        let Some(day) = engine.today() else {
            return;
        };
        for request in notifications::notifications_for_day(day, self.config.notify_hour) {
            if only.map_or(true, |id| *id == request.reminder_id) {
                sink.schedule(request);
            }
        }
    }
}
