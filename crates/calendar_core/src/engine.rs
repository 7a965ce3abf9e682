use std::collections::BTreeMap;
use std::sync::Arc;

use crate::date::{is_supported_year, CalendarDate, MONTHS_PER_YEAR};
use crate::error::{CalendarError, Result};
use crate::future::{FutureReminderEntry, FutureReminderQueue};
use crate::grid::{CalendarGrid, Day, DisplayMonth, Year};
use crate::occurrence;
use crate::recurrence::{self, Expansion};
use crate::reminder::{Reminder, ReminderId};
use crate::snapshot::CalendarSnapshot;

/// Owns the generated grid, the future-reminder queue and the reminder rules.
///
/// All mutation goes through `&mut self`, so a grid is only ever touched by a
/// single writer. Years are generated only when asked for, so the grid may
/// have gaps; a walk that reaches a missing year parks in the future queue
/// until that year is generated.
#[derive(Debug, Clone, Default)]
pub struct CalendarEngine {
    grid: CalendarGrid,
    queue: FutureReminderQueue,
    reminders: BTreeMap<ReminderId, Arc<Reminder>>,
}

impl CalendarEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> &CalendarGrid {
        &self.grid
    }

    pub fn future_queue(&self) -> &FutureReminderQueue {
        &self.queue
    }

    pub fn reminder(&self, id: &ReminderId) -> Option<&Reminder> {
        self.reminders.get(id).map(|reminder| reminder.as_ref())
    }

    pub fn reminders(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.values().map(|reminder| reminder.as_ref())
    }

    pub fn day(&self, date: CalendarDate) -> Option<&Day> {
        self.grid.day(date)
    }

    pub fn occurrences_of(&self, id: &ReminderId) -> Vec<CalendarDate> {
        self.grid.occurrences_of(id)
    }

    /// Generates `year` if needed and drains the future queue into it. A no-op
    /// for a year that already exists; other years are left alone.
    pub fn ensure_year(&mut self, year: i32) -> Result<&Year> {
        if !is_supported_year(year) {
            return Err(CalendarError::YearOutOfRange(year));
        }
        if self.grid.insert_year(year) {
            tracing::debug!(year, "generated calendar year");
            self.queue.drain(&mut self.grid, year);
        }
        Ok(self.grid.year_or_build(year))
    }

    /// The 42-cell view of `month` in `year`, generating the neighbouring year
    /// when the overflow reaches into it.
    pub fn visible_month(&mut self, year: i32, month: u32) -> Result<DisplayMonth<'_>> {
        let invalid = CalendarError::InvalidDate { year, month, day: 1 };
        if month >= MONTHS_PER_YEAR {
            return Err(invalid);
        }
        self.ensure_year(year)?;
        if month == 0 {
            let previous = year.checked_sub(1).ok_or_else(|| invalid.clone())?;
            self.ensure_year(previous)?;
        }
        if month + 1 == MONTHS_PER_YEAR {
            let next = year.checked_add(1).ok_or_else(|| invalid.clone())?;
            self.ensure_year(next)?;
        }
        self.grid.display_month(year, month).ok_or(invalid)
    }

    /// The day record for `date`, generating its year if needed.
    pub fn day_for(&mut self, date: CalendarDate) -> Option<&Day> {
        self.ensure_year(date.year).ok()?;
        self.grid.day(date)
    }

    pub fn today(&mut self) -> Option<&Day> {
        self.day_for(CalendarDate::today())
    }

    /// Registers a new reminder and places its occurrences. Whatever the
    /// generated years cannot hold yet is parked in the future queue.
    pub fn add_reminder(&mut self, reminder: Reminder) -> Result<Expansion> {
        reminder.validate()?;
        if self.reminders.contains_key(&reminder.id) {
            return Err(CalendarError::DuplicateReminder(reminder.id));
        }
        self.ensure_year(reminder.date.year)?;

        let reminder = Arc::new(reminder);
        let outcome = recurrence::expand(&mut self.grid, &reminder);
        if let Some(resume) = outcome.resume_point() {
            self.queue.upsert(FutureReminderEntry {
                reminder: Arc::clone(&reminder),
                resume,
            });
        }
        tracing::debug!(
            reminder = %reminder.id,
            placed = outcome.placed(),
            queued = outcome.resume_point().is_some(),
            "reminder expanded"
        );
        self.reminders.insert(reminder.id.clone(), reminder);
        Ok(outcome)
    }

    /// Drops a reminder together with every occurrence of it in every generated
    /// year and its future-queue entry.
    pub fn remove_reminder(&mut self, id: &ReminderId) -> Result<Arc<Reminder>> {
        let removed = self
            .reminders
            .remove(id)
            .ok_or_else(|| CalendarError::UnknownReminder(id.clone()))?;
        let purged: usize = self
            .grid
            .days_mut()
            .map(|day| occurrence::purge(day, id))
            .sum();
        let dequeued = self.queue.remove(id).is_some();
        debug_assert!(self.grid.occurrences_of(id).is_empty());
        tracing::debug!(reminder = %id, purged, dequeued, "reminder removed");
        Ok(removed)
    }

    /// Replaces a reminder's content and rule. The id and creation time are
    /// kept; all previous occurrences are purged before re-expanding.
    pub fn update_reminder(&mut self, id: &ReminderId, mut reminder: Reminder) -> Result<Expansion> {
        let previous = self
            .reminders
            .get(id)
            .ok_or_else(|| CalendarError::UnknownReminder(id.clone()))?;
        reminder.id = id.clone();
        reminder.created_at = previous.created_at;
        reminder.validate()?;

        self.remove_reminder(id)?;
        self.add_reminder(reminder)
    }

    pub fn snapshot(&self) -> CalendarSnapshot {
        CalendarSnapshot {
            reminders: self.reminders().cloned().collect(),
            future_reminders: self.queue.iter().cloned().collect(),
            generated_years: self.grid.year_numbers(),
        }
    }

    /// Rebuilds an engine from persisted rules. The generated years are
    /// recreated and every reminder re-expanded; the stored future queue is
    /// only used to detect drift.
    pub fn restore(snapshot: CalendarSnapshot) -> Result<Self> {
        let mut engine = Self::new();
        let mut years = snapshot.generated_years;
        years.sort_unstable();
        years.dedup();
        for year in years {
            if let Err(err) = engine.ensure_year(year) {
                tracing::warn!(year, error = %err, "skipping stored year");
            }
        }
        for reminder in snapshot.reminders {
            engine.add_reminder(reminder)?;
        }

        let mut stored: Vec<_> = snapshot
            .future_reminders
            .iter()
            .map(|entry| (entry.id().clone(), entry.resume))
            .collect();
        let mut regenerated: Vec<_> = engine
            .queue
            .iter()
            .map(|entry| (entry.id().clone(), entry.resume))
            .collect();
        stored.sort_by(|a, b| a.0.cmp(&b.0));
        regenerated.sort_by(|a, b| a.0.cmp(&b.0));
        if stored != regenerated {
            tracing::warn!(
                stored = stored.len(),
                regenerated = regenerated.len(),
                "stored future reminders differ from the re-expanded rules; using the rules"
            );
        }
        Ok(engine)
    }
}
