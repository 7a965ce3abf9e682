use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::grid::CalendarGrid;
use crate::recurrence::{self, ResumePoint};
use crate::reminder::{Reminder, ReminderId};

/// A recurring reminder parked until the year it resumes in is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureReminderEntry {
    pub reminder: Arc<Reminder>,
    pub resume: ResumePoint,
}

impl FutureReminderEntry {
    pub fn id(&self) -> &ReminderId {
        &self.reminder.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub placed: usize,
    pub completed: usize,
    pub requeued: usize,
}

/// Ordered holding area; holds at most one entry per reminder id.
#[derive(Debug, Clone, Default)]
pub struct FutureReminderQueue {
    entries: Vec<FutureReminderEntry>,
}

impl FutureReminderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FutureReminderEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: &ReminderId) -> Option<&FutureReminderEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn contains(&self, id: &ReminderId) -> bool {
        self.get(id).is_some()
    }

    /// Inserts `entry`, replacing an existing entry for the same reminder in
    /// place so its position in the queue is kept.
    pub fn upsert(&mut self, entry: FutureReminderEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.id() == entry.id())
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, id: &ReminderId) -> Option<FutureReminderEntry> {
        let index = self.entries.iter().position(|entry| entry.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Resumes every entry whose resume year is `<= upto_year` and generated.
    /// Finished entries leave the queue; entries that halt again keep their slot
    /// with an updated resume point.
    pub fn drain(&mut self, grid: &mut CalendarGrid, upto_year: i32) -> DrainReport {
        let mut report = DrainReport::default();
        let mut index = 0;
        while index < self.entries.len() {
            let resume_year = self.entries[index].resume.date.year;
            if resume_year > upto_year || !grid.contains_year(resume_year) {
                index += 1;
                continue;
            }

            let reminder = Arc::clone(&self.entries[index].reminder);
            let outcome = recurrence::resume(grid, &reminder, self.entries[index].resume);
            report.placed += outcome.placed();
            match outcome.resume_point() {
                Some(point) => {
                    self.entries[index].resume = point;
                    report.requeued += 1;
                    index += 1;
                }
                None => {
                    self.entries.remove(index);
                    report.completed += 1;
                }
            }
        }
        if report != DrainReport::default() {
            tracing::debug!(
                upto_year,
                placed = report.placed,
                completed = report.completed,
                requeued = report.requeued,
                "drained future reminders"
            );
        }
        report
    }
}
