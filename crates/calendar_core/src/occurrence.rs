use std::sync::Arc;

use crate::grid::Day;
use crate::reminder::{Reminder, ReminderId};

/// One placement of a reminder on a day. Every occurrence of a reminder shares
/// the same `Reminder` allocation.
#[derive(Debug, Clone)]
pub struct ReminderOccurrence {
    reminder: Arc<Reminder>,
}

impl ReminderOccurrence {
    pub fn id(&self) -> &ReminderId {
        &self.reminder.id
    }

    pub fn reminder(&self) -> &Reminder {
        &self.reminder
    }
}

impl PartialEq for ReminderOccurrence {
    fn eq(&self, other: &Self) -> bool {
        self.reminder.id == other.reminder.id
    }
}

impl Eq for ReminderOccurrence {}

/// Appends an occurrence of `reminder` to `day`.
///
/// Refuses (and returns `false`) when the day already carries this reminder id,
/// so a faulty walk can never leave duplicates behind.
pub fn place(day: &mut Day, reminder: &Arc<Reminder>) -> bool {
    if day.has_reminder(&reminder.id) {
        tracing::warn!(
            reminder = %reminder.id,
            date = %day.date(),
            "refusing duplicate occurrence"
        );
        return false;
    }
    day.occurrences.push(ReminderOccurrence {
        reminder: Arc::clone(reminder),
    });
    true
}

/// Removes every occurrence of `id` from `day`, returning how many were dropped.
pub fn purge(day: &mut Day, id: &ReminderId) -> usize {
    let before = day.occurrences.len();
    day.occurrences.retain(|occurrence| occurrence.id() != id);
    before - day.occurrences.len()
}
