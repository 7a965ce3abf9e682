use serde::{Deserialize, Serialize};

use crate::future::FutureReminderEntry;
use crate::reminder::Reminder;

/// Persisted calendar state: reminder rules plus the future queue. The grid
/// itself is never stored; it is rebuilt from these on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSnapshot {
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub future_reminders: Vec<FutureReminderEntry>,
    /// Years that were generated when the snapshot was taken, ascending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated_years: Vec<i32>,
}
