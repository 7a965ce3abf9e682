//! The reminder form payload and its conversion into a validated [`Reminder`].

use calendar_core::date::CalendarDate;
use calendar_core::reminder::{
    GapUnit, Reminder, ReminderId, RepeatEnd, RepeatPattern, RepeatRule, TimeRange, WeekdaySet,
    MAX_GAP,
};
use calendar_core::{CalendarError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub color: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub range: Option<TimeRange>,
    #[serde(default)]
    pub repeat: Option<RepeatRequest>,
    #[serde(default)]
    pub notify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatKind {
    Custom,
    Day,
    Week,
    Month,
    Weekday,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndsKind {
    #[default]
    Never,
    Occurrences,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapRequest {
    pub count: i64,
    pub unit: GapUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRequest {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatRequest {
    #[serde(rename = "type")]
    pub kind: RepeatKind,
    #[serde(default)]
    pub gap: Option<GapRequest>,
    #[serde(default)]
    pub weekdays: Option<Vec<bool>>,
    #[serde(default)]
    pub ends: EndsKind,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub end_date: Option<DateRequest>,
}

impl ReminderRequest {
    /// Validates the form and builds the reminder. A missing or blank id gets
    /// a fresh one.
    pub fn into_reminder(self, created_at: DateTime<Utc>) -> Result<Reminder> {
        let date = CalendarDate::new(self.year, self.month, self.day)?;
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .map(ReminderId::from)
            .unwrap_or_else(|| ReminderId::new(Uuid::new_v4().to_string()));

        let mut reminder = Reminder::new(id, self.text, date)
            .with_color(self.color)
            .with_notify(self.notify);
        reminder.created_at = created_at;
        reminder.range = self.range;
        reminder.repeat = self.repeat.map(|repeat| repeat.into_rule()).transpose()?;
        reminder.validate()?;
        Ok(reminder)
    }
}

impl RepeatRequest {
    fn into_rule(self) -> Result<RepeatRule> {
        let pattern = match self.kind {
            RepeatKind::Day => RepeatPattern::Day,
            RepeatKind::Week => RepeatPattern::Week,
            RepeatKind::Month => RepeatPattern::Month,
            RepeatKind::Custom => {
                let gap = self.gap.ok_or(CalendarError::MissingField("gap"))?;
                let count = u32::try_from(gap.count)
                    .ok()
                    .filter(|count| (1..=MAX_GAP).contains(count))
                    .ok_or(CalendarError::InvalidGap(gap.count))?;
                RepeatPattern::Custom {
                    gap: count,
                    unit: gap.unit,
                }
            }
            RepeatKind::Weekday => {
                let selected = self.weekdays.unwrap_or_default();
                let mut flags = [false; 7];
                for (flag, value) in flags.iter_mut().zip(selected) {
                    *flag = value;
                }
                let weekdays = WeekdaySet::from_flags(flags);
                if weekdays.is_empty() {
                    return Err(CalendarError::EmptyWeekdays);
                }
                RepeatPattern::Weekday { weekdays }
            }
        };

        let ends = match self.ends {
            EndsKind::Never => RepeatEnd::Never,
            EndsKind::Occurrences => {
                let count = self.count.ok_or(CalendarError::MissingField("count"))?;
                let count = u32::try_from(count)
                    .ok()
                    .filter(|count| *count >= 1)
                    .ok_or(CalendarError::InvalidCount(count))?;
                RepeatEnd::Count(count)
            }
            EndsKind::Date => {
                let end = self.end_date.ok_or(CalendarError::MissingField("endDate"))?;
                RepeatEnd::EndDate(CalendarDate::new(end.year, end.month, end.day)?)
            }
        };

        Ok(RepeatRule::new(pattern, ends))
    }
}
