use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date::{CalendarDate, DAYS_PER_WEEK};
use crate::error::{CalendarError, Result};

/// Stable reminder identifier; survives edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReminderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ReminderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClockTime {
    pub hours: u32,
    pub minutes: u32,
}

impl ClockTime {
    pub fn new(hours: u32, minutes: u32) -> Result<Self> {
        if hours >= 24 || minutes >= 60 {
            return Err(CalendarError::InvalidTimeRange(format!(
                "{hours:02}:{minutes:02} is not a valid time of day"
            )));
        }
        Ok(Self { hours, minutes })
    }

    fn validate(self) -> Result<()> {
        Self::new(self.hours, self.minutes).map(|_| ())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: ClockTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ClockTime>,
}

impl TimeRange {
    pub fn validate(&self) -> Result<()> {
        self.from.validate()?;
        if let Some(to) = self.to {
            to.validate()?;
            if to <= self.from {
                return Err(CalendarError::InvalidTimeRange(format!(
                    "end {to} is not after start {}",
                    self.from
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapUnit {
    Days,
    Weeks,
    Months,
}

/// Selected weekdays, indexed 0 = Monday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdaySet([bool; 7]);

impl WeekdaySet {
    pub fn from_flags(flags: [bool; 7]) -> Self {
        Self(flags)
    }

    pub fn of(weekdays: &[u32]) -> Self {
        let mut flags = [false; 7];
        for &weekday in weekdays {
            if let Some(flag) = flags.get_mut(weekday as usize) {
                *flag = true;
            }
        }
        Self(flags)
    }

    pub fn contains(&self, weekday: u32) -> bool {
        self.0
            .get((weekday % DAYS_PER_WEEK) as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|selected| *selected)
    }

    pub fn flags(&self) -> [bool; 7] {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepeatPattern {
    Custom { gap: u32, unit: GapUnit },
    Day,
    Week,
    Month,
    Weekday { weekdays: WeekdaySet },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatEnd {
    Never,
    Count(u32),
    EndDate(CalendarDate),
}

/// Largest custom gap accepted, in any unit.
pub const MAX_GAP: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRule {
    pub pattern: RepeatPattern,
    pub ends: RepeatEnd,
}

impl RepeatRule {
    pub fn new(pattern: RepeatPattern, ends: RepeatEnd) -> Self {
        Self { pattern, ends }
    }

    pub fn validate(&self, anchor: CalendarDate) -> Result<()> {
        match self.pattern {
            RepeatPattern::Custom { gap, .. } if gap == 0 || gap > MAX_GAP => {
                return Err(CalendarError::InvalidGap(gap.into()))
            }
            RepeatPattern::Weekday { weekdays } if weekdays.is_empty() => {
                return Err(CalendarError::EmptyWeekdays)
            }
            _ => {}
        }
        match self.ends {
            RepeatEnd::Count(0) => Err(CalendarError::InvalidCount(0)),
            RepeatEnd::EndDate(end) if end < anchor => Err(CalendarError::EndBeforeAnchor {
                anchor: anchor.to_string(),
                end: end.to_string(),
            }),
            RepeatEnd::EndDate(end) => {
                CalendarDate::new(end.year, end.month, end.day)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// A user reminder in its persisted, rule form. Occurrences are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub color: String,
    #[serde(flatten)]
    pub date: CalendarDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatRule>,
    #[serde(default)]
    pub notify: bool,
}

impl Reminder {
    pub fn new(id: impl Into<ReminderId>, text: impl Into<String>, date: CalendarDate) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at: Utc::now(),
            color: String::new(),
            date,
            range: None,
            repeat: None,
            notify: false,
        }
    }

    pub fn with_repeat(mut self, rule: RepeatRule) -> Self {
        self.repeat = Some(rule);
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat.is_some()
    }

    /// Checks everything the expansion engine takes as a precondition.
    pub fn validate(&self) -> Result<()> {
        let anchor = CalendarDate::new(self.date.year, self.date.month, self.date.day)?;
        if let Some(range) = &self.range {
            range.validate()?;
        }
        if let Some(rule) = &self.repeat {
            rule.validate(anchor)?;
        }
        Ok(())
    }
}
