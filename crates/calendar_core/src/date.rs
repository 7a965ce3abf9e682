use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

pub const MONTHS_PER_YEAR: u32 = 12;
pub const DAYS_PER_WEEK: u32 = 7;
/// Years the engine will generate and accept as reminder dates.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
// Sakamoto offsets, indexed by 0-based month.
const WEEKDAY_OFFSETS: [i32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];

pub fn is_supported_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (0 = January) of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    if month == 1 && is_leap_year(year) {
        29
    } else {
        MONTH_LENGTHS[month as usize]
    }
}

/// Weekday of a calendar coordinate, 0 = Monday through 6 = Sunday.
pub fn weekday_of(year: i32, month: u32, day: u32) -> u32 {
    let y = if month < 2 { year - 1 } else { year };
    let raw = y + y.div_euclid(4) - y.div_euclid(100)
        + y.div_euclid(400)
        + WEEKDAY_OFFSETS[month as usize]
        + day as i32;
    // `raw` counts from Sunday; shift so Monday is 0.
    (raw + 6).rem_euclid(DAYS_PER_WEEK as i32) as u32
}

pub fn first_weekday_index(year: i32, month: u32) -> u32 {
    weekday_of(year, month, 1)
}

/// A (year, month, day) triple with a 0-based month and 1-based day.
///
/// Field order matters: the derived `Ord` is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    /// Checked constructor for coordinates coming from outside the engine.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if !is_supported_year(year) {
            return Err(CalendarError::YearOutOfRange(year));
        }
        if month >= MONTHS_PER_YEAR || day == 0 || day > days_in_month(year, month) {
            return Err(CalendarError::InvalidDate { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    pub fn today() -> Self {
        Self::from_naive(Local::now().date_naive())
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
            day: date.day(),
        }
    }

    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, self.day)
    }

    pub fn weekday(self) -> u32 {
        weekday_of(self.year, self.month, self.day)
    }

    pub fn days_in_month(self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn first_of_next_month(self) -> Self {
        if self.month + 1 < MONTHS_PER_YEAR {
            Self {
                year: self.year,
                month: self.month + 1,
                day: 1,
            }
        } else {
            Self {
                year: self.year.saturating_add(1),
                month: 0,
                day: 1,
            }
        }
    }

    pub fn next_day(self) -> Self {
        if self.day < self.days_in_month() {
            Self {
                day: self.day + 1,
                ..self
            }
        } else {
            self.first_of_next_month()
        }
    }

    /// Walks forward `days` days across month and year boundaries.
    pub fn add_days(self, days: u32) -> Self {
        let mut date = self;
        let mut remaining = days;
        loop {
            let left_in_month = date.days_in_month() - date.day;
            if remaining <= left_in_month {
                date.day += remaining;
                return date;
            }
            remaining -= left_in_month + 1;
            date = date.first_of_next_month();
        }
    }

    /// Moves `months` months forward and lands on `anchor_day`, clamped to the
    /// length of the target month (the 31st becomes Feb 28/29, Apr 30, ...).
    pub fn add_months_clamped(self, months: u32, anchor_day: u32) -> Self {
        let per_year = i64::from(MONTHS_PER_YEAR);
        let total = i64::from(self.month) + i64::from(months);
        let year = i32::try_from(i64::from(self.year) + total / per_year).unwrap_or(i32::MAX);
        let month = (total % per_year) as u32;
        let day = anchor_day.clamp(1, days_in_month(year, month));
        Self { year, month, day }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month + 1, self.day)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_naive(date)
    }
}
