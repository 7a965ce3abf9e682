use thiserror::Error;

use crate::date::{MAX_YEAR, MIN_YEAR};
use crate::reminder::{ReminderId, MAX_GAP};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("invalid date {year}-{month}-{day} (month is 0-based)")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("year {0} is outside {min}..={max}", min = MIN_YEAR, max = MAX_YEAR)]
    YearOutOfRange(i32),

    #[error("repeat gap must be between 1 and {max}, got {0}", max = MAX_GAP)]
    InvalidGap(i64),

    #[error("occurrence count must be at least 1, got {0}")]
    InvalidCount(i64),

    #[error("weekday repeat needs at least one selected weekday")]
    EmptyWeekdays,

    #[error("repeat end date {end} is before the reminder date {anchor}")]
    EndBeforeAnchor { anchor: String, end: String },

    #[error("repeat settings are missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("unknown reminder `{0}`")]
    UnknownReminder(ReminderId),

    #[error("reminder `{0}` already exists")]
    DuplicateReminder(ReminderId),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
