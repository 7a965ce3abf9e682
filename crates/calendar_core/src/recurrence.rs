//! Expansion of a reminder's repeat rule into occurrences on generated days.
//!
//! A walk starts at the anchor (or at a stored [`ResumePoint`]) and moves
//! forward one step at a time, placing the reminder on every due day. It ends
//! when the rule terminates, when it walks past the last supported year, or
//! when the next due date falls in a year the grid has not generated yet; in
//! the last case the caller receives the exact point to resume from.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::date::{CalendarDate, DAYS_PER_WEEK, MAX_YEAR};
use crate::grid::CalendarGrid;
use crate::occurrence;
use crate::reminder::{GapUnit, Reminder, RepeatEnd, RepeatPattern, RepeatRule, WeekdaySet};

/// State needed to continue a walk once `date.year` is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePoint {
    /// Next date to consider. For weekday rules it may be a day that turns
    /// out not to be selected.
    pub date: CalendarDate,
    /// Occurrences still owed under `RepeatEnd::Count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    Complete { placed: usize },
    Pending { placed: usize, resume: ResumePoint },
}

impl Expansion {
    pub fn placed(&self) -> usize {
        match self {
            Expansion::Complete { placed } | Expansion::Pending { placed, .. } => *placed,
        }
    }

    pub fn resume_point(&self) -> Option<ResumePoint> {
        match self {
            Expansion::Complete { .. } => None,
            Expansion::Pending { resume, .. } => Some(*resume),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Days(u32),
    Months(u32),
    Weekdays(WeekdaySet),
}

impl Step {
    fn of(pattern: &RepeatPattern) -> Self {
        match *pattern {
            RepeatPattern::Custom {
                gap,
                unit: GapUnit::Days,
            } => Step::Days(gap),
            RepeatPattern::Custom {
                gap,
                unit: GapUnit::Weeks,
            } => Step::Days(gap.saturating_mul(DAYS_PER_WEEK)),
            RepeatPattern::Custom {
                gap,
                unit: GapUnit::Months,
            } => Step::Months(gap),
            RepeatPattern::Day => Step::Days(1),
            RepeatPattern::Week => Step::Days(DAYS_PER_WEEK),
            RepeatPattern::Month => Step::Months(1),
            RepeatPattern::Weekday { weekdays } => Step::Weekdays(weekdays),
        }
    }
}

/// Places `reminder` starting from its anchor date.
pub fn expand(grid: &mut CalendarGrid, reminder: &Arc<Reminder>) -> Expansion {
    match reminder.repeat {
        None => place_single(grid, reminder),
        Some(rule) => {
            let start = ResumePoint {
                date: reminder.date,
                remaining: match rule.ends {
                    RepeatEnd::Count(count) => Some(count),
                    _ => None,
                },
            };
            walk(grid, reminder, rule, start, true)
        }
    }
}

/// Continues a walk previously halted at `point`.
pub fn resume(grid: &mut CalendarGrid, reminder: &Arc<Reminder>, point: ResumePoint) -> Expansion {
    match reminder.repeat {
        None => place_single(grid, reminder),
        Some(rule) => walk(grid, reminder, rule, point, point.date == reminder.date),
    }
}

fn place_single(grid: &mut CalendarGrid, reminder: &Arc<Reminder>) -> Expansion {
    match grid.day_mut(reminder.date) {
        Some(day) => {
            let fresh = occurrence::place(day, reminder);
            debug_assert!(fresh, "reminder {} placed twice", reminder.id);
            Expansion::Complete {
                placed: usize::from(fresh),
            }
        }
        None => Expansion::Pending {
            placed: 0,
            resume: ResumePoint {
                date: reminder.date,
                remaining: None,
            },
        },
    }
}

fn walk(
    grid: &mut CalendarGrid,
    reminder: &Arc<Reminder>,
    rule: RepeatRule,
    from: ResumePoint,
    at_anchor: bool,
) -> Expansion {
    let step = Step::of(&rule.pattern);
    let anchor_day = reminder.date.day;
    let mut date = from.date;
    let mut remaining = from.remaining;
    let mut unconditional = at_anchor;
    let mut placed = 0;

    loop {
        if remaining == Some(0) {
            return Expansion::Complete { placed };
        }
        if let RepeatEnd::EndDate(end) = rule.ends {
            if date > end {
                return Expansion::Complete { placed };
            }
        }
        if date.year > MAX_YEAR {
            return Expansion::Complete { placed };
        }

        let Some(day) = grid.day_mut(date) else {
            tracing::debug!(
                reminder = %reminder.id,
                placed,
                resume = %date,
                "expansion reached the end of the generated years"
            );
            return Expansion::Pending {
                placed,
                resume: ResumePoint { date, remaining },
            };
        };

        if let Step::Weekdays(selected) = step {
            if !unconditional && !selected.contains(date.weekday()) {
                date = date.next_day();
                continue;
            }
        }

        let fresh = occurrence::place(day, reminder);
        debug_assert!(fresh, "reminder {} placed twice on {date}", reminder.id);
        placed += usize::from(fresh);
        remaining = remaining.map(|count| count - 1);
        unconditional = false;

        date = match step {
            Step::Days(days) => date.add_days(days),
            Step::Months(months) => date.add_months_clamped(months, anchor_day),
            Step::Weekdays(_) => date.next_day(),
        };
    }
}
