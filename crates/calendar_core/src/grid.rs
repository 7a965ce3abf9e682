use std::collections::BTreeMap;

use crate::date::{days_in_month, first_weekday_index, CalendarDate, MONTHS_PER_YEAR};
use crate::occurrence::ReminderOccurrence;
use crate::reminder::ReminderId;

/// Cells in a rendered month: six weeks of seven days.
pub const DISPLAY_CELLS: usize = 42;

#[derive(Debug, Clone)]
pub struct Day {
    date: CalendarDate,
    pub(crate) occurrences: Vec<ReminderOccurrence>,
}

impl Day {
    pub(crate) fn new(date: CalendarDate) -> Self {
        Self {
            date,
            occurrences: Vec::new(),
        }
    }

    pub fn date(&self) -> CalendarDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.date.year
    }

    pub fn month(&self) -> u32 {
        self.date.month
    }

    pub fn day(&self) -> u32 {
        self.date.day
    }

    pub fn reminders(&self) -> &[ReminderOccurrence] {
        &self.occurrences
    }

    pub fn has_reminder(&self, id: &ReminderId) -> bool {
        self.occurrences.iter().any(|occurrence| occurrence.id() == id)
    }
}

/// A month's days, sized once at build time.
#[derive(Debug, Clone)]
pub struct Month {
    index: u32,
    first_weekday: u32,
    days: Vec<Day>,
}

impl Month {
    fn build(year: i32, index: u32) -> Self {
        let days = (1..=days_in_month(year, index))
            .map(|day| Day::new(CalendarDate { year, month: index, day }))
            .collect();
        Self {
            index,
            first_weekday: first_weekday_index(year, index),
            days,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Weekday of the 1st, 0 = Monday.
    pub fn first_weekday(&self) -> u32 {
        self.first_weekday
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn day(&self, day: u32) -> Option<&Day> {
        day.checked_sub(1).and_then(|idx| self.days.get(idx as usize))
    }

    fn day_mut(&mut self, day: u32) -> Option<&mut Day> {
        day.checked_sub(1)
            .and_then(move |idx| self.days.get_mut(idx as usize))
    }
}

#[derive(Debug, Clone)]
pub struct Year {
    year: i32,
    months: [Month; 12],
}

impl Year {
    pub(crate) fn build(year: i32) -> Self {
        Self {
            year,
            months: std::array::from_fn(|index| Month::build(year, index as u32)),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn months(&self) -> &[Month; 12] {
        &self.months
    }

    pub fn month(&self, index: u32) -> Option<&Month> {
        self.months.get(index as usize)
    }

    pub fn days(&self) -> impl Iterator<Item = &Day> {
        self.months.iter().flat_map(|month| month.days.iter())
    }

    fn days_mut(&mut self) -> impl Iterator<Item = &mut Day> {
        self.months.iter_mut().flat_map(|month| month.days.iter_mut())
    }
}

/// Sparse year → `Year` arena. Years are only ever added.
#[derive(Debug, Clone, Default)]
pub struct CalendarGrid {
    years: BTreeMap<i32, Year>,
}

impl CalendarGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    pub fn year(&self, year: i32) -> Option<&Year> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = &Year> {
        self.years.values()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Generated year numbers, ascending. Gaps are normal.
    pub fn year_numbers(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    /// Builds `year` with empty days. Returns `false` if it already existed.
    pub(crate) fn insert_year(&mut self, year: i32) -> bool {
        if self.years.contains_key(&year) {
            return false;
        }
        self.years.insert(year, Year::build(year));
        true
    }

    /// Returns `year`, building it first if needed.
    pub(crate) fn year_or_build(&mut self, year: i32) -> &Year {
        self.years.entry(year).or_insert_with(|| Year::build(year))
    }

    pub fn day(&self, date: CalendarDate) -> Option<&Day> {
        self.years
            .get(&date.year)
            .and_then(|year| year.month(date.month))
            .and_then(|month| month.day(date.day))
    }

    pub(crate) fn day_mut(&mut self, date: CalendarDate) -> Option<&mut Day> {
        self.years
            .get_mut(&date.year)
            .and_then(|year| year.months.get_mut(date.month as usize))
            .and_then(|month| month.day_mut(date.day))
    }

    pub(crate) fn days_mut(&mut self) -> impl Iterator<Item = &mut Day> {
        self.years.values_mut().flat_map(Year::days_mut)
    }

    /// Dates carrying an occurrence of `id`, in chronological order.
    pub fn occurrences_of(&self, id: &ReminderId) -> Vec<CalendarDate> {
        self.years
            .values()
            .flat_map(Year::days)
            .filter(|day| day.has_reminder(id))
            .map(Day::date)
            .collect()
    }

    /// Borrows the 42-cell view of a month. `None` unless the month and both
    /// neighbouring months are generated.
    pub fn display_month(&self, year: i32, month: u32) -> Option<DisplayMonth<'_>> {
        if month >= MONTHS_PER_YEAR {
            return None;
        }
        let (prev_year, prev_month) = if month == 0 {
            (year - 1, MONTHS_PER_YEAR - 1)
        } else {
            (year, month - 1)
        };
        let (next_year, next_month) = if month + 1 == MONTHS_PER_YEAR {
            (year + 1, 0)
        } else {
            (year, month + 1)
        };

        let current = self.year(year)?.month(month)?;
        let previous_days = self.year(prev_year)?.month(prev_month)?.days();
        let next_days = self.year(next_year)?.month(next_month)?.days();

        let leading = current.first_weekday() as usize;
        let trailing = DISPLAY_CELLS - leading - current.days().len();

        Some(DisplayMonth {
            year,
            month,
            previous: previous_days[previous_days.len() - leading..].iter().collect(),
            current: current.days(),
            next: next_days[..trailing].iter().collect(),
        })
    }
}

/// A month as rendered: trailing days of the previous month, the month itself,
/// then leading days of the next month. Overflow cells borrow the real `Day`s.
#[derive(Debug, Clone)]
pub struct DisplayMonth<'a> {
    pub year: i32,
    pub month: u32,
    pub previous: Vec<&'a Day>,
    pub current: &'a [Day],
    pub next: Vec<&'a Day>,
}

impl<'a> DisplayMonth<'a> {
    pub fn cells(&self) -> impl Iterator<Item = &'a Day> + '_ {
        self.previous
            .iter()
            .copied()
            .chain(self.current.iter())
            .chain(self.next.iter().copied())
    }

    pub fn weeks(&self) -> Vec<Vec<&'a Day>> {
        let cells: Vec<&'a Day> = self.cells().collect();
        cells.chunks(7).map(|week| week.to_vec()).collect()
    }
}
