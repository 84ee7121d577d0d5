// File: ./src/grid.rs
// Lays a month's day buckets out as weeks x weekdays
use crate::aggregator::DayBuckets;
use crate::model::{DayEventEntry, MonthMeta};

/// Column headers, Monday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Sunday-first names, indexed by `cell % 7`.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    OutOfMonth,
    Day(DayCell),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub weekday_name: &'static str,
    pub events: Vec<DayEventEntry>,
}

impl DayCell {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

impl Cell {
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            Cell::Day(d) => Some(d),
            Cell::OutOfMonth => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub meta: MonthMeta,
    pub weeks: Vec<Vec<Cell>>,
}

impl Grid {
    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.weeks.iter().flatten()
    }

    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.cells().filter_map(Cell::as_day).find(|c| c.day == day)
    }
}

/// Builds the grid. Day numbers come from the 1-based cell index and so does
/// the weekday name (`cell % 7`), not the date itself. With Monday-first
/// columns the two agree.
pub fn render(meta: &MonthMeta, mut buckets: DayBuckets) -> Grid {
    let mut weeks = Vec::with_capacity(meta.weeks_in_month as usize);
    for week in 0..meta.weeks_in_month {
        let mut row = Vec::with_capacity(7);
        for weekday in 1..=7 {
            let cell = week * 7 + weekday;
            row.push(match meta.day_for_cell(cell) {
                Some(day) => Cell::Day(DayCell {
                    day,
                    weekday_name: WEEKDAY_NAMES[(cell % 7) as usize],
                    events: buckets.remove(&day).unwrap_or_default(),
                }),
                None => Cell::OutOfMonth,
            });
        }
        weeks.push(row);
    }
    Grid {
        meta: *meta,
        weeks,
    }
}
