// File: ./src/model/month.rs
// Month arithmetic shared by the aggregator and the grid
use crate::error::{CalendarError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A validated month/year pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRequest {
    month: u32,
    year: i32,
    first_day: NaiveDate,
}

impl CalendarRequest {
    /// Years are limited to four digits.
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth(month.to_string()));
        }
        if !(0..=9999).contains(&year) {
            return Err(CalendarError::InvalidYear(year.to_string()));
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| CalendarError::InvalidYear(year.to_string()))?;
        Ok(Self {
            month,
            year,
            first_day,
        })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Duration::days(i64::from(days_in_month(self.month, self.year)) - 1)
    }

    pub fn first_instant(&self) -> NaiveDateTime {
        self.first_day.and_time(chrono::NaiveTime::MIN)
    }

    /// 23:59:59 on the last day of the month.
    pub fn last_instant(&self) -> NaiveDateTime {
        self.first_instant() + Duration::days(i64::from(days_in_month(self.month, self.year)))
            - Duration::seconds(1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    pub fn meta(&self) -> MonthMeta {
        MonthMeta::new(self)
    }

    /// The following month; stays put at December 9999.
    pub fn next(&self) -> Self {
        let (month, year) = match self.month {
            12 => (1, self.year + 1),
            m => (m + 1, self.year),
        };
        Self::new(month, year).unwrap_or(*self)
    }

    /// The preceding month; stays put at January 0000.
    pub fn previous(&self) -> Self {
        let (month, year) = match self.month {
            1 => (12, self.year - 1),
            m => (m - 1, self.year),
        };
        Self::new(month, year).unwrap_or(*self)
    }
}

/// Layout data for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthMeta {
    pub month: u32,
    pub year: i32,
    pub days_in_month: u32,
    /// ISO weekday of the 1st (1 = Monday .. 7 = Sunday).
    pub first_weekday: u32,
    pub weeks_in_month: u32,
}

impl MonthMeta {
    pub fn new(request: &CalendarRequest) -> Self {
        let days = days_in_month(request.month, request.year);
        let first_weekday = request.first_day.weekday().number_from_monday();
        let last_weekday = request.last_day().weekday().number_from_monday();
        Self {
            month: request.month,
            year: request.year,
            days_in_month: days,
            first_weekday,
            weeks_in_month: weeks_in_month(days, first_weekday, last_weekday),
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    pub fn cell_count(&self) -> u32 {
        self.weeks_in_month * 7
    }

    /// Day number shown in 1-based cell `cell`, if the cell is inside the month.
    pub fn day_for_cell(&self, cell: u32) -> Option<u32> {
        if cell < self.first_weekday || cell > self.first_weekday + self.days_in_month - 1 {
            return None;
        }
        Some(cell - self.first_weekday + 1)
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub fn days_in_month(month: u32, year: i32) -> u32 {
    if month == 2 {
        return if is_leap_year(year) { 29 } else { 28 };
    }
    // 31,30 alternation that restarts in August.
    if (month - 1) % 7 % 2 == 1 { 30 } else { 31 }
}

/// Week rows needed for a month. Adds a row whenever the last day's weekday
/// falls before the first day's, which is how the layout has always been
/// computed.
pub fn weeks_in_month(days_in_month: u32, first_weekday: u32, last_weekday: u32) -> u32 {
    let mut weeks = days_in_month.div_ceil(7);
    if last_weekday < first_weekday {
        weeks += 1;
    }
    weeks
}
