// File: ./src/source.rs
// The query contract between the calendar and whatever stores events
use crate::error::Result;
use crate::model::{CalendarRequest, EventRecord};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Months looked back for recurring events that started before the
/// requested month. Rules recurring more sparsely than this across a month
/// boundary are not found.
pub const LOOKBACK_MONTHS: u32 = 2;

/// Start-date range an event must fall in to be considered for a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl FetchWindow {
    /// 1st of `month - 2` (wrapping into the previous year) through the last
    /// instant of `month`.
    pub fn for_month(request: &CalendarRequest) -> Self {
        let first = request.first_day();
        let (mut year, mut month) = (first.year(), first.month() as i32 - LOOKBACK_MONTHS as i32);
        if month <= 0 {
            month += 12;
            year -= 1;
        }
        let from = NaiveDate::from_ymd_opt(year, month as u32, 1)
            .unwrap_or(first)
            .and_time(chrono::NaiveTime::MIN);
        Self {
            from,
            to: request.last_instant(),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.from <= at && at <= self.to
    }
}

/// What an event source is asked for: events starting inside the window,
/// or recurring events whose recurrence ends in the requested month.
/// Results come back sorted by start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub window: FetchWindow,
    pub month_start: NaiveDateTime,
    pub month_end: NaiveDateTime,
}

impl EventFilter {
    pub fn for_month(request: &CalendarRequest) -> Self {
        Self {
            window: FetchWindow::for_month(request),
            month_start: request.first_instant(),
            month_end: request.last_instant(),
        }
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        let starts_in_window = event
            .start_datetime()
            .is_some_and(|s| self.window.contains(s));
        let recurrence_ends_this_month = event
            .recurrence_end_datetime()
            .is_some_and(|e| self.month_start <= e && e <= self.month_end);
        starts_in_window || recurrence_ends_this_month
    }

    /// Keeps matching events, ordered by start. Records without a parsable
    /// start are kept when they match on recurrence end and sort last, so the
    /// aggregator gets to report them.
    pub fn apply(&self, events: impl IntoIterator<Item = EventRecord>) -> Vec<EventRecord> {
        let mut matching: Vec<EventRecord> = events.into_iter().filter(|e| self.matches(e)).collect();
        matching.sort_by_key(|e| (e.start_datetime().is_none(), e.start_datetime()));
        matching
    }
}

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>>;
}

/// Events held in memory, filtered like any other source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub events: Vec<EventRecord>,
}

impl MemorySource {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl EventSource for MemorySource {
    async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>> {
        Ok(filter.apply(self.events.iter().cloned()))
    }
}
