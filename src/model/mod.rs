// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod adapter;
pub mod event;
pub mod month;
pub mod parser;

pub use event::{DayEventEntry, END_MARKER, EventRecord};
pub use month::{CalendarRequest, MonthMeta, days_in_month, is_leap_year};
