// File: ./src/model/event.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Suffix appended to a multi-day event's title on its closing day.
pub const END_MARKER: &str = " (End)";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// An event as supplied by the content store. Dates stay raw strings so a
/// malformed record can still be carried around and skipped later.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub title_language: String,
    #[serde(rename = "startDateTime")]
    pub start: String,
    #[serde(rename = "endDateTime", default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_count: Option<u32>,
    #[serde(
        rename = "recurrenceEndDateTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub recurrence_end: Option<String>,
}

impl EventRecord {
    pub fn new(id: &str, title: &str, start: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            start: start.to_string(),
            ..Self::default()
        }
    }

    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        parse_event_datetime(&self.start)
    }

    pub fn end_datetime(&self) -> Option<NaiveDateTime> {
        self.end.as_deref().and_then(parse_event_datetime)
    }

    pub fn recurrence_end_datetime(&self) -> Option<NaiveDateTime> {
        self.recurrence_end.as_deref().and_then(parse_event_datetime)
    }

    /// Recurring when an occurrence count is present and non-zero.
    pub fn is_recurring(&self) -> bool {
        self.occurrence_count.is_some_and(|n| n > 0)
    }

    pub fn entry(&self) -> DayEventEntry {
        DayEventEntry {
            url: self.url.clone(),
            title: self.title.clone(),
            title_language: self.title_language.clone(),
        }
    }

    pub fn end_entry(&self) -> DayEventEntry {
        DayEventEntry {
            title: format!("{}{}", self.title, END_MARKER),
            ..self.entry()
        }
    }
}

/// What a day cell shows for one occurrence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DayEventEntry {
    pub url: String,
    pub title: String,
    pub title_language: String,
}

/// Parses the wall-clock date-times the content store writes. A bare date
/// means midnight.
pub fn parse_event_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
