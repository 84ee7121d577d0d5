// File: ./src/model/adapter.rs
// Maps iCalendar VEVENTs onto event records
use crate::model::event::{EventRecord, parse_event_datetime};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use icalendar::{Calendar, CalendarComponent, Component, Event};

const RECORD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The subset of an RRULE the calendar can express: a fixed day interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecurrence {
    pub interval_days: u32,
    pub count: Option<u32>,
    pub until: Option<NaiveDateTime>,
}

impl EventRecord {
    /// Reads every VEVENT of an iCalendar resource. UTC times are shifted into
    /// the calendar's fixed zone; floating and TZID times are taken as-is.
    pub fn from_ics(raw_ics: &str, zone: FixedOffset) -> Result<Vec<Self>, String> {
        let calendar: Calendar = raw_ics.parse().map_err(|e| format!("Parse: {}", e))?;
        let events: Vec<&Event> = calendar
            .components
            .iter()
            .filter_map(|c| match c {
                CalendarComponent::Event(e) => Some(e),
                _ => None,
            })
            .collect();
        if events.is_empty() {
            return Err("No VEVENT".to_string());
        }

        let mut records = Vec::with_capacity(events.len());
        for event in events {
            records.push(Self::from_vevent(event, zone)?);
        }
        Ok(records)
    }

    fn from_vevent(event: &Event, zone: FixedOffset) -> Result<Self, String> {
        let uid = event.get_uid().unwrap_or_default().to_string();
        let title = event.get_summary().unwrap_or("No Title").to_string();
        let url = event
            .properties()
            .get("URL")
            .map(|p| p.value().to_string())
            .unwrap_or_default();

        let title_language = event
            .properties()
            .get("SUMMARY")
            .and_then(|p| p.params().get("LANGUAGE").map(|l| l.value().to_string()))
            .or_else(|| {
                event
                    .properties()
                    .get("X-TITLE-LANGUAGE")
                    .map(|p| p.value().to_string())
            })
            .unwrap_or_default();

        let start_dt = event
            .properties()
            .get("DTSTART")
            .and_then(|p| parse_ics_datetime(p.value(), zone))
            .ok_or_else(|| format!("No usable DTSTART on {}", uid))?;
        let end_dt = event
            .properties()
            .get("DTEND")
            .and_then(|p| parse_ics_datetime(p.value(), zone));

        let mut record = EventRecord {
            id: uid,
            title,
            url,
            title_language,
            start: start_dt.format(RECORD_FORMAT).to_string(),
            end: end_dt.map(|d| d.format(RECORD_FORMAT).to_string()),
            ..EventRecord::default()
        };

        if let Some(rule) = event.properties().get("RRULE") {
            match parse_day_recurrence(rule.value(), zone) {
                Some(recurrence) => {
                    let count = recurrence.occurrences_from(start_dt);
                    let last = recurrence.until.or_else(|| {
                        let n = count?;
                        let days = i64::from(n.saturating_sub(1))
                            .checked_mul(i64::from(recurrence.interval_days))?;
                        start_dt.checked_add_signed(TimeDelta::try_days(days)?)
                    });
                    record.recurrence_interval_days = Some(recurrence.interval_days);
                    record.occurrence_count = Some(count.unwrap_or(u32::MAX));
                    record.recurrence_end = last.map(|d| d.format(RECORD_FORMAT).to_string());
                }
                None => {
                    tracing::warn!(
                        event = %record.id,
                        rrule = rule.value(),
                        "unsupported recurrence rule, showing first occurrence only"
                    );
                }
            }
        }

        Ok(record)
    }
}

impl DayRecurrence {
    /// Occurrence count, derived from UNTIL when COUNT is absent.
    /// `None` means the rule never ends.
    pub fn occurrences_from(&self, start: NaiveDateTime) -> Option<u32> {
        if self.count.is_some() {
            return self.count;
        }
        let until = self.until?;
        if until < start {
            return Some(0);
        }
        let span = (until - start).num_days();
        u32::try_from(span / i64::from(self.interval_days.max(1)) + 1).ok()
    }
}

/// Accepts `FREQ=DAILY` and `FREQ=WEEKLY` rules with optional INTERVAL,
/// COUNT and UNTIL. Anything using BYDAY and friends is rejected.
pub fn parse_day_recurrence(rule: &str, zone: FixedOffset) -> Option<DayRecurrence> {
    let mut freq_days: Option<u32> = None;
    let mut interval = 1u32;
    let mut count = None;
    let mut until = None;

    for part in rule.split(';') {
        let (key, value) = part.split_once('=')?;
        match key.trim().to_uppercase().as_str() {
            "FREQ" => {
                freq_days = match value.trim().to_uppercase().as_str() {
                    "DAILY" => Some(1),
                    "WEEKLY" => Some(7),
                    _ => return None,
                }
            }
            "INTERVAL" => interval = value.trim().parse().ok().filter(|n| *n > 0)?,
            "COUNT" => count = Some(value.trim().parse().ok()?),
            "UNTIL" => until = Some(parse_ics_datetime(value.trim(), zone)?),
            "WKST" => {}
            _ => return None,
        }
    }

    Some(DayRecurrence {
        interval_days: freq_days?.checked_mul(interval)?,
        count,
        until,
    })
}

/// `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`, falling back to the
/// record formats for hand-written feeds.
pub fn parse_ics_datetime(val: &str, zone: FixedOffset) -> Option<NaiveDateTime> {
    let val = val.trim();
    if val.len() == 8 {
        return NaiveDate::parse_from_str(val, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0));
    }
    if let Some(utc) = val.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|d| Utc.from_utc_datetime(&d).with_timezone(&zone).naive_local());
    }
    NaiveDateTime::parse_from_str(val, "%Y%m%dT%H%M%S")
        .ok()
        .or_else(|| parse_event_datetime(val))
}
