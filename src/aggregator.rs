// File: ./src/aggregator.rs
// Places events onto the days of a requested month
use crate::model::{CalendarRequest, DayEventEntry, EventRecord};
use chrono::{Datelike, Duration, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Day of month -> entries, in the order the events were processed.
pub type DayBuckets = BTreeMap<u32, Vec<DayEventEntry>>;

/// Buckets `events` by day for `request`'s month.
///
/// Events are expected in ascending start order; entries keep that order.
/// A record whose start can't be parsed is logged and skipped, the rest of
/// the batch still lands.
pub fn aggregate(events: &[EventRecord], request: &CalendarRequest) -> DayBuckets {
    let mut buckets = DayBuckets::new();
    let month_end = request.last_instant();

    for event in events {
        let Some(start) = event.start_datetime() else {
            warn!(event = %event.id, start = %event.start, "unparsable start date, skipping event");
            continue;
        };

        if event.is_recurring() {
            add_occurrences(&mut buckets, event, start, request, month_end);
            continue;
        }

        if request.contains(start.date()) {
            push(&mut buckets, start.day(), event.entry());
        }

        let end = match event.end.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let parsed = event.end_datetime();
                if parsed.is_none() {
                    warn!(event = %event.id, end = raw, "unparsable end date, ignoring it");
                }
                parsed
            }
            _ => None,
        };
        if let Some(end) = end
            && end.date() != start.date()
            && request.contains(end.date())
        {
            push(&mut buckets, end.day(), event.end_entry());
        }
    }

    debug!(
        month = request.month(),
        year = request.year(),
        days = buckets.len(),
        "aggregated events"
    );
    buckets
}

/// Steps through a recurring event from its first occurrence. Occurrences
/// outside the month still use up the count.
fn add_occurrences(
    buckets: &mut DayBuckets,
    event: &EventRecord,
    start: NaiveDateTime,
    request: &CalendarRequest,
    month_end: NaiveDateTime,
) {
    let count = event.occurrence_count.unwrap_or(0);
    let interval = event.recurrence_interval_days.unwrap_or(0);

    if interval == 0 {
        warn!(event = %event.id, "recurring event without interval, placing first occurrence only");
        if request.contains(start.date()) {
            push(buckets, start.day(), event.entry());
        }
        return;
    }

    let step = Duration::days(i64::from(interval));
    let mut at = start;
    let mut occurrence = 0u32;
    while at <= month_end {
        occurrence += 1;
        if occurrence > count {
            break;
        }
        if request.contains(at.date()) {
            push(buckets, at.day(), event.entry());
        }
        let Some(next) = at.checked_add_signed(step) else {
            warn!(event = %event.id, interval, "recurrence steps past the supported date range");
            break;
        };
        at = next;
    }
}

fn push(buckets: &mut DayBuckets, day: u32, entry: DayEventEntry) {
    buckets.entry(day).or_default().push(entry);
}
