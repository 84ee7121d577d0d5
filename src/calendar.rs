// File: ./src/calendar.rs
// One calendar render: fetch -> aggregate -> grid -> markup
use crate::aggregator::{DayBuckets, aggregate};
use crate::error::Result;
use crate::grid::{Grid, render};
use crate::markup::{AllowList, Node, calendar_markup};
use crate::model::{CalendarRequest, EventRecord, MonthMeta};
use crate::source::{EventFilter, EventSource};
use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub request: CalendarRequest,
    pub meta: MonthMeta,
    pub buckets: DayBuckets,
}

impl Calendar {
    pub fn from_events(request: CalendarRequest, events: &[EventRecord]) -> Self {
        Self {
            request,
            meta: request.meta(),
            buckets: aggregate(events, &request),
        }
    }

    /// Queries `source` for the month and aggregates the result. Source
    /// failures are returned as-is.
    pub async fn load(request: CalendarRequest, source: &dyn EventSource) -> Result<Self> {
        let filter = EventFilter::for_month(&request);
        let events = source.fetch_events(&filter).await?;
        info!(
            month = request.month(),
            year = request.year(),
            events = events.len(),
            "loaded calendar"
        );
        Ok(Self::from_events(request, &events))
    }

    pub fn grid(&self) -> Grid {
        render(&self.meta, self.buckets.clone())
    }

    pub fn markup(&self) -> Node {
        calendar_markup(&self.grid())
    }

    /// Serialized markup, restricted to the calendar's allow-list.
    pub fn to_html(&self) -> Result<String> {
        AllowList::calendar()
            .sanitize(self.markup())
            .iter()
            .map(Node::to_html)
            .collect()
    }
}

/// Today's date in the site's fixed zone.
pub fn today(zone: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&zone).date_naive()
}
