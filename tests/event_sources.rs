use chrono::{FixedOffset, NaiveDate};
use evcal::CalendarError;
use evcal::client::CalDavSource;
use evcal::config::Config;
use evcal::model::CalendarRequest;
use evcal::model::EventRecord;
use evcal::model::adapter::{parse_day_recurrence, parse_ics_datetime};
use evcal::source::{EventFilter, EventSource};
use evcal::storage::LocalStorage;
use mockito::Server;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

const STANDUP_ICS: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//evcal//test//EN\r
BEGIN:VEVENT\r
UID:standup\r
SUMMARY:Standup\r
URL:https://example.org/standup\r
DTSTART:20240115T100000\r
DTEND:20240115T103000\r
RRULE:FREQ=WEEKLY;COUNT=10\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:retreat\r
SUMMARY:Retreat\r
DTSTART:20240330T080000Z\r
DTEND:20240402T160000Z\r
END:VEVENT\r
END:VCALENDAR\r
";

#[test]
fn test_from_ics_maps_vevents() {
    let zone = FixedOffset::east_opt(60 * 60).unwrap();
    let records = EventRecord::from_ics(STANDUP_ICS, zone).unwrap();
    assert_eq!(records.len(), 2);

    let standup = &records[0];
    assert_eq!(standup.id, "standup");
    assert_eq!(standup.title, "Standup");
    assert_eq!(standup.url, "https://example.org/standup");
    assert_eq!(standup.start, "2024-01-15 10:00:00");
    assert_eq!(standup.end.as_deref(), Some("2024-01-15 10:30:00"));
    assert_eq!(standup.recurrence_interval_days, Some(7));
    assert_eq!(standup.occurrence_count, Some(10));
    assert_eq!(standup.recurrence_end.as_deref(), Some("2024-03-18 10:00:00"));

    // UTC times land in the configured zone
    let retreat = &records[1];
    assert_eq!(retreat.start, "2024-03-30 09:00:00");
    assert_eq!(retreat.end.as_deref(), Some("2024-04-02 17:00:00"));
    assert!(!retreat.is_recurring());
}

#[test]
fn test_from_ics_without_events() {
    let todo_only = "BEGIN:VCALENDAR\r
VERSION:2.0\r
BEGIN:VTODO\r
UID:todo\r
SUMMARY:Not an event\r
END:VTODO\r
END:VCALENDAR\r
";
    assert_eq!(EventRecord::from_ics(todo_only, utc()).unwrap_err(), "No VEVENT");
}

#[test]
fn test_parse_day_recurrence() {
    let weekly = parse_day_recurrence("FREQ=WEEKLY;INTERVAL=2;UNTIL=20240301T000000Z", utc()).unwrap();
    assert_eq!(weekly.interval_days, 14);
    assert_eq!(weekly.count, None);
    assert_eq!(weekly.until, Some(at(2024, 3, 1, 0)));
    // Jan 1, 15, 29, Feb 12, 26
    assert_eq!(weekly.occurrences_from(at(2024, 1, 1, 0)), Some(5));

    let daily = parse_day_recurrence("FREQ=DAILY;COUNT=3;WKST=MO", utc()).unwrap();
    assert_eq!(daily.interval_days, 1);
    assert_eq!(daily.occurrences_from(at(2024, 1, 1, 0)), Some(3));

    let forever = parse_day_recurrence("FREQ=DAILY", utc()).unwrap();
    assert_eq!(forever.occurrences_from(at(2024, 1, 1, 0)), None);

    assert!(parse_day_recurrence("FREQ=MONTHLY", utc()).is_none());
    assert!(parse_day_recurrence("FREQ=WEEKLY;BYDAY=MO,WE", utc()).is_none());
    assert!(parse_day_recurrence("FREQ=DAILY;INTERVAL=0", utc()).is_none());
    // Valid but wider than any day interval we can hold
    assert!(parse_day_recurrence("FREQ=WEEKLY;INTERVAL=1000000000", utc()).is_none());
    assert_eq!(
        parse_day_recurrence("FREQ=DAILY;INTERVAL=1000000000", utc()).map(|r| r.interval_days),
        Some(1_000_000_000)
    );
}

#[test]
fn test_parse_ics_datetime() {
    let zone = FixedOffset::east_opt(60 * 60).unwrap();
    assert_eq!(parse_ics_datetime("20240115", zone), Some(at(2024, 1, 15, 0)));
    assert_eq!(
        parse_ics_datetime("20240115T230000Z", zone),
        Some(at(2024, 1, 16, 0))
    );
    assert_eq!(
        parse_ics_datetime("20240115T230000", zone),
        Some(at(2024, 1, 15, 23))
    );
    assert_eq!(parse_ics_datetime("garbage", zone), None);
}

#[tokio::test]
async fn test_local_storage_round_trip_and_filter() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path().join("events.json"));

    // Missing file is an empty store
    assert!(storage.load().unwrap().is_empty());

    let events = vec![
        EventRecord::new("late", "Late", "2024-03-20 09:00:00"),
        EventRecord::new("early", "Early", "2024-03-02 09:00:00"),
        EventRecord::new("old", "Old", "2023-01-02 09:00:00"),
    ];
    storage.save(&events).unwrap();
    assert_eq!(storage.load().unwrap(), events);

    let filter = EventFilter::for_month(&CalendarRequest::new(3, 2024).unwrap());
    let fetched = storage.fetch_events(&filter).await.unwrap();
    let ids: Vec<&str> = fetched.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "late"]);
}

#[test]
fn test_local_storage_reads_store_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    std::fs::write(
        &path,
        r#"[{
            "id": "42",
            "title": "Choir",
            "url": "https://example.org/choir",
            "titleLanguage": "en",
            "startDateTime": "2024-01-15 19:00:00",
            "recurrenceIntervalDays": 7,
            "occurrenceCount": 10
        }]"#,
    )
    .unwrap();

    let events = LocalStorage::new(&path).load().unwrap();
    assert_eq!(events[0].title_language, "en");
    assert_eq!(events[0].recurrence_interval_days, Some(7));
    assert!(events[0].is_recurring());
    assert_eq!(events[0].end, None);
}

#[test]
fn test_local_storage_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        LocalStorage::new(&path).load(),
        Err(CalendarError::Json(_))
    ));
}

#[tokio::test]
async fn test_config_picks_events_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    LocalStorage::new(&path)
        .save(&[EventRecord::new("a", "A", "2024-03-05 10:00:00")])
        .unwrap();

    let config = Config::from_toml(&format!(
        "url = \"https://dav.example.org/\"\nevents_file = {:?}\nutc_offset_minutes = 120\n",
        path.display().to_string()
    ))
    .unwrap();
    assert_eq!(config.zone().unwrap().local_minus_utc(), 7200);

    let source = config.event_source().unwrap();
    let filter = EventFilter::for_month(&CalendarRequest::new(3, 2024).unwrap());
    assert_eq!(source.fetch_events(&filter).await.unwrap().len(), 1);
}

#[test]
fn test_config_rejects_bad_offset() {
    assert!(Config::from_toml("utc_offset_minutes = 100000").is_err());
    assert!(Config::from_toml("").is_ok());
}

#[test]
fn test_config_load_from_reports_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    std::fs::write(&path, "utc_offset_minutes = \"sixty\"").unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("config.toml"));

    std::fs::write(&path, "utc_offset_minutes = 60\nscript = \"/cal.js\"").unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.utc_offset_minutes, 60);
    assert_eq!(config.script.as_deref(), Some("/cal.js"));
}

#[tokio::test]
async fn test_caldav_error_is_returned() {
    // 1. Setup Mock Server
    let mut server = Server::new_async().await;
    let url = server.url();

    // 2. Mock: listing the collection fails
    let mock_500 = server
        .mock("PROPFIND", "/cal/")
        .with_status(500)
        .create_async()
        .await;

    // 3. Configure Source
    let source = CalDavSource::new(&url, "user", "pass", true, vec!["/cal/".to_string()], utc())
        .unwrap();

    // 4. Fetch
    let filter = EventFilter::for_month(&CalendarRequest::new(3, 2024).unwrap());
    let result = source.fetch_events(&filter).await;

    // 5. Assertions
    assert!(
        matches!(result, Err(CalendarError::Source(_))),
        "server error should surface as a source error"
    );
    mock_500.assert_async().await;
}

fn multistatus(responses: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">{}</d:multistatus>"#,
        responses.concat()
    )
}

fn listed(href: &str, content_type: &str, resource_type: &str) -> String {
    format!(
        r#"<d:response><d:href>{href}</d:href><d:propstat><d:prop><d:resourcetype>{resource_type}</d:resourcetype><d:getcontenttype>{content_type}</d:getcontenttype><d:getetag>"{href}"</d:getetag></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>"#
    )
}

fn fetched(href: &str, ics: &str) -> String {
    format!(
        r#"<d:response><d:href>{href}</d:href><d:propstat><d:prop><d:getetag>"{href}"</d:getetag><c:calendar-data>{ics}</c:calendar-data></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>"#
    )
}

const CHORES_ICS: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//evcal//test//EN\r
BEGIN:VTODO\r
UID:chores\r
SUMMARY:Chores\r
END:VTODO\r
END:VCALENDAR\r
";

const PLANNING_ICS: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//evcal//test//EN\r
BEGIN:VEVENT\r
UID:planning\r
SUMMARY:Planning\r
DTSTART:20240301T090000\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:archived\r
SUMMARY:Archived\r
DTSTART:20230501T090000\r
END:VEVENT\r
END:VCALENDAR\r
";

#[tokio::test]
async fn test_caldav_fetches_and_filters_events() {
    // 1. Setup Mock Server
    let mut server = Server::new_async().await;
    let url = server.url();

    // 2. Mock: two collections; the first also holds a task and a stray file
    let list_cal = server
        .mock("PROPFIND", "/cal/")
        .with_status(207)
        .with_header("content-type", "application/xml; charset=utf-8")
        .with_body(multistatus(&[
            listed("/cal/", "", "<d:collection/><c:calendar/>"),
            listed("/cal/standup.ics", "text/calendar", ""),
            listed("/cal/chores.ics", "text/calendar", ""),
            listed("/cal/notes.txt", "text/plain", ""),
        ]))
        .create_async()
        .await;
    let list_work = server
        .mock("PROPFIND", "/work/")
        .with_status(207)
        .with_header("content-type", "application/xml; charset=utf-8")
        .with_body(multistatus(&[
            listed("/work/", "", "<d:collection/><c:calendar/>"),
            listed("/work/planning.ics", "text/calendar", ""),
        ]))
        .create_async()
        .await;

    // 3. Mock: multiget of the .ics resources
    let get_cal = server
        .mock("REPORT", "/cal/")
        .match_body(mockito::Matcher::Regex("standup\\.ics".to_string()))
        .with_status(207)
        .with_header("content-type", "application/xml; charset=utf-8")
        .with_body(multistatus(&[
            fetched("/cal/standup.ics", STANDUP_ICS),
            fetched("/cal/chores.ics", CHORES_ICS),
        ]))
        .create_async()
        .await;
    let get_work = server
        .mock("REPORT", "/work/")
        .with_status(207)
        .with_header("content-type", "application/xml; charset=utf-8")
        .with_body(multistatus(&[fetched("/work/planning.ics", PLANNING_ICS)]))
        .create_async()
        .await;

    // 4. Configure Source
    let source = CalDavSource::new(
        &url,
        "user",
        "pass",
        true,
        vec!["/cal/".to_string(), "/work/".to_string()],
        utc(),
    )
    .unwrap();

    // 5. Fetch March 2024: window is Jan 1 through Mar 31
    let filter = EventFilter::for_month(&CalendarRequest::new(3, 2024).unwrap());
    let events = source.fetch_events(&filter).await.unwrap();

    // 6. Assertions
    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["standup", "planning", "retreat"]);
    assert_eq!(events[0].recurrence_interval_days, Some(7));
    assert_eq!(events[2].start, "2024-03-30 08:00:00");

    list_cal.assert_async().await;
    list_work.assert_async().await;
    get_cal.assert_async().await;
    get_work.assert_async().await;
}

#[test]
fn test_caldav_requires_url() {
    assert!(matches!(
        CalDavSource::new("", "user", "pass", true, vec![], utc()),
        Err(CalendarError::Config(_))
    ));
}
