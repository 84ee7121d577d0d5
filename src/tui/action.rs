use crate::calendar::Calendar;
use crate::model::CalendarRequest;

#[derive(Debug)]
pub enum Action {
    LoadMonth(CalendarRequest),
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    CalendarLoaded(Calendar),
    Error(String),
    Status(String),
}
