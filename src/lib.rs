pub mod aggregator;
pub mod calendar;
pub mod client;
pub mod config;
pub mod disclosure;
pub mod error;
pub mod grid;
pub mod markup;
pub mod model;
pub mod shortcode;
pub mod source;
pub mod storage;

#[cfg(feature = "tui")]
pub mod tui;

pub use calendar::Calendar;
pub use error::{CalendarError, Result};
