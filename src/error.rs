// File: ./src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("invalid month name: {0}")]
    InvalidMonthName(String),

    #[error("invalid month: {0}")]
    InvalidMonth(String),

    #[error("invalid year: {0}")]
    InvalidYear(String),

    /// The event source could not be queried. Never retried by the core.
    #[error("event source unavailable: {0}")]
    Source(String),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("rendering markup: {0}")]
    Render(#[from] askama::Error),
}

pub type Result<T, E = CalendarError> = std::result::Result<T, E>;
