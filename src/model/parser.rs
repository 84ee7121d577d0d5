// File: ./src/model/parser.rs
// Normalizes free-form month/year input (shortcode attributes, CLI args)
use crate::error::{CalendarError, Result};
use crate::model::month::{CalendarRequest, MONTH_NAMES};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

// An unterminated tag runs to the end of the input.
static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*(?:>|$)").expect("valid tag regex"));
static RE_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid comma regex"));

impl CalendarRequest {
    /// Builds a request from user input. Empty values fall back to `today`.
    ///
    /// `month` is either a name ("January", "jan") or a 1-2 digit number,
    /// `year` must be four digits.
    pub fn from_input(month: Option<&str>, year: Option<&str>, today: NaiveDate) -> Result<Self> {
        let month = month.map(sanitize_text).unwrap_or_default();
        let year = year.map(sanitize_text).unwrap_or_default();

        let month_num = if month.is_empty() {
            today.month()
        } else if month.chars().count() > 2 {
            parse_month_name(&month).ok_or(CalendarError::InvalidMonthName(month.clone()))?
        } else {
            month
                .parse::<u32>()
                .ok()
                .filter(|m| (1..=12).contains(m))
                .ok_or(CalendarError::InvalidMonth(month.clone()))?
        };

        let year_num = if year.is_empty() {
            today.year()
        } else if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
            year.parse::<i32>()
                .map_err(|_| CalendarError::InvalidYear(year.clone()))?
        } else {
            return Err(CalendarError::InvalidYear(year));
        };

        CalendarRequest::new(month_num, year_num)
    }
}

/// Full English month name or its three letter abbreviation, any case.
pub fn parse_month_name(name: &str) -> Option<u32> {
    let lower = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| {
            let m = m.to_lowercase();
            m == lower || (lower.len() == 3 && m.starts_with(&lower))
        })
        .map(|idx| idx as u32 + 1)
}

/// Strips tags and line breaks, collapses runs of whitespace, and removes
/// whitespace around commas.
pub fn sanitize_text(raw: &str) -> String {
    let stripped = RE_TAG.replace_all(raw, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    RE_COMMA.replace_all(&collapsed, ",").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_tags_and_comma_spacing() {
        assert_eq!(sanitize_text("  <em>Feb</em>\n ruary "), "Feb ruary");
        assert_eq!(sanitize_text("a ,  b,c "), "a,b,c");
        assert_eq!(sanitize_text("<br/>"), "");
        assert_eq!(sanitize_text("May<b class="), "May");
    }

    #[test]
    fn month_names_and_abbreviations() {
        assert_eq!(parse_month_name("DECEMBER"), Some(12));
        assert_eq!(parse_month_name("may"), Some(5));
        assert_eq!(parse_month_name("Sept"), None);
        assert_eq!(parse_month_name("Ja"), None);
    }
}
