//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Datelike, Utc};

/// Returns today's date, e.g. `Mon, Oct 19, 2026`.
///
/// Usage in templates: `{{ ""|current_date }}`
#[askama::filter_fn]
pub fn current_date(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_date(Utc::now()))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    Ok(Utc::now().year())
}

fn format_date(now: DateTime<Utc>) -> String {
    now.format("%a, %b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_date() {
        let Some(date) = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).single() else {
            panic!("valid date");
        };
        assert_eq!(format_date(date), "Mon, Oct 19, 2026");

        let Some(date) = Utc.with_ymd_and_hms(2027, 1, 5, 0, 0, 0).single() else {
            panic!("valid date");
        };
        assert_eq!(format_date(date), "Tue, Jan 5, 2027");
    }
}
