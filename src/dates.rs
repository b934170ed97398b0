//! Date parsing and formatting.
//!
//! Records may come from older data where dates were written either as
//! `YYYY-MM-DD`, `DD-MM-YYYY` or a full ISO date-time. Parsing is lenient and
//! returns `None` rather than an error so that a malformed date only removes a
//! record from date-based views.

use time::{Date, Month};

/// Parse a date written as `YYYY-MM-DD`, `DD-MM-YYYY` or an ISO 8601 date-time.
///
/// Any time of day is ignored. Returns `None` if the text is not a valid date.
pub fn parse_date(text: &str) -> Option<Date> {
    let date_part = text.trim().split('T').next()?;
    let mut parts = date_part.split('-');

    let first: i32 = parts.next()?.trim().parse().ok()?;
    let second: u8 = parts.next()?.trim().parse().ok()?;
    let third: i32 = parts.next()?.trim().parse().ok()?;

    if parts.next().is_some() {
        return None;
    }

    let (year, month, day) = if first > 1000 {
        (first, second, third)
    } else {
        (third, second, first)
    };

    let month = Month::try_from(month).ok()?;
    let day = u8::try_from(day).ok()?;

    Date::from_calendar_date(year, month, day).ok()
}

/// Format a date as `DD-MM-YYYY` for display and reports.
pub fn format_display_date(date: Date) -> String {
    format!(
        "{:02}-{:02}-{}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

/// Add `months` calendar months to `date`.
///
/// The day is clamped to the last day of the resulting month, e.g. adding one
/// month to 31 January gives 28 or 29 February.
/// Returns `None` if the result is outside the supported date range.
pub fn add_months(date: Date, months: u32) -> Option<Date> {
    let month_index = i64::from(u8::from(date.month())) - 1 + i64::from(months);
    let year = i32::try_from(i64::from(date.year()) + month_index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(month_index.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(month.length(year));

    Date::from_calendar_date(year, month, day).ok()
}

// Serializes dates that are always present as `YYYY-MM-DD`.
time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Serde helpers for optional dates.
///
/// Dates are written as `YYYY-MM-DD`. Reading accepts anything [parse_date]
/// accepts and maps unreadable dates to `None` instead of failing.
pub mod optional_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::parse_date;

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text: Option<String> = Option::deserialize(deserializer)?;

        Ok(text.as_deref().and_then(parse_date))
    }
}

#[cfg(test)]
mod parse_date_tests {
    use time::macros::date;

    use super::parse_date;

    #[test]
    fn parses_year_first() {
        assert_eq!(parse_date("2025-03-09"), Some(date!(2025 - 03 - 09)));
    }

    #[test]
    fn parses_day_first() {
        assert_eq!(parse_date("09-03-2025"), Some(date!(2025 - 03 - 09)));
    }

    #[test]
    fn ignores_time_of_day() {
        assert_eq!(
            parse_date("2025-03-09T23:59:59.000Z"),
            Some(date!(2025 - 03 - 09))
        );
    }

    #[test]
    fn rejects_malformed_dates() {
        for text in ["", "yesterday", "2025-13-01", "2025-02-30", "2025-01", "1-2-3-4"] {
            assert_eq!(parse_date(text), None, "{text:?} should not parse");
        }
    }
}

#[cfg(test)]
mod add_months_tests {
    use time::macros::date;

    use super::{add_months, format_display_date};

    #[test]
    fn adds_months_within_year() {
        assert_eq!(add_months(date!(2025 - 01 - 15), 2), Some(date!(2025 - 03 - 15)));
    }

    #[test]
    fn rolls_over_year() {
        assert_eq!(add_months(date!(2025 - 11 - 15), 3), Some(date!(2026 - 02 - 15)));
        assert_eq!(add_months(date!(2025 - 06 - 01), 12), Some(date!(2026 - 06 - 01)));
    }

    #[test]
    fn clamps_to_end_of_month() {
        assert_eq!(add_months(date!(2025 - 01 - 31), 1), Some(date!(2025 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 01 - 31), 1), Some(date!(2024 - 02 - 29)));
    }

    #[test]
    fn formats_day_first() {
        assert_eq!(format_display_date(date!(2025 - 03 - 09)), "09-03-2025");
    }
}
