//! `MM-YYYY` month handling. Only month precision is meaningful; every date
//! is pinned to the first day of its month.

use chrono::{Datelike, NaiveDate};

/// Parses a strict `MM-YYYY` string into the first day of that month.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    let (month, year) = value.split_once('-')?;
    if month.len() != 2 || year.len() != 4 {
        return None;
    }
    if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

pub fn format_month(date: NaiveDate) -> String {
    format!("{:02}-{:04}", date.month(), date.year())
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(
            parse_month("11-2025"),
            NaiveDate::from_ymd_opt(2025, 11, 1)
        );
        assert_eq!(parse_month("01-2030"), NaiveDate::from_ymd_opt(2030, 1, 1));
    }

    #[test]
    fn test_parse_month_rejects_malformed() {
        assert!(parse_month("13-2025").is_none());
        assert!(parse_month("00-2025").is_none());
        assert!(parse_month("1-2025").is_none());
        assert!(parse_month("2025-01").is_none());
        assert!(parse_month("01/2025").is_none());
        assert!(parse_month("+1-2025").is_none());
        assert!(parse_month("").is_none());
    }

    #[test]
    fn test_format_month() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        assert_eq!(format_month(date), "03-2025");
        assert_eq!(format_month(month_start(date)), "03-2025");
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }
}
