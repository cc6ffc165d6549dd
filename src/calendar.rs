//! Calendar arithmetic and the single place where date-only strings are
//! turned into dates.

use chrono::{Datelike, Month, NaiveDate};

use crate::models::{DailyUsageRecord, MonthlyUsageRecord};

/// Proleptic Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1-12) of `year`; 0 for an out-of-range month.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn is_current_month(month: u32, year: i32, today: NaiveDate) -> bool {
    today.month() == month && today.year() == year
}

pub fn is_current_year(year: i32, today: NaiveDate) -> bool {
    today.year() == year
}

/// Interprets a "YYYY-MM-DD" string as a calendar date with no timezone
/// attached, so the day never shifts with the host offset.
pub fn parse_local_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Resolves a monthly record label to `(year, month)`.
///
/// "YYYY-MM" carries its own year; a bare month name ("March", "Mar") is
/// placed in `current_year`.
pub fn parse_month_label(label: &str, current_year: i32) -> Option<(i32, u32)> {
    if let Some((year, month)) = label.split_once('-') {
        let year = year.trim().parse::<i32>().ok()?;
        let month = month.trim().parse::<u32>().ok()?;
        return (1..=12).contains(&month).then_some((year, month));
    }

    let month = label.trim().parse::<Month>().ok()?;
    Some((current_year, month.number_from_month()))
}

/// Long English name of a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    let month = u8::try_from(month).ok()?;
    Month::try_from(month).ok().map(|m| m.name())
}

/// Day-of-month of the chronologically last record that has data.
///
/// Zero consumption still counts; malformed dates and negative or
/// unparseable consumption are skipped.
pub fn last_day_with_data(days: &[DailyUsageRecord]) -> Option<u32> {
    days.iter()
        .filter(|d| d.has_data())
        .filter_map(DailyUsageRecord::local_date)
        .max()
        .map(|d| d.day())
}

/// Label of the last record, in API order, that has data.
pub fn last_month_with_data(months: &[MonthlyUsageRecord]) -> Option<&str> {
    months
        .iter()
        .rev()
        .find(|m| m.has_data())
        .map(|m| m.month.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, consumption: Option<f64>) -> DailyUsageRecord {
        DailyUsageRecord {
            date: date.into(),
            consumption,
            generation: Some(0.0),
            vehicle_charging: Some(0.0),
            eligible_vehicle_charging: Some(0.0),
        }
    }

    fn month(label: &str, consumption: Option<f64>) -> MonthlyUsageRecord {
        MonthlyUsageRecord {
            month: label.into(),
            consumption,
            generation: Some(0.0),
            vehicle_charging: Some(0.0),
            eligible_vehicle_charging: Some(0.0),
        }
    }

    #[test]
    fn february_follows_the_400_year_rule() {
        assert_eq!(days_in_month(2, 2024), 29);
        assert_eq!(days_in_month(2, 2023), 28);
        assert_eq!(days_in_month(2, 2000), 29);
        assert_eq!(days_in_month(2, 1900), 28);
    }

    #[test]
    fn days_in_month_covers_every_month() {
        let expected = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for (idx, days) in expected.iter().enumerate() {
            assert_eq!(days_in_month(idx as u32 + 1, 2023), *days);
        }
        assert_eq!(days_in_month(0, 2023), 0);
        assert_eq!(days_in_month(13, 2023), 0);
    }

    #[test]
    fn current_month_implies_current_year() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert!(is_current_month(1, 2025, today));
        assert!(!is_current_month(1, 2024, today));
        assert!(!is_current_month(2, 2025, today));

        for year in 2023..=2026 {
            for m in 1..=12 {
                if is_current_month(m, year, today) {
                    assert!(is_current_year(year, today));
                }
            }
        }
    }

    #[test]
    fn parse_local_date_keeps_the_calendar_day() {
        let d = parse_local_date("2025-01-01").expect("valid date");
        assert_eq!((d.year(), d.month(), d.day()), (2025, 1, 1));
        assert!(parse_local_date("2025-02-30").is_none());
        assert!(parse_local_date("2025-01-01T00:00:00").is_none());
        assert!(parse_local_date("").is_none());
    }

    #[test]
    fn month_labels_resolve_both_forms() {
        assert_eq!(parse_month_label("2023-10", 2025), Some((2023, 10)));
        assert_eq!(parse_month_label("January", 2025), Some((2025, 1)));
        assert_eq!(parse_month_label("sep", 2025), Some((2025, 9)));
        assert_eq!(parse_month_label("2023-13", 2025), None);
        assert_eq!(parse_month_label("Smarch", 2025), None);
    }

    #[test]
    fn month_name_is_long_english() {
        assert_eq!(month_name(10), Some("October"));
        assert_eq!(month_name(0), None);
    }

    #[test]
    fn last_day_with_data_uses_the_latest_date() {
        let days = vec![day("2025-01-03", Some(2.0)), day("2025-01-01", Some(1.0))];
        assert_eq!(last_day_with_data(&days), Some(3));
        assert_eq!(last_day_with_data(&[]), None);
    }

    #[test]
    fn last_day_with_data_counts_zero_and_skips_malformed() {
        let days = vec![
            day("2025-01-02", Some(0.0)),
            day("2025-01-09", Some(-1.0)),
            day("2025-01-10", None),
            day("not-a-date", Some(4.0)),
        ];
        assert_eq!(last_day_with_data(&days), Some(2));
    }

    #[test]
    fn last_month_with_data_takes_last_present_label() {
        let months = vec![
            month("January", Some(10.0)),
            month("February", Some(0.0)),
            month("March", None),
        ];
        assert_eq!(last_month_with_data(&months), Some("February"));
        assert_eq!(last_month_with_data(&[]), None);
    }
}
