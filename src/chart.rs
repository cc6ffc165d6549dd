//! Turns raw usage pages into chart-ready series.
//!
//! Every entry point takes `today` explicitly; callers read their clock once
//! per render and pass the same date to each function. Absent or malformed
//! input degrades to empty output, never to an error.

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

use crate::calendar::{
    days_in_month, is_current_month, is_current_year, last_day_with_data, last_month_with_data,
    month_name, parse_month_label,
};
use crate::models::{
    ChartDataPoint, ChartLabel, DailyUsagePage, DailyUsageRecord, DataCompletenessInfo,
    MonthlyUsagePage, MonthlyUsageRecord, UsageView, ViewMode,
};

/// A usage response together with the view it belongs to.
#[derive(Debug, Clone, Copy)]
pub enum UsageData<'a> {
    Monthly(&'a MonthlyUsagePage),
    Daily(&'a DailyUsagePage),
}

impl UsageData<'_> {
    pub fn mode(&self) -> ViewMode {
        match self {
            UsageData::Monthly(_) => ViewMode::Monthly,
            UsageData::Daily(_) => ViewMode::Daily,
        }
    }

    pub fn units(&self) -> &str {
        match self {
            UsageData::Monthly(page) => &page.units,
            UsageData::Daily(page) => &page.units,
        }
    }
}

/// Month/year the daily view should target instead of the page's own.
/// Zero values are treated as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodOverride {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PeriodOverride {
    pub fn new(month: u32, year: i32) -> Self {
        Self {
            month: Some(month),
            year: Some(year),
        }
    }

    fn resolve(&self, page_month: u32, page_year: i32) -> (u32, i32) {
        (
            self.month.filter(|m| *m != 0).unwrap_or(page_month),
            self.year.filter(|y| *y != 0).unwrap_or(page_year),
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_monthly_chart_data(
    months: Option<&[MonthlyUsageRecord]>,
    today: NaiveDate,
) -> Vec<ChartDataPoint> {
    let Some(months) = months else {
        return vec![];
    };
    let current = (today.year(), today.month());

    months
        .iter()
        .map(|record| {
            let parsed = parse_month_label(&record.month, current.0);
            let display = match parsed {
                Some((_, m)) if record.month.contains('-') => month_name(m)
                    .map(str::to_string)
                    .unwrap_or_else(|| record.month.clone()),
                _ => record.month.clone(),
            };

            ChartDataPoint {
                day: ChartLabel::Month(display),
                consumption: round2(record.consumption.unwrap_or(0.0)),
                is_partial: Some(parsed == Some(current)),
                is_future: None,
                is_today: None,
                has_data: None,
            }
        })
        .collect()
}

/// One point per calendar day of `month`/`year`, filling gaps with zeroes.
///
/// Records are keyed by day-of-month; a later record for the same day wins.
pub fn generate_full_month_data(
    days: Option<&[DailyUsageRecord]>,
    month: u32,
    year: i32,
    today: NaiveDate,
) -> Vec<ChartDataPoint> {
    let total_days = days_in_month(month, year);
    let this_month = is_current_month(month, year, today);
    let current_day = today.day();

    let mut by_day: HashMap<u32, &DailyUsageRecord> = HashMap::new();
    for record in days.unwrap_or_default() {
        if let Some(date) = record.local_date() {
            by_day.insert(date.day(), record);
        }
    }

    (1..=total_days)
        .map(|day| {
            let record = by_day.get(&day);
            ChartDataPoint {
                day: ChartLabel::Day(day),
                consumption: record
                    .map(|r| round2(r.consumption.unwrap_or(0.0)))
                    .unwrap_or(0.0),
                is_partial: None,
                is_future: Some(this_month && day > current_day),
                is_today: Some(this_month && day == current_day),
                has_data: Some(record.is_some()),
            }
        })
        .collect()
}

pub fn format_chart_data(
    data: Option<UsageData<'_>>,
    period: PeriodOverride,
    today: NaiveDate,
) -> Vec<ChartDataPoint> {
    match data {
        None => vec![],
        Some(UsageData::Monthly(page)) => format_monthly_chart_data(Some(&page.months), today),
        Some(UsageData::Daily(page)) => {
            let (month, year) = period.resolve(page.month, page.year);
            generate_full_month_data(Some(&page.days), month, year, today)
        }
    }
}

/// Expected vs. present periods for the view.
///
/// In the daily view `days_with_data` is the last day-of-month that has
/// data, not a count of populated days.
pub fn data_completeness_info(
    data: Option<UsageData<'_>>,
    period: PeriodOverride,
    today: NaiveDate,
) -> DataCompletenessInfo {
    match data {
        None => DataCompletenessInfo::default(),
        Some(UsageData::Monthly(page)) => DataCompletenessInfo {
            total_days: 12,
            days_with_data: page.months.len() as u32,
            is_current_period: is_current_year(page.year, today),
            last_data_day: last_month_with_data(&page.months)
                .map(|m| ChartLabel::Month(m.to_string())),
        },
        Some(UsageData::Daily(page)) => {
            let (month, year) = period.resolve(page.month, page.year);
            let last_day = last_day_with_data(&page.days);
            DataCompletenessInfo {
                total_days: days_in_month(month, year),
                days_with_data: last_day.unwrap_or(0),
                is_current_period: is_current_month(month, year, today),
                last_data_day: last_day.map(ChartLabel::Day),
            }
        }
    }
}

pub fn usage_view(data: UsageData<'_>, period: PeriodOverride, today: NaiveDate) -> UsageView {
    UsageView {
        mode: data.mode(),
        units: data.units().to_string(),
        points: format_chart_data(Some(data), period, today),
        completeness: data_completeness_info(Some(data), period, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(label: &str, consumption: &str) -> MonthlyUsageRecord {
        MonthlyUsageRecord {
            month: label.into(),
            consumption: crate::models::decimal_string::parse(consumption),
            generation: Some(0.0),
            vehicle_charging: Some(0.0),
            eligible_vehicle_charging: Some(0.0),
        }
    }

    fn day(date: &str, consumption: &str) -> DailyUsageRecord {
        DailyUsageRecord {
            date: date.into(),
            consumption: crate::models::decimal_string::parse(consumption),
            generation: Some(0.0),
            vehicle_charging: Some(0.0),
            eligible_vehicle_charging: Some(0.0),
        }
    }

    fn daily_page(month: u32, year: i32, days: Vec<DailyUsageRecord>) -> DailyUsagePage {
        DailyUsagePage {
            month,
            year,
            units: "kWh".into(),
            days,
            next: None,
            previous: None,
        }
    }

    #[test]
    fn monthly_marks_only_the_in_progress_month_partial() {
        let today = date(2025, 6, 14);
        let months = vec![
            month("2025-05", "300.126"),
            month("2025-06", "120.5"),
            month("2025-07", "10"),
            month("2024-06", "280"),
        ];
        let points = format_monthly_chart_data(Some(&months), today);

        let partial: Vec<bool> = points.iter().map(|p| p.is_partial == Some(true)).collect();
        assert_eq!(partial, vec![false, true, false, false]);
        assert_eq!(points[0].day, ChartLabel::Month("May".into()));
        assert_eq!(points[0].consumption, 300.13);
    }

    #[test]
    fn monthly_month_names_assume_current_year() {
        let today = date(2025, 3, 2);
        let months = vec![month("February", "1"), month("March", "2")];
        let points = format_monthly_chart_data(Some(&months), today);
        assert_eq!(points[0].is_partial, Some(false));
        assert_eq!(points[1].is_partial, Some(true));
        assert_eq!(points[1].day, ChartLabel::Month("March".into()));
    }

    #[test]
    fn monthly_formatting_is_pure() {
        let today = date(2025, 3, 2);
        let months = vec![month("2025-01", "11.111"), month("bogus", "x")];
        let first = format_monthly_chart_data(Some(&months), today);
        let second = format_monthly_chart_data(Some(&months), today);
        assert_eq!(first, second);
        assert_eq!(first[1].consumption, 0.0);
        assert_eq!(first[1].day, ChartLabel::Month("bogus".into()));
        assert!(format_monthly_chart_data(None, today).is_empty());
    }

    #[test]
    fn full_month_has_one_point_per_day() {
        let today = date(2030, 1, 1);
        for year in [1900, 2000, 2023, 2024] {
            for m in 1..=12 {
                let points = generate_full_month_data(None, m, year, today);
                assert_eq!(points.len() as u32, days_in_month(m, year));
                for (idx, p) in points.iter().enumerate() {
                    assert_eq!(p.day, ChartLabel::Day(idx as u32 + 1));
                }
            }
        }
    }

    #[test]
    fn full_month_flags_today_and_future_in_current_month() {
        let today = date(2025, 1, 10);
        let days = vec![day("2025-01-01", "1.234"), day("2025-01-09", "0")];
        let points = generate_full_month_data(Some(&days), 1, 2025, today);

        assert_eq!(points[0].has_data, Some(true));
        assert_eq!(points[0].consumption, 1.23);
        assert_eq!(points[1].has_data, Some(false));
        assert_eq!(points[8].has_data, Some(true));
        assert_eq!(points[8].consumption, 0.0);
        assert_eq!(points[9].is_today, Some(true));
        assert_eq!(points[9].is_future, Some(false));
        assert_eq!(points[10].is_future, Some(true));
        assert_eq!(points[30].is_future, Some(true));
    }

    #[test]
    fn unparseable_consumption_is_present_but_zero() {
        let today = date(2025, 2, 1);
        let days = vec![day("2025-01-01", "2"), day("2025-01-05", "n/a")];
        let points = generate_full_month_data(Some(&days), 1, 2025, today);

        assert_eq!(points[4].has_data, Some(true));
        assert_eq!(points[4].consumption, 0.0);
        assert_eq!(last_day_with_data(&days), Some(1));

        let page = daily_page(1, 2025, days);
        let info = data_completeness_info(
            Some(UsageData::Daily(&page)),
            PeriodOverride::default(),
            today,
        );
        assert_eq!(info.days_with_data, 1);
        assert_eq!(info.last_data_day, Some(ChartLabel::Day(1)));
    }

    #[test]
    fn full_month_never_flags_other_periods() {
        let today = date(2025, 1, 10);
        for (m, y) in [(12, 2024), (2, 2025), (1, 2024)] {
            let points = generate_full_month_data(None, m, y, today);
            assert!(points
                .iter()
                .all(|p| p.is_future == Some(false) && p.is_today == Some(false)));
        }
    }

    #[test]
    fn completeness_for_monthly_view() {
        let page = MonthlyUsagePage {
            year: 2025,
            units: "kWh".into(),
            months: vec![month("January", "5"), month("February", "6")],
            next: None,
            previous: None,
        };
        let info = data_completeness_info(
            Some(UsageData::Monthly(&page)),
            PeriodOverride::default(),
            date(2025, 2, 20),
        );
        assert_eq!(info.total_days, 12);
        assert_eq!(info.days_with_data, 2);
        assert!(info.is_current_period);
        assert_eq!(info.last_data_day, Some(ChartLabel::Month("February".into())));
    }

    #[test]
    fn completeness_for_daily_view_reports_last_day_index() {
        let page = daily_page(
            2,
            2024,
            vec![day("2024-02-01", "3"), day("2024-02-20", "4")],
        );
        let info = data_completeness_info(
            Some(UsageData::Daily(&page)),
            PeriodOverride::default(),
            date(2024, 2, 21),
        );
        assert_eq!(info.total_days, 29);
        // two records present, last one on the 20th
        assert_eq!(info.days_with_data, 20);
        assert!(info.is_current_period);
        assert_eq!(info.last_data_day, Some(ChartLabel::Day(20)));
    }

    #[test]
    fn daily_override_retargets_the_period() {
        let page = daily_page(2, 2024, vec![]);
        let period = PeriodOverride::new(4, 2023);
        let today = date(2023, 4, 2);

        let points = format_chart_data(Some(UsageData::Daily(&page)), period, today);
        assert_eq!(points.len(), 30);
        assert_eq!(points[1].is_today, Some(true));

        let info = data_completeness_info(Some(UsageData::Daily(&page)), period, today);
        assert_eq!(info.total_days, 30);
        assert_eq!(info.days_with_data, 0);
        assert!(info.is_current_period);
        assert_eq!(info.last_data_day, None);
    }

    #[test]
    fn zero_override_falls_back_to_page_period() {
        let page = daily_page(2, 2023, vec![]);
        let period = PeriodOverride {
            month: Some(0),
            year: None,
        };
        let points = format_chart_data(Some(UsageData::Daily(&page)), period, date(2025, 1, 1));
        assert_eq!(points.len(), 28);
    }

    #[test]
    fn absent_input_yields_empty_output() {
        let today = date(2025, 1, 1);
        assert!(format_chart_data(None, PeriodOverride::default(), today).is_empty());
        assert_eq!(
            data_completeness_info(None, PeriodOverride::default(), today),
            DataCompletenessInfo::default()
        );
    }

    #[test]
    fn usage_view_bundles_points_and_completeness() {
        let page = daily_page(3, 2025, vec![day("2025-03-02", "7.777")]);
        let view = usage_view(
            UsageData::Daily(&page),
            PeriodOverride::default(),
            date(2025, 4, 1),
        );
        assert_eq!(view.mode, ViewMode::Daily);
        assert_eq!(view.units, "kWh");
        assert_eq!(view.points.len(), 31);
        assert_eq!(view.points[1].consumption, 7.78);
        assert!(!view.completeness.is_current_period);
    }
}
