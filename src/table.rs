use comfy_table::Table;

use crate::calendar::{month_name, parse_month_label};
use crate::format::{format_currency, format_date_long, format_kwh, format_rate};
use crate::models::{
    ChartDataPoint, DataCompletenessInfo, Invoice, MonthlyUsageRecord, MonthlyUsageSummary,
    UsageView, ViewMode,
};

const PRESET: &str = "││──╞═╪╡│─┼├┤┬┴┌┐└┘";

fn table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(PRESET);
    table.set_header(headers);
    table
}

fn month_label(record: &MonthlyUsageRecord) -> String {
    match parse_month_label(&record.month, 0) {
        Some((year, month)) if record.month.contains('-') => month_name(month)
            .map(|name| format!("{name} {year}"))
            .unwrap_or_else(|| record.month.clone()),
        _ => record.month.clone(),
    }
}

fn kwh_cell(value: Option<f64>) -> String {
    value.map(format_kwh).unwrap_or_else(|| "-".into())
}

pub fn build_summary_row(record: &MonthlyUsageRecord) -> Vec<String> {
    vec![
        month_label(record),
        kwh_cell(record.consumption),
        kwh_cell(record.generation),
        kwh_cell(record.vehicle_charging),
    ]
}

pub fn build_point_row(point: &ChartDataPoint) -> Vec<String> {
    let mut flags = Vec::new();
    if point.is_partial == Some(true) {
        flags.push("partial");
    }
    if point.is_today == Some(true) {
        flags.push("today");
    }
    if point.is_future == Some(true) {
        flags.push("future");
    }
    if point.has_data == Some(false) && point.is_future != Some(true) {
        flags.push("no data");
    }
    vec![point.day.to_string(), format_kwh(point.consumption), flags.join(", ")]
}

pub fn build_invoice_row(invoice: &Invoice) -> Vec<String> {
    let status = if invoice.voided_at.is_some() {
        "void"
    } else if invoice.paid_at.is_some() {
        "paid"
    } else {
        "due"
    };
    vec![
        invoice.number.clone(),
        format!(
            "{} - {}",
            format_date_long(&invoice.billing_period_start),
            format_date_long(&invoice.billing_period_end)
        ),
        format_currency(invoice.total_cents),
        invoice
            .total_kwh
            .parse::<f64>()
            .map(format_kwh)
            .unwrap_or_else(|_| invoice.total_kwh.clone()),
        invoice
            .avg_cents_per_kwh
            .parse::<f64>()
            .map(format_rate)
            .unwrap_or_else(|_| invoice.avg_cents_per_kwh.clone()),
        format_date_long(&invoice.payment_due_date),
        status.to_string(),
    ]
}

pub fn completeness_line(mode: ViewMode, info: &DataCompletenessInfo) -> String {
    let period = match mode {
        ViewMode::Monthly => "months",
        ViewMode::Daily => "days",
    };
    let mut line = format!("{} of {} {period} covered", info.days_with_data, info.total_days);
    if let Some(last) = &info.last_data_day {
        line.push_str(&format!(", last data: {last}"));
    }
    if info.is_current_period {
        line.push_str(" (period in progress)");
    }
    line
}

pub fn summary_table(summary: &MonthlyUsageSummary) -> Table {
    let consumption = format!("Consumption ({})", summary.units);
    let mut t = table(vec![
        "Month",
        consumption.as_str(),
        "Generation",
        "EV charging",
    ]);
    for record in &summary.months {
        t.add_row(build_summary_row(record));
    }
    t
}

pub fn view_table(view: &UsageView) -> Table {
    let first = match view.mode {
        ViewMode::Monthly => "Month",
        ViewMode::Daily => "Day",
    };
    let consumption = format!("Consumption ({})", view.units);
    let mut t = table(vec![first, consumption.as_str(), "Notes"]);
    for point in &view.points {
        t.add_row(build_point_row(point));
    }
    t
}

pub fn invoices_table(invoices: &[Invoice]) -> Table {
    let mut t = table(vec![
        "Invoice", "Period", "Total", "kWh", "Avg rate", "Due", "Status",
    ]);
    for invoice in invoices {
        t.add_row(build_invoice_row(invoice));
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChartLabel;

    fn record(label: &str, consumption: Option<f64>) -> MonthlyUsageRecord {
        MonthlyUsageRecord {
            month: label.into(),
            consumption,
            generation: Some(0.0),
            vehicle_charging: Some(12.0),
            eligible_vehicle_charging: Some(0.0),
        }
    }

    #[test]
    fn summary_row_spells_out_encoded_months() {
        assert_eq!(
            build_summary_row(&record("2023-10", Some(1523.44))),
            vec!["October 2023", "1,523.4", "0", "12"]
        );
        let row = build_summary_row(&record("March", None));
        assert_eq!(row[0], "March");
        assert_eq!(row[1], "-");
    }

    #[test]
    fn point_row_lists_flags() {
        let point = ChartDataPoint {
            day: ChartLabel::Day(14),
            consumption: 0.0,
            is_partial: None,
            is_future: Some(false),
            is_today: Some(true),
            has_data: Some(false),
        };
        assert_eq!(build_point_row(&point), vec!["14", "0", "today, no data"]);
    }

    #[test]
    fn invoice_row_formats_money_and_status() {
        let invoice = Invoice {
            number: "INV-7".into(),
            invoice_date: "2025-02-01".into(),
            payment_due_date: "2025-02-15".into(),
            billing_period_start: "2025-01-01".into(),
            billing_period_end: "2025-01-31".into(),
            total_cents: 12_345,
            total: "123.45".into(),
            total_kwh: "987.66".into(),
            avg_cents_per_kwh: "12.5".into(),
            pdf: None,
            paid_at: Some("2025-02-10".into()),
            voided_at: None,
        };
        let row = build_invoice_row(&invoice);
        assert_eq!(row[2], "$123.45");
        assert_eq!(row[3], "987.7");
        assert_eq!(row[4], "12.5¢/kWh");
        assert_eq!(row[5], "February 15, 2025");
        assert_eq!(row[6], "paid");
    }

    #[test]
    fn completeness_line_mentions_progress() {
        let info = DataCompletenessInfo {
            total_days: 31,
            days_with_data: 9,
            is_current_period: true,
            last_data_day: Some(ChartLabel::Day(9)),
        };
        assert_eq!(
            completeness_line(ViewMode::Daily, &info),
            "9 of 31 days covered, last data: 9 (period in progress)"
        );
    }
}
