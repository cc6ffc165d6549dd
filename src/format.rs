//! Presentation formatting. Values stay numeric until they reach here.

use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

use crate::calendar::parse_local_date;

fn grouped(whole: u64) -> String {
    whole.to_formatted_string(&Locale::en)
}

/// kWh with thousands separators and at most one decimal place.
pub fn format_kwh(kwh: f64) -> String {
    if !kwh.is_finite() {
        return kwh.to_string();
    }
    let tenths = (kwh.abs() * 10.0).round() as u64;
    let sign = if kwh < 0.0 && tenths != 0 { "-" } else { "" };
    let (whole, frac) = (tenths / 10, tenths % 10);
    if frac == 0 {
        format!("{sign}{}", grouped(whole))
    } else {
        format!("{sign}{}.{frac}", grouped(whole))
    }
}

pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", grouped(abs / 100), abs % 100)
}

pub fn format_rate(cents_per_kwh: f64) -> String {
    format!("{cents_per_kwh:.1}¢/kWh")
}

pub fn format_card_brand(brand: &str) -> String {
    let mut chars = brand.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn format_card_expiry(month: u32, year: i32) -> String {
    format!("{month:02}/{:02}", year.rem_euclid(100))
}

/// "January 15, 2025"
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Long form of an API date string; unparseable input is returned as-is.
pub fn format_date_long(raw: &str) -> String {
    raw.get(..10)
        .and_then(parse_local_date)
        .map(format_display_date)
        .unwrap_or_else(|| raw.to_string())
}
