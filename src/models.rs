use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::parse_local_date;

/// Serde adapter for the API's decimal-string fields.
///
/// Accepts a string or a number. Missing, null and empty values read as zero;
/// anything that does not parse as a finite number reads as `None`.
pub mod decimal_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn zero() -> Option<f64> {
        Some(0.0)
    }

    pub fn parse(raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(0.0);
        }
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn deserialize<'de, D>(de: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(de)? {
            None => Some(0.0),
            Some(Raw::Number(n)) => Some(n).filter(|v| v.is_finite()),
            Some(Raw::Text(s)) => parse(&s),
        })
    }

    pub fn serialize<S>(value: &Option<f64>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => ser.serialize_str(&v.to_string()),
            None => ser.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUsageRecord {
    /// Either a month name ("January") or "YYYY-MM".
    pub month: String,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub consumption: Option<f64>,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub generation: Option<f64>,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub vehicle_charging: Option<f64>,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub eligible_vehicle_charging: Option<f64>,
}

impl MonthlyUsageRecord {
    /// A labelled record with a non-negative, well-formed consumption.
    pub fn has_data(&self) -> bool {
        !self.month.is_empty() && self.consumption.is_some_and(|c| c >= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUsagePage {
    pub year: i32,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub months: Vec<MonthlyUsageRecord>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl MonthlyUsagePage {
    /// Whether the API advertises an earlier year with data.
    pub fn has_previous(&self) -> bool {
        self.previous.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUsageSummary {
    pub units: String,
    pub months: Vec<MonthlyUsageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsageRecord {
    /// "YYYY-MM-DD"
    pub date: String,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub consumption: Option<f64>,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub generation: Option<f64>,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub vehicle_charging: Option<f64>,
    #[serde(default = "decimal_string::zero", with = "decimal_string")]
    pub eligible_vehicle_charging: Option<f64>,
}

impl DailyUsageRecord {
    pub fn local_date(&self) -> Option<NaiveDate> {
        parse_local_date(&self.date)
    }

    pub fn has_data(&self) -> bool {
        self.local_date().is_some() && self.consumption.is_some_and(|c| c >= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsagePage {
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub days: Vec<DailyUsageRecord>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// X-axis label of a chart point: a month name in the monthly view, a
/// day-of-month in the daily view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartLabel {
    Day(u32),
    Month(String),
}

impl std::fmt::Display for ChartLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartLabel::Day(d) => write!(f, "{d}"),
            ChartLabel::Month(m) => f.write_str(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub day: ChartLabel,
    pub consumption: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_partial: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_future: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_today: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_data: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataCompletenessInfo {
    pub total_days: u32,
    pub days_with_data: u32,
    pub is_current_period: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_data_day: Option<ChartLabel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Monthly,
    Daily,
}

impl ViewMode {
    pub fn as_label(self) -> &'static str {
        match self {
            ViewMode::Monthly => "monthly",
            ViewMode::Daily => "daily",
        }
    }
}

/// Normalized chart series plus its completeness summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageView {
    pub mode: ViewMode,
    pub units: String,
    pub points: Vec<ChartDataPoint>,
    pub completeness: DataCompletenessInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Holder details sent when creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub uuid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowLoginRequest {
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowLoginLink {
    pub login_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLogin {
    pub flow_login_link: String,
    pub account_uuid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub has_accepted_plan: bool,
    pub has_payment_method: bool,
    pub is_billing_address_confirmed: bool,
    pub is_identity_verified: bool,
    pub is_enrollment_finalized: bool,
    pub is_service_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub uuid: String,
    pub address_1: String,
    #[serde(default)]
    pub address_2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub utility_number: String,
    pub service_start_date: String,
    #[serde(default)]
    pub final_service_date: Option<String>,
    pub is_service_active: bool,
    pub has_usage_history: bool,
    #[serde(default)]
    pub estimated_next_reading_date: Option<String>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub plan_uuid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub uuid: String,
    #[serde(default)]
    pub account_number: Option<String>,
    pub created_at: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub enrollment: Option<Enrollment>,
    pub app: AppInfo,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl Account {
    pub fn is_enrolled(&self) -> bool {
        self.enrollment
            .as_ref()
            .is_some_and(|e| e.is_enrollment_finalized)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub number: String,
    pub invoice_date: String,
    pub payment_due_date: String,
    pub billing_period_start: String,
    pub billing_period_end: String,
    pub total_cents: i64,
    pub total: String,
    pub total_kwh: String,
    pub avg_cents_per_kwh: String,
    #[serde(default)]
    pub pdf: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub voided_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicesPage {
    pub data: Vec<Invoice>,
    pub has_more: bool,
    pub limit: u32,
    pub offset: u32,
    #[serde(default)]
    pub next_page_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDocuments {
    pub efl: String,
    pub tos: String,
    pub yrac: String,
    pub contract_start: String,
    pub contract_end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPlan {
    pub name: String,
    pub uuid: String,
    pub plan_type: String,
    pub rate_structure: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub card_brand: String,
    pub card_last4: String,
    pub card_exp_month: u32,
    pub card_exp_year: i32,
    pub card_postal_code: String,
}
