use crate::error::AppError;
use crate::models::{
    Account, DailyUsagePage, InvoicesPage, LocationDocuments, LocationPlan, MonthlyUsagePage,
    PaymentMethod,
};
use async_trait::async_trait;

pub mod light;

/// Usage history for one account location, one page per request.
#[async_trait]
pub trait UsageApi: Send + Sync {
    async fn get_monthly_usage(
        &self,
        account: &str,
        location: &str,
        year: i32,
    ) -> Result<MonthlyUsagePage, AppError>;

    async fn get_daily_usage(
        &self,
        account: &str,
        location: &str,
        month: u32,
        year: i32,
    ) -> Result<DailyUsagePage, AppError>;
}

/// Account-level resources behind the same bearer token as usage.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn get_account(&self, account: &str) -> Result<Account, AppError>;

    async fn get_invoices(&self, account: &str) -> Result<InvoicesPage, AppError>;

    async fn get_location_documents(
        &self,
        account: &str,
        location: &str,
    ) -> Result<LocationDocuments, AppError>;

    async fn get_location_plan(
        &self,
        account: &str,
        location: &str,
    ) -> Result<LocationPlan, AppError>;

    async fn get_payment_method(&self, account: &str) -> Result<PaymentMethod, AppError>;

    /// Sandbox only: drops the account's enrollment so the flow can be rerun.
    async fn delete_enrollment(&self, account: &str) -> Result<(), AppError>;

    /// Sandbox only: fills the account with sample usage and billing data.
    async fn seed_demo_data(&self, account: &str) -> Result<(), AppError>;
}
