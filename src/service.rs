use crate::api::UsageApi;
use crate::chart::{usage_view, PeriodOverride, UsageData};
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::{MonthlyUsagePage, MonthlyUsageSummary, UsageView};
use chrono::Datelike;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_UNITS: &str = "kWh";

/// Fetch-then-normalize entry points over a [`UsageApi`].
pub struct UsageService<A> {
    api: A,
    clock: Arc<dyn Clock>,
}

impl<A: UsageApi> UsageService<A> {
    pub fn new(api: A, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    /// The most recent `n` months of usage, oldest first.
    ///
    /// Walks backwards one year per request, starting at the current year,
    /// until at least `n` months are collected or a page stops advertising
    /// an earlier year. Any failed request fails the whole call.
    pub async fn trailing_n_months_summary(
        &self,
        account: &str,
        location: &str,
        n: usize,
    ) -> Result<MonthlyUsageSummary, AppError> {
        if n == 0 {
            return Ok(MonthlyUsageSummary {
                units: DEFAULT_UNITS.to_string(),
                months: vec![],
            });
        }

        let current_year = self.clock.today().year();
        debug!(account, location, year = current_year, "fetching monthly usage");
        let mut pages: Vec<MonthlyUsagePage> = vec![
            self.api
                .get_monthly_usage(account, location, current_year)
                .await?,
        ];
        let mut collected = pages[0].months.len();

        while collected < n {
            let Some(last) = pages.last() else { break };
            if !last.has_previous() {
                debug!(year = last.year, collected, n, "no earlier usage history");
                break;
            }
            let year = last.year - 1;
            debug!(account, location, year, "fetching monthly usage");
            let page = self.api.get_monthly_usage(account, location, year).await?;
            collected += page.months.len();
            pages.push(page);
        }

        pages.reverse();
        let units = pages
            .first()
            .map(|p| p.units.clone())
            .unwrap_or_else(|| DEFAULT_UNITS.to_string());

        let mut months: Vec<_> = pages.into_iter().flat_map(|p| p.months).collect();
        if months.len() > n {
            months.drain(..months.len() - n);
        }
        debug!(months = months.len(), n, "trailing window assembled");

        Ok(MonthlyUsageSummary { units, months })
    }

    pub async fn monthly_view(
        &self,
        account: &str,
        location: &str,
        year: i32,
    ) -> Result<UsageView, AppError> {
        debug!(account, location, year, "fetching monthly usage");
        let page = self.api.get_monthly_usage(account, location, year).await?;
        Ok(usage_view(
            UsageData::Monthly(&page),
            PeriodOverride::default(),
            self.clock.today(),
        ))
    }

    pub async fn daily_view(
        &self,
        account: &str,
        location: &str,
        month: u32,
        year: i32,
    ) -> Result<UsageView, AppError> {
        debug!(account, location, month, year, "fetching daily usage");
        let page = self
            .api
            .get_daily_usage(account, location, month, year)
            .await?;
        Ok(usage_view(
            UsageData::Daily(&page),
            PeriodOverride::new(month, year),
            self.clock.today(),
        ))
    }
}
