use crate::api::{AccountApi, UsageApi};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{
    Account, AccountToken, CreatedAccount, DailyUsagePage, FlowLogin, FlowLoginLink,
    FlowLoginRequest, InvoicesPage, LocationDocuments, LocationPlan, MonthlyUsagePage, NewAccount,
    PaymentMethod,
};
use crate::token_cache::TokenCache;
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const FALLBACK_ERROR: &str = "API request failed";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the Light API.
///
/// Account tokens are exchanged with the app secret and kept in the shared
/// [`TokenCache`]; a 401 or 404 from any authenticated call empties it.
pub struct LightClient {
    client: Client,
    api_url: Url,
    secret: String,
    tokens: Arc<TokenCache>,
}

impl LightClient {
    pub fn new(cfg: &AppConfig, secret: String, tokens: Arc<TokenCache>) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_seconds))
            .timeout(Duration::from_secs(cfg.request_timeout_seconds))
            .build()?;
        let api_url = Url::parse(&cfg.api_url)?;
        if api_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "api_url '{}' cannot be used as a base URL",
                cfg.api_url
            )));
        }
        Ok(Self {
            client,
            api_url,
            secret,
            tokens,
        })
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    async fn request_error(response: Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR.to_string());
        AppError::Request {
            status: status.as_u16(),
            message,
        }
    }

    /// Returns a usable token for `account`, exchanging the app secret for a
    /// fresh one when the cache has nothing valid.
    pub async fn account_token(&self, account: &str) -> Result<AccountToken, AppError> {
        self.tokens.clear_if_expired();

        if let (Some(token), Some(expires_at)) =
            (self.tokens.get_token(account), self.tokens.expires_at())
        {
            return Ok(AccountToken { token, expires_at });
        }

        debug!(account, "exchanging app secret for account token");
        let url = self.endpoint(&["app", "accounts", account, "token"]);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.secret)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::request_error(response).await);
        }

        let token: AccountToken = response.json().await?;
        self.tokens.set_token(account, &token.token, token.expires_at);
        debug!(account, expires_at = %token.expires_at, "account token cached");
        Ok(token)
    }

    async fn send_authenticated(
        &self,
        method: Method,
        account: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Response, AppError> {
        let token = self.account_token(account).await?;
        let url = self.endpoint(segments);

        let response = self
            .client
            .request(method, url)
            .bearer_auth(&token.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
                warn!(account, %status, "clearing cached account token");
                self.tokens.clear_token();
            }
            return Err(Self::request_error(response).await);
        }

        Ok(response)
    }

    async fn get_authenticated<T: DeserializeOwned>(
        &self,
        account: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .send_authenticated(Method::GET, account, segments, query)
            .await?;
        Ok(response.json().await?)
    }

    /// POST with the app secret; used for account creation and flow logins.
    async fn post_app<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .post(self.endpoint(segments))
            .bearer_auth(&self.secret)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::request_error(response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn create_account(&self, holder: &NewAccount) -> Result<String, AppError> {
        let created: CreatedAccount = self.post_app(&["app", "accounts"], holder).await?;
        info!(account = %created.uuid, "account created");
        Ok(created.uuid)
    }

    pub async fn create_flow_login(&self, account: &str, scope: &str) -> Result<String, AppError> {
        let login: FlowLoginLink = self
            .post_app(
                &["app", "accounts", account, "flow-login"],
                &FlowLoginRequest {
                    scope: scope.to_string(),
                },
            )
            .await?;
        Ok(login.login_link)
    }

    /// Login link for the hosted onboarding flow. Reuses `account` when
    /// given, otherwise creates a new account for `holder` first.
    pub async fn start_flow(
        &self,
        account: Option<&str>,
        scope: &str,
        holder: &NewAccount,
    ) -> Result<FlowLogin, AppError> {
        let account_uuid = match account {
            Some(existing) => existing.to_string(),
            None => self.create_account(holder).await?,
        };
        debug!(account = %account_uuid, scope, "requesting flow login");
        let flow_login_link = self.create_flow_login(&account_uuid, scope).await?;
        Ok(FlowLogin {
            flow_login_link,
            account_uuid,
        })
    }
}

#[async_trait]
impl UsageApi for LightClient {
    async fn get_monthly_usage(
        &self,
        account: &str,
        location: &str,
        year: i32,
    ) -> Result<MonthlyUsagePage, AppError> {
        self.get_authenticated(
            account,
            &["account", "locations", location, "usage", "monthly"],
            &[("year", year.to_string())],
        )
        .await
    }

    async fn get_daily_usage(
        &self,
        account: &str,
        location: &str,
        month: u32,
        year: i32,
    ) -> Result<DailyUsagePage, AppError> {
        self.get_authenticated(
            account,
            &["account", "locations", location, "usage", "daily"],
            &[("month", month.to_string()), ("year", year.to_string())],
        )
        .await
    }
}

#[async_trait]
impl AccountApi for LightClient {
    async fn get_account(&self, account: &str) -> Result<Account, AppError> {
        self.get_authenticated(account, &["account"], &[]).await
    }

    async fn get_invoices(&self, account: &str) -> Result<InvoicesPage, AppError> {
        self.get_authenticated(account, &["account", "billing", "invoices"], &[])
            .await
    }

    async fn get_location_documents(
        &self,
        account: &str,
        location: &str,
    ) -> Result<LocationDocuments, AppError> {
        self.get_authenticated(account, &["account", "locations", location, "documents"], &[])
            .await
    }

    async fn get_location_plan(
        &self,
        account: &str,
        location: &str,
    ) -> Result<LocationPlan, AppError> {
        self.get_authenticated(account, &["account", "locations", location, "plan"], &[])
            .await
    }

    async fn get_payment_method(&self, account: &str) -> Result<PaymentMethod, AppError> {
        self.get_authenticated(account, &["account", "billing", "payment-method"], &[])
            .await
    }

    async fn delete_enrollment(&self, account: &str) -> Result<(), AppError> {
        self.send_authenticated(
            Method::POST,
            account,
            &["account", "sandbox", "delete-enrollment"],
            &[],
        )
        .await?;
        Ok(())
    }

    async fn seed_demo_data(&self, account: &str) -> Result<(), AppError> {
        self.send_authenticated(
            Method::POST,
            account,
            &["account", "sandbox", "seed-demo-data"],
            &[],
        )
        .await?;
        Ok(())
    }
}
