use chrono::{Datelike, Duration};
use clap::{Parser, Subcommand};
use light_usage::config::{
    ensure_initialized, get_api_secret, load_config, set_api_secret, AppConfig,
};
use light_usage::format::{format_card_brand, format_card_expiry, format_date_long};
use light_usage::models::NewAccount;
use light_usage::table::{completeness_line, invoices_table, summary_table, view_table};
use light_usage::{
    AccountApi, AppError, Clock, LightClient, SystemClock, TokenCache, UsageService,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "light-usage")]
#[command(about = "Energy usage, billing and account views over the Light API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init,
    SetSecret {
        #[arg(long)]
        secret: String,
    },
    Trailing {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        months: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    Monthly {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        json: bool,
    },
    Daily {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        json: bool,
    },
    Account {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Billing {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Documents {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Flow {
        #[arg(long)]
        scope: String,
        #[arg(long)]
        account: Option<String>,
        #[arg(long, default_value = "John")]
        first_name: String,
        #[arg(long, default_value = "Doe")]
        last_name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Demo {
        #[command(subcommand)]
        action: DemoAction,
    },
}

#[derive(Debug, Subcommand)]
enum DemoAction {
    /// Fill the sandbox account with sample usage and bills.
    Seed {
        #[arg(long)]
        account: Option<String>,
    },
    /// Delete the sandbox enrollment so onboarding can start over.
    Reset {
        #[arg(long)]
        account: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("light_usage=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_month(month: u32) -> Result<u32, AppError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(AppError::MalformedRecord(
            "Month must be between 1 and 12.".into(),
        ))
    }
}

fn validate_months(months: usize) -> Result<usize, AppError> {
    if months == 0 {
        return Err(AppError::MalformedRecord("Months must be at least 1.".into()));
    }
    Ok(months)
}

fn validate_scope(scope: &str) -> Result<&str, AppError> {
    let scope = scope.trim();
    if scope.is_empty() {
        return Err(AppError::MalformedRecord("Scope cannot be empty.".into()));
    }
    Ok(scope)
}

fn auth_hint(err: &AppError) -> Option<&'static str> {
    err.is_auth_failure().then_some(
        "The Light API rejected the account. Check the account id and the API secret; \
         the cached account token has been discarded.",
    )
}

fn resolve_id(arg: Option<String>, fallback: &Option<String>, what: &str) -> Result<String, AppError> {
    arg.filter(|v| !v.trim().is_empty())
        .or_else(|| fallback.clone())
        .ok_or_else(|| {
            AppError::Config(format!(
                "No {what} given. Pass --{what} or set default_{what} in config."
            ))
        })
}

fn build_client(cfg: &AppConfig, clock: Arc<dyn Clock>) -> Result<LightClient, AppError> {
    let secret = get_api_secret()?;
    let tokens = Arc::new(TokenCache::with_buffer(
        clock,
        Duration::seconds(cfg.token_expiry_buffer_seconds),
    ));
    LightClient::new(cfg, secret, tokens)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_tracing();
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Some(hint) = result.as_ref().err().and_then(auth_hint) {
        warn!("{hint}");
    }
    result
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Commands::Init => {
            ensure_initialized()?;
            println!("Initialized light-usage config directory.");
        }
        Commands::SetSecret { secret } => {
            ensure_initialized()?;
            set_api_secret(&secret)?;
            println!("API secret stored.");
        }
        Commands::Trailing {
            account,
            location,
            months,
            json,
        } => {
            let cfg = load_config()?;
            let account = resolve_id(account, &cfg.default_account, "account")?;
            let location = resolve_id(location, &cfg.default_location, "location")?;
            let months = validate_months(months.unwrap_or(cfg.default_trailing_months))?;

            let svc = UsageService::new(build_client(&cfg, clock.clone())?, clock);
            let summary = svc
                .trailing_n_months_summary(&account, &location, months)
                .await?;
            info!(months = summary.months.len(), "trailing summary ready");

            if json {
                print_json(&summary)?;
            } else {
                println!("{}", summary_table(&summary));
                println!("Units: {}", summary.units);
            }
        }
        Commands::Monthly {
            account,
            location,
            year,
            json,
        } => {
            let cfg = load_config()?;
            let account = resolve_id(account, &cfg.default_account, "account")?;
            let location = resolve_id(location, &cfg.default_location, "location")?;
            let year = year.unwrap_or_else(|| clock.today().year());

            let svc = UsageService::new(build_client(&cfg, clock.clone())?, clock);
            let view = svc.monthly_view(&account, &location, year).await?;

            if json {
                print_json(&view)?;
            } else {
                println!("{}", view_table(&view));
                println!("{}", completeness_line(view.mode, &view.completeness));
            }
        }
        Commands::Daily {
            account,
            location,
            month,
            year,
            json,
        } => {
            let month = validate_month(month)?;
            let cfg = load_config()?;
            let account = resolve_id(account, &cfg.default_account, "account")?;
            let location = resolve_id(location, &cfg.default_location, "location")?;

            let svc = UsageService::new(build_client(&cfg, clock.clone())?, clock);
            let view = svc.daily_view(&account, &location, month, year).await?;

            if json {
                print_json(&view)?;
            } else {
                println!("{}", view_table(&view));
                println!("{}", completeness_line(view.mode, &view.completeness));
            }
        }
        Commands::Account { account, json } => {
            let cfg = load_config()?;
            let account = resolve_id(account, &cfg.default_account, "account")?;
            let client = build_client(&cfg, clock)?;
            let details = client.get_account(&account).await?;

            if json {
                print_json(&details)?;
            } else {
                println!(
                    "{} {} <{}>",
                    details.first_name, details.last_name, details.email
                );
                println!("Created: {}", format_date_long(&details.created_at));
                println!(
                    "Enrollment: {}",
                    if details.is_enrolled() { "finalized" } else { "in progress" }
                );
                for loc in &details.locations {
                    println!(
                        "  {}  {}, {} {}  service {}{}",
                        loc.uuid,
                        loc.address_1,
                        loc.city,
                        loc.state,
                        if loc.is_service_active { "active" } else { "inactive" },
                        loc.plan_name
                            .as_deref()
                            .map(|p| format!(", plan {p}"))
                            .unwrap_or_default()
                    );
                }
            }
        }
        Commands::Billing { account, json } => {
            let cfg = load_config()?;
            let account = resolve_id(account, &cfg.default_account, "account")?;
            let client = build_client(&cfg, clock)?;
            let invoices = client.get_invoices(&account).await?;
            let payment = client.get_payment_method(&account).await?;

            if json {
                print_json(&serde_json::json!({
                    "invoices": invoices,
                    "payment_method": payment,
                }))?;
            } else {
                println!("{}", invoices_table(&invoices.data));
                println!(
                    "Payment method: {} ending {} (exp {})",
                    format_card_brand(&payment.card_brand),
                    payment.card_last4,
                    format_card_expiry(payment.card_exp_month, payment.card_exp_year)
                );
            }
        }
        Commands::Documents {
            account,
            location,
            json,
        } => {
            let cfg = load_config()?;
            let account = resolve_id(account, &cfg.default_account, "account")?;
            let location = resolve_id(location, &cfg.default_location, "location")?;
            let client = build_client(&cfg, clock)?;
            let plan = client.get_location_plan(&account, &location).await?;
            let docs = client.get_location_documents(&account, &location).await?;

            if json {
                print_json(&serde_json::json!({
                    "plan": plan,
                    "documents": docs,
                }))?;
            } else {
                println!(
                    "Plan: {} ({}, {})",
                    plan.name, plan.plan_type, plan.rate_structure
                );
                println!(
                    "Contract: {} to {}",
                    format_date_long(&docs.contract_start),
                    format_date_long(&docs.contract_end)
                );
                println!("Electricity Facts Label: {}", docs.efl);
                println!("Terms of Service: {}", docs.tos);
                println!("Your Rights as a Customer: {}", docs.yrac);
            }
        }
        Commands::Flow {
            scope,
            account,
            first_name,
            last_name,
            email,
            json,
        } => {
            let scope = validate_scope(&scope)?.to_string();
            let cfg = load_config()?;
            let account = account
                .filter(|v| !v.trim().is_empty())
                .or_else(|| cfg.default_account.clone());
            let holder = NewAccount {
                first_name,
                last_name,
                email: email.unwrap_or_else(|| cfg.default_email.clone()),
            };
            let client = build_client(&cfg, clock)?;
            let flow = client
                .start_flow(account.as_deref(), &scope, &holder)
                .await?;

            if json {
                print_json(&flow)?;
            } else {
                println!("Account: {}", flow.account_uuid);
                println!("Login link: {}", flow.flow_login_link);
            }
        }
        Commands::Demo { action } => {
            let cfg = load_config()?;
            match action {
                DemoAction::Seed { account } => {
                    let account = resolve_id(account, &cfg.default_account, "account")?;
                    build_client(&cfg, clock)?.seed_demo_data(&account).await?;
                    println!("Demo data seeded for {account}.");
                }
                DemoAction::Reset { account } => {
                    let account = resolve_id(account, &cfg.default_account, "account")?;
                    build_client(&cfg, clock)?
                        .delete_enrollment(&account)
                        .await?;
                    println!("Enrollment deleted for {account}.");
                }
            }
        }
    }

    Ok(())
}
