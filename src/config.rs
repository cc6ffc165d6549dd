use crate::error::AppError;
use ::config::{Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SERVICE_NAME: &str = "light-usage";
pub const ENV_PREFIX: &str = "LIGHT_USAGE";
pub const SECRET_ENV: &str = "LIGHT_API_SECRET";
const SECRET_ENTRY: &str = "api-secret";

fn app_home_dir() -> Result<PathBuf, AppError> {
    if let Ok(custom) = std::env::var("LIGHT_USAGE_HOME") {
        return Ok(PathBuf::from(custom));
    }

    if let Some(dirs) = ProjectDirs::from("dev", "light", SERVICE_NAME) {
        let candidate = dirs.data_local_dir().to_path_buf();
        if fs::create_dir_all(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    let cwd = std::env::current_dir()?;
    Ok(cwd.join(".light-usage"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_url: String,
    pub request_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub token_expiry_buffer_seconds: i64,
    pub default_trailing_months: usize,
    pub default_account: Option<String>,
    pub default_location: Option<String>,
    pub default_email: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.light.dev".into(),
            request_timeout_seconds: 30,
            connect_timeout_seconds: 10,
            token_expiry_buffer_seconds: crate::token_cache::DEFAULT_EXPIRY_BUFFER_SECS,
            default_trailing_months: 12,
            default_account: None,
            default_location: None,
            default_email: "example-app@light.dev".into(),
        }
    }
}

pub fn config_dir() -> Result<PathBuf, AppError> {
    Ok(app_home_dir()?.join("config"))
}

pub fn config_path() -> Result<PathBuf, AppError> {
    Ok(config_dir()?.join("config.toml"))
}

fn blank_to_none(value: &mut Option<String>) {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
    }
}

fn normalize_config(config: &mut AppConfig) -> Result<(), AppError> {
    let trimmed = config.api_url.trim().trim_end_matches('/').to_string();
    url::Url::parse(&trimmed)?;
    config.api_url = trimmed;

    blank_to_none(&mut config.default_account);
    blank_to_none(&mut config.default_location);
    config.default_email = config.default_email.trim().to_string();
    if config.default_email.is_empty() {
        return Err(AppError::Config("default_email cannot be empty".into()));
    }

    if config.default_trailing_months == 0 {
        return Err(AppError::Config(
            "default_trailing_months must be at least 1".into(),
        ));
    }
    if config.token_expiry_buffer_seconds < 0 {
        return Err(AppError::Config(
            "token_expiry_buffer_seconds cannot be negative".into(),
        ));
    }
    Ok(())
}

/// Defaults, then `config.toml` if present, then `LIGHT_USAGE_*` variables.
pub fn load_config_from(path: &Path) -> Result<AppConfig, AppError> {
    let settings = ::config::Config::builder()
        .add_source(::config::Config::try_from(&AppConfig::default())?)
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?;

    let mut parsed: AppConfig = settings.try_deserialize()?;
    normalize_config(&mut parsed)?;
    Ok(parsed)
}

pub fn load_config() -> Result<AppConfig, AppError> {
    load_config_from(&config_path()?)
}

pub fn save_config(config: &AppConfig) -> Result<(), AppError> {
    fs::create_dir_all(config_dir()?)?;
    let raw = toml::to_string_pretty(config)?;
    fs::write(config_path()?, raw)?;
    Ok(())
}

pub fn ensure_initialized() -> Result<(), AppError> {
    fs::create_dir_all(config_dir()?)?;
    if !config_path()?.exists() {
        save_config(&AppConfig::default())?;
    }
    Ok(())
}

pub fn set_api_secret(secret: &str) -> Result<(), AppError> {
    let entry = keyring::Entry::new(SERVICE_NAME, SECRET_ENTRY)?;
    entry.set_password(secret)?;
    Ok(())
}

/// App API secret used for the account-token exchange: keyring first, then
/// the `LIGHT_API_SECRET` environment variable.
pub fn get_api_secret() -> Result<String, AppError> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, SECRET_ENTRY) {
        if let Ok(value) = entry.get_password() {
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }

    if let Ok(value) = std::env::var(SECRET_ENV) {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    Err(AppError::Config(format!(
        "No API secret found. Run `light-usage set-secret` or set {SECRET_ENV}."
    )))
}
