use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("request failed with HTTP status {status}: {message}")]
    Request { status: u16, message: String },

    #[error("malformed value: {0}")]
    MalformedRecord(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Keyring(#[from] keyring::Error),

    #[error(transparent)]
    Settings(#[from] ::config::ConfigError),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl AppError {
    /// True for responses that mean the account or its token is no longer usable.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::Request { status: 401 | 404, .. })
    }
}
