pub mod api;
pub mod calendar;
pub mod chart;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod service;
pub mod table;
pub mod token_cache;

pub use api::light::LightClient;
pub use api::{AccountApi, UsageApi};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AppError;
pub use service::UsageService;
pub use token_cache::TokenCache;
