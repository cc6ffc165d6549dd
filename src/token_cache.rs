//! Single-slot cache for the account bearer token.
//!
//! One instance per process (or per test), handed to whatever issues
//! authenticated requests. The slot holds at most one token; storing a token
//! for another account replaces it. Two requests that both miss will both
//! fetch and the later write wins.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;

pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account_uuid: String,
}

pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
    clock: Arc<dyn Clock>,
    buffer: Duration,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_buffer(clock, Duration::seconds(DEFAULT_EXPIRY_BUFFER_SECS))
    }

    pub fn with_buffer(clock: Arc<dyn Clock>, buffer: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            clock,
            buffer,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<CachedToken>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True when a token for `account_uuid` is cached and more than the
    /// buffer remains before it expires.
    pub fn is_valid(&self, account_uuid: &str) -> bool {
        let now = self.clock.now();
        self.slot()
            .as_ref()
            .is_some_and(|c| c.account_uuid == account_uuid && c.expires_at - now > self.buffer)
    }

    pub fn get_token(&self, account_uuid: &str) -> Option<String> {
        let now = self.clock.now();
        self.slot()
            .as_ref()
            .filter(|c| c.account_uuid == account_uuid && c.expires_at - now > self.buffer)
            .map(|c| c.token.clone())
    }

    pub fn set_token(&self, account_uuid: &str, token: &str, expires_at: DateTime<Utc>) {
        *self.slot() = Some(CachedToken {
            token: token.to_string(),
            expires_at,
            account_uuid: account_uuid.to_string(),
        });
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot().as_ref().map(|c| c.expires_at)
    }

    /// Drops the token once its raw expiry has passed. The buffer is not
    /// applied here.
    pub fn clear_if_expired(&self) {
        let now = self.clock.now();
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|c| c.expires_at <= now) {
            *slot = None;
        }
    }

    pub fn clear_token(&self) {
        *self.slot() = None;
    }
}
