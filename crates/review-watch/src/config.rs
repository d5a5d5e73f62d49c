//! Configuration types for review-watch.
//!
//! The watcher needs exactly three secrets, read from the environment, plus
//! a handful of tunables with sensible defaults. Everything is collected
//! into one immutable [`Config`] value before the poll loop starts.

use std::fmt;
use std::time::Duration;

use crate::error::{Result, WatchError};

/// Environment variable holding the homework API token.
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Environment variable holding the bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the target chat id.
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Default homework status endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Default pause between polling cycles in seconds.
pub const DEFAULT_RETRY_PERIOD_SECS: u64 = 600;

/// Default timeout for a single HTTP request in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credential values as found in the environment, before validation.
///
/// Unset and blank values are both treated as missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvCredentials {
    /// Value of `PRACTICUM_TOKEN`, if set and non-blank.
    pub practicum_token: Option<String>,
    /// Value of `TELEGRAM_TOKEN`, if set and non-blank.
    pub telegram_token: Option<String>,
    /// Value of `TELEGRAM_CHAT_ID`, if set and non-blank.
    pub telegram_chat_id: Option<String>,
}

impl EnvCredentials {
    /// Reads the credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the credentials through an arbitrary lookup function.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_watch::EnvCredentials;
    ///
    /// let creds = EnvCredentials::from_lookup(|name| match name {
    ///     "PRACTICUM_TOKEN" => Some("y0_abc".to_string()),
    ///     "TELEGRAM_TOKEN" => Some("   ".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(creds.missing(), vec!["TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"]);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            practicum_token: read(PRACTICUM_TOKEN_VAR),
            telegram_token: read(TELEGRAM_TOKEN_VAR),
            telegram_chat_id: read(TELEGRAM_CHAT_ID_VAR),
        }
    }

    /// Returns the names of every missing variable.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (PRACTICUM_TOKEN_VAR, &self.practicum_token),
            (TELEGRAM_TOKEN_VAR, &self.telegram_token),
            (TELEGRAM_CHAT_ID_VAR, &self.telegram_chat_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.is_none().then_some(name))
        .collect()
    }

    /// Returns the bot token and chat id when both are available.
    ///
    /// Used to report a startup failure even when the homework token is
    /// the one that is missing.
    pub fn chat_target(&self) -> Option<(&str, &str)> {
        match (&self.telegram_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some((token.as_str(), chat_id.as_str())),
            _ => None,
        }
    }

    /// Validates that every credential is present.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::MissingCredentials` naming every missing
    /// variable, not just the first one.
    pub fn check(self) -> Result<Credentials> {
        match (self.practicum_token, self.telegram_token, self.telegram_chat_id) {
            (Some(practicum_token), Some(telegram_token), Some(telegram_chat_id)) => {
                Ok(Credentials {
                    practicum_token,
                    telegram_token,
                    telegram_chat_id,
                })
            }
            (practicum_token, telegram_token, telegram_chat_id) => {
                let partial = Self {
                    practicum_token,
                    telegram_token,
                    telegram_chat_id,
                };
                Err(WatchError::missing_credentials(partial.missing()))
            }
        }
    }
}

impl fmt::Debug for EnvCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentials")
            .field("practicum_token", &self.practicum_token.as_ref().map(|_| "***"))
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "***"))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

/// Validated credentials. All three values are non-blank.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    practicum_token: String,
    telegram_token: String,
    telegram_chat_id: String,
}

impl Credentials {
    /// Builds credentials directly, checking them the same way as the
    /// environment loader.
    pub fn new(
        practicum_token: impl Into<String>,
        telegram_token: impl Into<String>,
        telegram_chat_id: impl Into<String>,
    ) -> Result<Self> {
        let practicum_token = practicum_token.into();
        let telegram_token = telegram_token.into();
        let telegram_chat_id = telegram_chat_id.into();
        EnvCredentials::from_lookup(|name| match name {
            PRACTICUM_TOKEN_VAR => Some(practicum_token.clone()),
            TELEGRAM_TOKEN_VAR => Some(telegram_token.clone()),
            TELEGRAM_CHAT_ID_VAR => Some(telegram_chat_id.clone()),
            _ => None,
        })
        .check()
    }

    /// Token for the homework API.
    pub fn practicum_token(&self) -> &str {
        &self.practicum_token
    }

    /// Token for the bot API.
    pub fn telegram_token(&self) -> &str {
        &self.telegram_token
    }

    /// Chat that receives every notification.
    pub fn telegram_chat_id(&self) -> &str {
        &self.telegram_chat_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"***")
            .field("telegram_token", &"***")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

/// Complete watcher configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Validated secrets.
    pub credentials: Credentials,

    /// Homework status endpoint.
    pub endpoint: String,

    /// Base URL of the Telegram Bot API.
    pub telegram_api: String,

    /// Pause between polling cycles.
    pub retry_period: Duration,

    /// Timeout applied to every outgoing HTTP request.
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a configuration with default endpoints and timings.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            telegram_api: DEFAULT_TELEGRAM_API.to_string(),
            retry_period: Duration::from_secs(DEFAULT_RETRY_PERIOD_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Overrides the homework endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the bot API base URL.
    #[must_use]
    pub fn with_telegram_api(mut self, telegram_api: impl Into<String>) -> Self {
        self.telegram_api = telegram_api.into();
        self
    }

    /// Overrides the pause between cycles.
    #[must_use]
    pub const fn with_retry_period(mut self, retry_period: Duration) -> Self {
        self.retry_period = retry_period;
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Validates the configuration values.
    ///
    /// - `endpoint` and `telegram_api` must be `http(s)` URLs
    /// - `retry_period` and `request_timeout` must be non-zero
    ///
    /// # Errors
    ///
    /// Returns `WatchError::InvalidConfig` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if !is_http_url(&self.endpoint) {
            return Err(WatchError::invalid_config(
                format!("endpoint '{}' is not an http(s) URL", self.endpoint),
                "Set REVIEW_WATCH_ENDPOINT or --endpoint to a full URL",
            ));
        }

        if !is_http_url(&self.telegram_api) {
            return Err(WatchError::invalid_config(
                format!("telegram API '{}' is not an http(s) URL", self.telegram_api),
                "Set REVIEW_WATCH_TELEGRAM_API or --telegram-api to a full URL",
            ));
        }

        if self.retry_period.is_zero() {
            return Err(WatchError::invalid_config(
                "retry period must be greater than 0",
                "Set REVIEW_WATCH_RETRY_PERIOD or --retry-period to at least 1 second",
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(WatchError::invalid_config(
                "request timeout must be greater than 0",
                "Set REVIEW_WATCH_REQUEST_TIMEOUT or --request-timeout to at least 1 second",
            ));
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}
