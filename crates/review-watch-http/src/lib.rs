//! review-watch HTTP clients
//!
//! reqwest-backed implementations of the [`HomeworkSource`] and
//! [`Notifier`] seams: [`PracticumClient`] talks to the homework status
//! API, [`TelegramNotifier`] posts to the Telegram Bot API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use review_watch::{Config, HomeworkSource, Notifier, Result, WatchError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder().timeout(timeout).build().map_err(|e| {
        WatchError::invalid_config(
            format!("failed to build HTTP client: {e}"),
            "Check the TLS setup of this machine",
        )
    })
}

// ============================================================================
// PracticumClient
// ============================================================================

/// Client for the homework status endpoint.
///
/// Sends `GET <endpoint>?from_date=<epoch>` with an `OAuth` authorization
/// header and returns the decoded JSON body.
#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    /// Creates a client for `endpoint` with a per-request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    /// Creates a client from the watcher configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.endpoint.as_str(),
            config.credentials.practicum_token(),
            config.request_timeout,
        )
    }

    /// The endpoint this client polls.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HomeworkSource for PracticumClient {
    #[instrument(skip(self))]
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        debug!(endpoint = %self.endpoint, "Requesting homework statuses");

        let response = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| WatchError::request(&self.endpoint, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WatchError::http_status(&self.endpoint, status.as_u16()));
        }
        debug!("Homework API answered 200 OK");

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                WatchError::schema(format!("response body is not valid JSON: {e}"))
            } else {
                WatchError::request(&self.endpoint, e.to_string())
            }
        })
    }
}

// ============================================================================
// TelegramNotifier
// ============================================================================

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages to one chat through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    send_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a notifier posting to `<api_base>/bot<token>/sendMessage`.
    pub fn new(
        api_base: &str,
        token: &str,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            send_url: format!("{}/bot{token}/sendMessage", api_base.trim_end_matches('/')),
            chat_id: chat_id.into(),
        })
    }

    /// Creates a notifier from the watcher configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.telegram_api,
            config.credentials.telegram_token(),
            config.credentials.telegram_chat_id(),
            config.request_timeout,
        )
    }

    /// The chat every message goes to.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn send(&self, text: &str) -> Result<()> {
        debug!(chat_id = %self.chat_id, "Sending chat message");

        // The bot token is part of the URL, so it is stripped from errors.
        let response = self
            .http
            .post(&self.send_url)
            .json(&SendMessageRequest {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .map_err(|e| WatchError::notifier(e.without_url().to_string()))?;

        let status = response.status();
        let body = response.json::<BotApiResponse>().await.ok();

        match body {
            Some(BotApiResponse { ok: true, .. }) if status.is_success() => {
                debug!("Chat message delivered");
                Ok(())
            }
            Some(BotApiResponse { description, .. }) => Err(WatchError::notifier(format!(
                "HTTP {}: {}",
                status.as_u16(),
                description.as_deref().unwrap_or("request rejected")
            ))),
            None => Err(WatchError::notifier(format!(
                "HTTP {}: unreadable bot API response",
                status.as_u16()
            ))),
        }
    }
}
