//! Seams to the outside world: the homework API and the chat.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Something that can be asked for homework statuses.
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    /// Fetches homework updated since `from_date` (epoch seconds).
    ///
    /// Fails with `Request` on transport failure, `HttpStatus` on a
    /// non-OK answer, and `Schema` if the body is not JSON.
    async fn fetch(&self, from_date: i64) -> Result<Value>;
}

/// Something that can deliver text to the configured chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one message. Fails with `Notifier` if delivery failed.
    async fn send(&self, text: &str) -> Result<()>;
}

