//! review-watch core
//!
//! Polls a homework-review API and relays status changes to one chat.

pub mod config;
pub mod error;
pub mod poll_state;
pub mod response;
pub mod source;
pub mod verdict;
pub mod watcher;

pub use config::{
    Config, Credentials, EnvCredentials, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_PERIOD_SECS, DEFAULT_TELEGRAM_API, PRACTICUM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR,
    TELEGRAM_TOKEN_VAR,
};
pub use error::{FailureKind, Result, WatchError};
pub use poll_state::{CycleOutcome, PollState, WatcherStatus};
pub use response::check_response;
pub use source::{HomeworkSource, Notifier};
pub use verdict::{parse_status, Verdict};
pub use watcher::{failure_message, Watcher};
