//! The poll loop.
//!
//! Each cycle asks the homework API for updates since the cursor, checks
//! the response shape, compares the newest status against the last one
//! delivered, and sends a chat message only on a transition. Failures are
//! reported to the chat once per distinct message. The loop then sleeps
//! for the retry period and starts over; it never exits by itself.

use std::convert::Infallible;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::error::{Result, WatchError};
use crate::poll_state::{CycleOutcome, PollState, WatcherStatus};
use crate::response::check_response;
use crate::source::{HomeworkSource, Notifier};
use crate::verdict::{parse_status, required_str};

/// Builds the chat message for a failed cycle.
///
/// # Examples
///
/// ```
/// use review_watch::{failure_message, WatchError};
///
/// let message = failure_message(&WatchError::http_status("https://example.test", 503));
/// assert!(message.starts_with("Program malfunction: "));
/// assert!(message.contains("503"));
/// ```
pub fn failure_message(err: &WatchError) -> String {
    format!("Program malfunction: {err}")
}

/// Polls a [`HomeworkSource`] and relays status changes to a [`Notifier`].
#[derive(Debug)]
pub struct Watcher<S, N> {
    source: S,
    notifier: N,
    state: PollState,
    retry_period: Duration,
}

impl<S, N> Watcher<S, N>
where
    S: HomeworkSource,
    N: Notifier,
{
    /// Creates a watcher whose cursor starts at the current time.
    pub fn new(config: &Config, source: S, notifier: N) -> Self {
        Self {
            source,
            notifier,
            state: PollState::new(Utc::now().timestamp()),
            retry_period: config.retry_period,
        }
    }

    /// Replaces the initial poll state.
    #[must_use]
    pub fn with_state(mut self, state: PollState) -> Self {
        self.state = state;
        self
    }

    /// Current dedup state and cursor.
    pub const fn state(&self) -> &PollState {
        &self.state
    }

    /// Pause between cycles.
    pub const fn retry_period(&self) -> Duration {
        self.retry_period
    }

    /// Runs cycles forever, sleeping for the retry period after each one.
    ///
    /// Every error is handled inside the cycle; the only way to stop the
    /// loop is to drop the future or kill the process.
    pub async fn run(mut self) -> Infallible {
        info!(
            status = %WatcherStatus::Running,
            cursor = self.state.cursor,
            retry_period_secs = self.retry_period.as_secs(),
            "Watcher started"
        );

        loop {
            let outcome = self.run_cycle().await;
            debug!(outcome = %outcome, cursor = self.state.cursor, "Cycle finished");
            tokio::time::sleep(self.retry_period).await;
        }
    }

    /// Runs one cycle using the current time for the cursor update.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.run_cycle_at(Utc::now().timestamp()).await
    }

    /// Runs one cycle; on success the cursor moves to `now`.
    #[instrument(skip(self))]
    pub async fn run_cycle_at(&mut self, now: i64) -> CycleOutcome {
        match self.check_for_update().await {
            Ok(outcome) => {
                if outcome.is_success() {
                    self.state.advance_cursor(now);
                }
                outcome
            }
            Err(err) => self.report_failure(&err).await,
        }
    }

    async fn check_for_update(&mut self) -> Result<CycleOutcome> {
        let response = self.source.fetch(self.state.cursor).await?;
        let homeworks = check_response(&response)?;

        // The API lists the most recently updated homework first.
        let Some(homework) = homeworks.first() else {
            info!("No homework updates since the cursor");
            return Ok(CycleOutcome::NoUpdates);
        };

        let status = required_str(homework, "status")?;
        if !self.state.is_new_status(status) {
            debug!(status, "Homework status has not changed");
            return Ok(CycleOutcome::Unchanged {
                status: status.to_string(),
            });
        }

        let message = parse_status(homework)?;
        info!(status, "Homework status changed, notifying chat");

        match self.notifier.send(&message).await {
            Ok(()) => {
                self.state.record_status(status);
                debug!(status, "Status notification delivered");
                Ok(CycleOutcome::Notified {
                    status: status.to_string(),
                })
            }
            Err(err) => {
                error!(kind = %err.kind(), error = %err, "Status notification not delivered");
                Ok(CycleOutcome::DeliveryFailed {
                    status: status.to_string(),
                })
            }
        }
    }

    async fn report_failure(&mut self, err: &WatchError) -> CycleOutcome {
        error!(kind = %err.kind(), error = %err, "Polling cycle failed");
        let message = failure_message(err);

        if !err.is_reportable() {
            return CycleOutcome::Failed {
                message,
                reported: false,
            };
        }

        if !self.state.is_new_error(&message) {
            debug!("Same failure already reported, not repeating it");
            return CycleOutcome::Failed {
                message,
                reported: false,
            };
        }

        match self.notifier.send(&message).await {
            Ok(()) => {
                self.state.record_error(message.as_str());
                CycleOutcome::Failed {
                    message,
                    reported: true,
                }
            }
            Err(send_err) => {
                warn!(error = %send_err, "Failure report not delivered");
                CycleOutcome::Failed {
                    message,
                    reported: false,
                }
            }
        }
    }
}
