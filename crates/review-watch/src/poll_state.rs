//! State carried between polling cycles.
//!
//! [`PollState`] is the watcher's whole memory: the last status that made it
//! to the chat, the last error text that made it to the chat, and the cursor
//! sent upstream as `from_date`.

// ============================================================================
// WatcherStatus
// ============================================================================

/// Lifecycle status of the watcher.
///
/// `Running` is the only steady state. `Terminated` is reached only when
/// the startup check fails; a running loop never terminates on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatcherStatus {
    /// Polling cycles are being executed.
    #[default]
    Running,
    /// Startup failed and the process is exiting.
    Terminated,
}

impl std::fmt::Display for WatcherStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

// ============================================================================
// PollState
// ============================================================================

/// Dedup state and cursor, owned by the poll loop for the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    /// Status of the last homework notification that was delivered.
    pub last_status: Option<String>,

    /// Text of the last failure message that was delivered.
    pub last_error_message: Option<String>,

    /// Epoch seconds sent upstream as `from_date`.
    pub cursor: i64,
}

impl PollState {
    /// Creates a fresh state starting at the given cursor.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_watch::PollState;
    ///
    /// let state = PollState::new(1000);
    /// assert_eq!(state.cursor, 1000);
    /// assert!(state.last_status.is_none());
    /// assert!(state.last_error_message.is_none());
    /// ```
    #[must_use]
    pub const fn new(cursor: i64) -> Self {
        Self {
            last_status: None,
            last_error_message: None,
            cursor,
        }
    }

    /// Returns `true` if `status` differs from the last delivered status.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_watch::PollState;
    ///
    /// let mut state = PollState::new(0);
    /// assert!(state.is_new_status("reviewing"));
    ///
    /// state.record_status("reviewing");
    /// assert!(!state.is_new_status("reviewing"));
    /// assert!(state.is_new_status("approved"));
    /// ```
    #[must_use]
    pub fn is_new_status(&self, status: &str) -> bool {
        self.last_status.as_deref() != Some(status)
    }

    /// Remembers a status after its notification was delivered.
    pub fn record_status(&mut self, status: impl Into<String>) {
        self.last_status = Some(status.into());
    }

    /// Returns `true` if `message` differs from the last delivered error.
    #[must_use]
    pub fn is_new_error(&self, message: &str) -> bool {
        self.last_error_message.as_deref() != Some(message)
    }

    /// Remembers an error message after it was delivered.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error_message = Some(message.into());
    }

    /// Moves the cursor forward after a successful cycle.
    pub fn advance_cursor(&mut self, now: i64) {
        self.cursor = now;
    }
}

// ============================================================================
// CycleOutcome
// ============================================================================

/// What a single polling cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The API returned no homework since the cursor.
    NoUpdates,
    /// The newest homework still has the last delivered status.
    Unchanged {
        /// The unchanged status.
        status: String,
    },
    /// A status change was delivered to the chat.
    Notified {
        /// The new status.
        status: String,
    },
    /// A status change was detected but could not be delivered; it will be
    /// retried on the next cycle.
    DeliveryFailed {
        /// The status that was not delivered.
        status: String,
    },
    /// The cycle failed.
    Failed {
        /// The failure message built for the chat.
        message: String,
        /// Whether the message was delivered in this cycle.
        reported: bool,
    },
}

impl CycleOutcome {
    /// Returns `true` if the cycle completed without any error.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self,
            Self::NoUpdates | Self::Unchanged { .. } | Self::Notified { .. }
        )
    }
}

impl std::fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoUpdates => write!(f, "no_updates"),
            Self::Unchanged { .. } => write!(f, "unchanged"),
            Self::Notified { .. } => write!(f, "notified"),
            Self::DeliveryFailed { .. } => write!(f, "delivery_failed"),
            Self::Failed { reported: true, .. } => write!(f, "failed_reported"),
            Self::Failed { reported: false, .. } => write!(f, "failed_suppressed"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
