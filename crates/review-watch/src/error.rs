//! Error types for the review-watch poll loop.
//!
//! Every failure the watcher can hit, from the startup credential check to
//! a rejected chat message, is a variant of [`WatchError`]. The loop
//! matches on [`FailureKind`] to decide how a failure is reported.

/// A specialized `Result` type for review-watch operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that can occur while watching for review status changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchError {
    // ========================================================================
    // Startup Errors
    // ========================================================================
    /// One or more required environment variables are missing or empty.
    #[error("Missing required environment variables: {}\n\nSuggestion: Export them or add them to a .env file", missing.join(", "))]
    MissingCredentials {
        /// Names of every missing variable, in declaration order.
        missing: Vec<String>,
    },

    /// An optional setting was present but invalid.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    InvalidConfig {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Upstream API Errors
    // ========================================================================
    /// The homework API could not be reached (network failure, timeout).
    #[error("Homework API is unreachable at {endpoint}: {message}")]
    Request {
        /// Endpoint that was requested.
        endpoint: String,
        /// Transport error detail.
        message: String,
    },

    /// The homework API answered with a status other than 200 OK.
    #[error("Homework API at {endpoint} answered with HTTP {status}")]
    HttpStatus {
        /// Endpoint that was requested.
        endpoint: String,
        /// The HTTP status code received.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected API response: {message}")]
    Schema {
        /// What was wrong with the payload.
        message: String,
    },

    /// A homework carried a status outside the verdict table.
    #[error("Homework \"{homework_name}\" has unknown status \"{status}\"")]
    UnknownVerdict {
        /// Name of the homework.
        homework_name: String,
        /// The unrecognized status value.
        status: String,
    },

    // ========================================================================
    // Chat Errors
    // ========================================================================
    /// The chat message could not be delivered.
    #[error("Failed to send chat message: {message}")]
    Notifier {
        /// Delivery error detail.
        message: String,
    },
}

/// Coarse category of a [`WatchError`], used for reporting decisions and
/// as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Missing or invalid startup configuration.
    Configuration,
    /// Transport failure talking to the homework API.
    Request,
    /// Non-OK HTTP status from the homework API.
    HttpStatus,
    /// Malformed response payload.
    Schema,
    /// Status value outside the verdict table.
    UnknownVerdict,
    /// Chat delivery failure.
    Notifier,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Request => write!(f, "request"),
            Self::HttpStatus => write!(f, "http_status"),
            Self::Schema => write!(f, "schema"),
            Self::UnknownVerdict => write!(f, "unknown_verdict"),
            Self::Notifier => write!(f, "notifier"),
        }
    }
}

impl WatchError {
    /// Creates a new `MissingCredentials` error.
    #[must_use]
    pub fn missing_credentials<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingCredentials {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a new `InvalidConfig` error with the given message and suggestion.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Request` error.
    #[must_use]
    pub fn request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a new `HttpStatus` error.
    #[must_use]
    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Creates a new `Schema` error.
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownVerdict` error.
    #[must_use]
    pub fn unknown_verdict(homework_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self::UnknownVerdict {
            homework_name: homework_name.into(),
            status: status.into(),
        }
    }

    /// Creates a new `Notifier` error.
    #[must_use]
    pub fn notifier(message: impl Into<String>) -> Self {
        Self::Notifier {
            message: message.into(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::MissingCredentials { .. } | Self::InvalidConfig { .. } => {
                FailureKind::Configuration
            }
            Self::Request { .. } => FailureKind::Request,
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::Schema { .. } => FailureKind::Schema,
            Self::UnknownVerdict { .. } => FailureKind::UnknownVerdict,
            Self::Notifier { .. } => FailureKind::Notifier,
        }
    }

    /// Returns `true` if this error must stop the process.
    ///
    /// Only startup configuration failures are fatal; everything else is
    /// retried on the next polling cycle.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind(), FailureKind::Configuration)
    }

    /// Returns `true` if this error should be reported to the chat.
    ///
    /// Delivery failures are only logged: reporting them would go through
    /// the same channel that just failed.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        !matches!(self.kind(), FailureKind::Notifier)
    }
}
