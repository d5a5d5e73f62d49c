//! Review verdicts and the status message built from them.

use serde_json::Value;

use crate::error::{Result, WatchError};

/// Outcome of a homework review, keyed by the status string the API uses.
///
/// The set is closed: any other status is an error, never ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The reviewer accepted the work.
    Approved,
    /// The work is being reviewed.
    Reviewing,
    /// The reviewer sent the work back with remarks.
    Rejected,
}

impl Verdict {
    /// Every known verdict.
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Looks up the verdict for an API status string.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_watch::Verdict;
    ///
    /// assert_eq!(Verdict::from_status("approved"), Some(Verdict::Approved));
    /// assert_eq!(Verdict::from_status("Approved"), None);
    /// ```
    #[must_use]
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "approved" => Some(Self::Approved),
            "reviewing" => Some(Self::Reviewing),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// The status string the API uses for this verdict.
    #[must_use]
    pub const fn status(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Human-readable sentence sent to the chat.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Approved => "The work has been reviewed: the reviewer liked everything. Hooray!",
            Self::Reviewing => "The work has been taken for review.",
            Self::Rejected => "The work has been reviewed: the reviewer has remarks.",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status())
    }
}

/// Reads a required string field from a homework record.
pub(crate) fn required_str<'a>(homework: &'a Value, key: &str) -> Result<&'a str> {
    let value = homework
        .get(key)
        .ok_or_else(|| WatchError::schema(format!("homework record has no '{key}' key")))?;
    value
        .as_str()
        .ok_or_else(|| WatchError::schema(format!("homework '{key}' is not a string: {value}")))
}

/// Builds the chat message for one homework record.
///
/// Pure: no I/O and no state. Fails with `Schema` if `homework_name` or
/// `status` is absent, and with `UnknownVerdict` if the status is not one
/// of the [`Verdict`] keys.
///
/// # Examples
///
/// ```
/// use review_watch::parse_status;
/// use serde_json::json;
///
/// let message = parse_status(&json!({
///     "homework_name": "Project1",
///     "status": "reviewing",
/// }))
/// .unwrap();
/// assert_eq!(
///     message,
///     "Status changed for review \"Project1\". The work has been taken for review."
/// );
/// ```
pub fn parse_status(homework: &Value) -> Result<String> {
    let homework_name = required_str(homework, "homework_name")?;
    let status = required_str(homework, "status")?;
    let verdict = Verdict::from_status(status)
        .ok_or_else(|| WatchError::unknown_verdict(homework_name, status))?;
    Ok(format!(
        "Status changed for review \"{homework_name}\". {}",
        verdict.text()
    ))
}
