//! Normalised API error.
//!
//! Every failure that leaves the dispatcher is an [`ApiError`]. Instances are
//! built only by the error normaliser and are immutable afterwards.

use serde::Serialize;
use thiserror::Error;

/// Closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller requested an operation that is not registered.
    UnknownOperation,
    /// Local precondition failure, or a 4xx rejection of client input.
    Validation,
    /// 401/403, or a protected operation called without a session.
    Authentication,
    /// 404.
    NotFound,
    /// No response, a timeout, or a 5xx.
    Network,
    /// Anything not classifiable above.
    Unknown,
}

impl ErrorKind {
    /// Short label used in user-facing messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnknownOperation => "Unsupported action",
            Self::Validation => "Invalid request",
            Self::Authentication => "Not signed in",
            Self::NotFound => "Not found",
            Self::Network => "Connection problem",
            Self::Unknown => "Unexpected error",
        }
    }

    /// Message used when nothing more specific is available.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::UnknownOperation => "this action is not available",
            Self::Validation => "some of the information provided is not valid",
            Self::Authentication => "please sign in to continue",
            Self::NotFound => "the requested item could not be found",
            Self::Network => "the server could not be reached, please try again",
            Self::Unknown => "something went wrong, please try again",
        }
    }
}

/// Failure returned by every dispatch.
///
/// # Examples
/// ```rust,ignore
/// match client.jobs().fetch(false).await {
///     Err(err) if err.kind() == ErrorKind::Authentication => show_login(),
///     Err(err) => show_banner(&err.user_message()),
///     Ok(jobs) => render(&jobs),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint_key} failed ({kind:?}): {message}")]
pub struct ApiError {
    message: String,
    http_status: Option<u16>,
    kind: ErrorKind,
    endpoint_key: String,
}

impl ApiError {
    pub(crate) fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        http_status: Option<u16>,
        endpoint_key: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            http_status,
            kind,
            endpoint_key: endpoint_key.into(),
        }
    }

    /// Failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Best-effort human message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Operation key that produced the error.
    #[must_use]
    pub fn endpoint_key(&self) -> &str {
        self.endpoint_key.as_str()
    }

    /// One-line message safe to show to end users.
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.kind.label(), self.message)
    }
}
