use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The main error type for gateway operations.
///
/// Every Dispatcher and Aggregation result resolves to exactly one of these
/// variants (or, at the aggregate level, to a [`PartialFailure`] entry).
/// Nothing else crosses the public API boundary.
#[derive(Error, Debug)]
pub enum ProxmoxError {
    /// The remote API could not be reached: connection refused, DNS or TLS
    /// failure, or the bounded request timeout elapsed.
    ///
    /// Recoverable by retrying the whole operation. Never retried internally.
    #[error("Connection error: {0}")]
    Connectivity(String),

    /// The API token was rejected (HTTP 401/403).
    ///
    /// The Session that observed it is invalidated so the next acquire
    /// rebuilds it.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The API was reachable but refused the request semantically.
    ///
    /// # Fields
    /// * `status` - The HTTP status returned by the API
    /// * `message` - The remote message, passed through verbatim
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Caller input was rejected before any remote call was made.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl ProxmoxError {
    /// Returns the machine-readable kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxmoxError::Connectivity(_) => ErrorKind::ConnectivityError,
            ProxmoxError::Authentication(_) => ErrorKind::AuthError,
            ProxmoxError::Api { .. } => ErrorKind::ApiError,
            ProxmoxError::Validation(_) => ErrorKind::ValidationError,
        }
    }

    /// Returns the human-readable message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ProxmoxError::Connectivity(msg) | ProxmoxError::Authentication(msg) => msg.clone(),
            ProxmoxError::Api { message, .. } => message.clone(),
            ProxmoxError::Validation(source) => source.to_string(),
        }
    }

    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        ProxmoxError::Validation(ValidationError::Field {
            field: field.to_string(),
            message: message.into(),
        })
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Machine-readable error classification shared by errors and partial failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConnectivityError,
    AuthError,
    ApiError,
    ValidationError,
    PartialFailure,
}

impl ErrorKind {
    /// Returns the snake_case name used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConnectivityError => "connectivity_error",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::ApiError => "api_error",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::PartialFailure => "partial_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fan-out sub-call that failed while the rest of the aggregate succeeded.
///
/// Attached to the aggregate result instead of failing it. `target` names the
/// failing member (a node name, `qemu/101`, a storage id, ...), `cause` is the
/// kind of the underlying error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialFailure {
    pub target: String,
    pub cause: ErrorKind,
    pub message: String,
}

impl PartialFailure {
    pub(crate) fn new(target: impl Into<String>, error: &ProxmoxError) -> Self {
        Self {
            target: target.into(),
            cause: error.kind(),
            message: error.message(),
        }
    }

    /// Always [`ErrorKind::PartialFailure`]; the underlying kind is in `cause`.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PartialFailure
    }
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.target, self.cause, self.message)
    }
}

/// Type alias for Results that may fail with a ProxmoxError
pub type ProxmoxResult<T> = Result<T, ProxmoxError>;
