//! Error types for the DNS update system
//!
//! Every error carries an [`ErrorKind`] so the driver can decide what is
//! fatal (IPv4 discovery) and what only skips a domain or a record family.

use thiserror::Error;

/// Result type alias for DNS update operations
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-checkable classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Own public address could not be determined
    Discovery,
    /// No zone matches any suffix of a configured domain
    Resolution,
    /// Existing records of a zone could not be listed
    Lookup,
    /// The DNS provider rejected a call or could not be reached
    Provider,
    /// Invalid or unreadable configuration
    Config,
    /// Operator notification could not be delivered
    Notification,
    /// Anything else (I/O, serialization)
    Internal,
}

/// Core error type for the DNS update system
#[derive(Error, Debug)]
pub enum Error {
    /// Public IP discovery errors
    #[error("IP discovery error: {0}")]
    Discovery(String),

    /// Zone resolution errors
    #[error("Zone resolution error: {0}")]
    Resolution(String),

    /// Record lookup errors
    #[error("Record lookup error: {0}")]
    Lookup(String),

    /// Provider API errors
    ///
    /// `status` is `None` for transport-level failures.
    #[error("Provider error ({operation}): {message}")]
    Provider {
        /// Provider operation that failed (e.g. "create_record")
        operation: String,
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Error message, including the raw response body when available
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a zone resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a record lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a provider error for a received HTTP response
    pub fn provider(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a provider error for a request that never got a response
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Discovery(_) => ErrorKind::Discovery,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Lookup(_) => ErrorKind::Lookup,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Config(_) => ErrorKind::Config,
            Self::Notification(_) => ErrorKind::Notification,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status of a provider error, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
