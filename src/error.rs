//! Unified error types for tgharvest.
//!
//! Two layers:
//!
//! - [`PlatformError`] is what a [`TelegramSource`](crate::platform::TelegramSource)
//!   reports: the structured taxonomy the channel boundary classifies
//!   (rate limit, protocol error, not found, everything else).
//! - [`HarvestError`] is the crate-wide error. It wraps platform errors and
//!   adds the local failures (I/O, JSON, configuration).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for tgharvest operations.
///
/// # Example
///
/// ```rust
/// use tgharvest::error::Result;
/// use tgharvest::MessageRecord;
///
/// fn my_function() -> Result<Vec<MessageRecord>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Errors reported by the platform capability.
///
/// Sources map their native failures onto these variants so the channel
/// boundary can decide what to do without knowing the transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlatformError {
    /// The identifier does not name any channel the platform knows about.
    #[error("Channel not found: {identifier}")]
    NotFound {
        /// The identifier that failed to resolve
        identifier: String,
    },

    /// The platform demands a cooldown before further requests.
    #[error("Rate limited: wait {wait_seconds} seconds")]
    RateLimited {
        /// Required wait duration in seconds
        wait_seconds: u64,
    },

    /// Platform-level failure not classified as rate limiting.
    ///
    /// Covers malformed requests, transient server faults and payloads the
    /// source could not make sense of.
    #[error("Protocol error{}: {message}", code.map(|c| format!(" {c}")).unwrap_or_default())]
    Protocol {
        /// Platform error code, if the platform reports one
        code: Option<i32>,
        /// Human readable description
        message: String,
    },

    /// Local I/O failure inside the source (e.g. while saving media).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Anything the source could not classify.
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    /// Creates a not-found error.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        PlatformError::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Creates a rate-limit signal.
    pub fn rate_limited(wait_seconds: u64) -> Self {
        PlatformError::RateLimited { wait_seconds }
    }

    /// Creates a protocol error without an error code.
    pub fn protocol(message: impl Into<String>) -> Self {
        PlatformError::Protocol {
            code: None,
            message: message.into(),
        }
    }

    /// Returns the required wait when this is a rate-limit signal.
    pub fn wait_seconds(&self) -> Option<u64> {
        match self {
            PlatformError::RateLimited { wait_seconds } => Some(*wait_seconds),
            _ => None,
        }
    }

    /// Returns `true` if this is a rate-limit signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PlatformError::RateLimited { .. })
    }

    /// Returns `true` if this is a protocol error.
    pub fn is_protocol(&self) -> bool {
        matches!(self, PlatformError::Protocol { .. })
    }

    /// Returns `true` if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound { .. })
    }
}

/// The error type for all tgharvest operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HarvestError {
    /// An I/O error occurred.
    ///
    /// Typically while creating output directories or writing
    /// `messages.json`.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The platform capability reported a failure.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The configuration is unusable.
    #[error("Invalid configuration{}: {message}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Config {
        /// Description of what's wrong
        message: String,
        /// The config file path, if the configuration came from a file
        path: Option<PathBuf>,
    },

    /// A channel identifier cannot be used as an output path component.
    #[error("Invalid channel identifier '{identifier}': {reason}")]
    InvalidChannel {
        /// The rejected identifier
        identifier: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Invalid date token.
    ///
    /// Run dates are expected in YYYY-MM-DD format.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl HarvestError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        HarvestError::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Creates a configuration error tied to a config file.
    pub fn config_file(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        HarvestError::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Creates an invalid channel error.
    pub fn invalid_channel(identifier: impl Into<String>, reason: &'static str) -> Self {
        HarvestError::InvalidChannel {
            identifier: identifier.into(),
            reason,
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        HarvestError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Returns the wrapped platform error, if any.
    pub fn as_platform(&self) -> Option<&PlatformError> {
        match self {
            HarvestError::Platform(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, HarvestError::Io(_))
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, HarvestError::Config { .. })
    }

    /// Returns `true` if this is a date-related error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, HarvestError::InvalidDate { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
