//! Run configuration.
//!
//! [`HarvestConfig`] is the explicit configuration value handed to the
//! [`Orchestrator`](crate::harvest::Orchestrator). The core never reads the
//! environment: the CLI collects credentials and channel identifiers and
//! builds this struct.
//!
//! # Example
//!
//! ```rust
//! use tgharvest::config::{HarvestConfig, RateLimitPolicy};
//!
//! let config = HarvestConfig::new(["tikvahpharma", "lobelia4cosmetics"])
//!     .with_message_limit(50)
//!     .with_data_root("out/raw")
//!     .with_rate_limit_policy(RateLimitPolicy::Abandon);
//!
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Default number of most-recent messages retrieved per channel.
pub const DEFAULT_MESSAGE_LIMIT: usize = 100;

/// Default root of the output layout.
pub const DEFAULT_DATA_ROOT: &str = "data/raw";

/// Platform credentials.
///
/// Opaque to the core; only the platform source interprets them.
/// `Debug` output is redacted so credentials never reach the logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Application id issued by the platform
    pub api_id: i32,
    /// Application hash issued by the platform
    pub api_hash: String,
    /// Phone number of the harvesting account
    pub phone: String,
}

impl Credentials {
    /// Creates credentials from their three parts.
    pub fn new(api_id: i32, api_hash: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            api_id,
            api_hash: api_hash.into(),
            phone: phone.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &"[REDACTED]")
            .field("api_hash", &"[REDACTED]")
            .field("phone", &"[REDACTED]")
            .finish()
    }
}

/// What to do with a channel once a rate-limit wait has been served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// Give the channel up for this run after waiting.
    #[default]
    Abandon,
    /// Run the channel pipeline one more time after waiting.
    RetryOnce,
}

impl fmt::Display for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitPolicy::Abandon => write!(f, "abandon"),
            RateLimitPolicy::RetryOnce => write!(f, "retry_once"),
        }
    }
}

impl std::str::FromStr for RateLimitPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "abandon" => Ok(RateLimitPolicy::Abandon),
            "retry_once" | "retry" => Ok(RateLimitPolicy::RetryOnce),
            _ => Err(format!(
                "Unknown rate limit policy: '{}'. Expected one of: abandon, retry_once",
                s
            )),
        }
    }
}

/// Configuration for one harvest run.
///
/// Deserializable from JSON; every field except `channels` has a default:
///
/// ```json
/// {
///   "channels": ["Chemed123", "tikvahpharma"],
///   "message_limit": 100,
///   "data_root": "data/raw",
///   "rate_limit_policy": "abandon"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarvestConfig {
    /// Channel identifiers, processed in this order.
    pub channels: Vec<String>,

    /// Maximum number of messages retrieved per channel (default: 100)
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,

    /// Root directory of the output layout (default: `data/raw`)
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Behaviour after a rate-limit wait (default: abandon)
    #[serde(default)]
    pub rate_limit_policy: RateLimitPolicy,

    /// Credentials passed to the platform on connect.
    ///
    /// Never read from or written to config files.
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

fn default_message_limit() -> usize {
    DEFAULT_MESSAGE_LIMIT
}

fn default_data_root() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_ROOT)
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            message_limit: DEFAULT_MESSAGE_LIMIT,
            data_root: default_data_root(),
            rate_limit_policy: RateLimitPolicy::default(),
            credentials: None,
        }
    }
}

impl HarvestConfig {
    /// Creates a configuration for the given channels with default settings.
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| HarvestError::config_file(e.to_string(), path))?;
        serde_json::from_str(&content).map_err(|e| HarvestError::config_file(e.to_string(), path))
    }

    /// Appends channels to the end of the list, skipping ones already present.
    #[must_use]
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for channel in channels {
            let channel = channel.into();
            if !self.channels.contains(&channel) {
                self.channels.push(channel);
            }
        }
        self
    }

    /// Sets the per-channel retrieval cap.
    #[must_use]
    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.message_limit = limit;
        self
    }

    /// Sets the output root directory.
    #[must_use]
    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = root.into();
        self
    }

    /// Sets the rate-limit policy.
    #[must_use]
    pub fn with_rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit_policy = policy;
        self
    }

    /// Sets the platform credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Checks the configuration before a run starts.
    ///
    /// Channel identifiers become path components, so they are checked with
    /// [`validate_channel_identifier`].
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(HarvestError::config("no channels configured"));
        }
        if self.message_limit == 0 {
            return Err(HarvestError::config("message_limit must be at least 1"));
        }
        for channel in &self.channels {
            validate_channel_identifier(channel)?;
        }
        Ok(())
    }
}

/// Rejects identifiers that are empty or would escape the output layout.
pub fn validate_channel_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(HarvestError::invalid_channel(identifier, "empty identifier"));
    }
    if identifier.contains(['/', '\\']) {
        return Err(HarvestError::invalid_channel(
            identifier,
            "path separators are not allowed",
        ));
    }
    if identifier == "." || identifier == ".." {
        return Err(HarvestError::invalid_channel(
            identifier,
            "relative path components are not allowed",
        ));
    }
    Ok(())
}
