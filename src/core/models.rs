//! Run-scoped data models: channels, the run date token and the output layout.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tokio::fs;

use crate::error::{HarvestError, Result};

/// Directory under the data root holding message files.
pub const MESSAGES_SUBDIR: &str = "telegram_messages";

/// Directory under the data root holding downloaded images.
pub const IMAGES_SUBDIR: &str = "telegram_images";

/// Name of the per-channel message file.
pub const MESSAGES_FILE: &str = "messages.json";

/// A configured channel, optionally resolved to its canonical handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Identifier as it appears in the configuration
    pub identifier: String,
    /// Canonical handle reported by the platform, once resolved
    pub handle: Option<String>,
}

impl Channel {
    /// Creates an unresolved channel.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            handle: None,
        }
    }

    /// Builder method to record the canonical handle.
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Key used for output paths: the handle if known, else the identifier.
    pub fn key(&self) -> &str {
        self.handle.as_deref().unwrap_or(&self.identifier)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Date token shared by every channel of one run.
///
/// Created once when the run starts and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    date: NaiveDate,
}

impl RunContext {
    /// Pins the run to the current local calendar day.
    pub fn today() -> Self {
        Self {
            date: Local::now().date_naive(),
        }
    }

    /// Pins the run to an explicit day.
    pub fn for_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Parses a `YYYY-MM-DD` token.
    pub fn parse(token: &str) -> Result<Self> {
        NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .map(Self::for_date)
            .map_err(|_| HarvestError::invalid_date(token))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The token used as a directory name, e.g. `2024-01-15`.
    pub fn token(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Root of the date- and channel-partitioned output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directories for one channel within one run.
    pub fn channel_dirs(&self, run: &RunContext, channel: &Channel) -> ChannelDirs {
        let token = run.token();
        ChannelDirs {
            messages_dir: self.root.join(MESSAGES_SUBDIR).join(&token).join(channel.key()),
            images_dir: self.root.join(IMAGES_SUBDIR).join(&token).join(channel.key()),
        }
    }
}

/// The two output directories of one channel in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDirs {
    pub messages_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl ChannelDirs {
    /// Creates both directories, including parents.
    pub async fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.messages_dir).await?;
        fs::create_dir_all(&self.images_dir).await?;
        Ok(())
    }

    /// `{messages_dir}/messages.json`
    pub fn messages_file(&self) -> PathBuf {
        self.messages_dir.join(MESSAGES_FILE)
    }

    /// `{images_dir}/{message_id}.jpg`
    pub fn image_file(&self, message_id: i64) -> PathBuf {
        self.images_dir.join(format!("{message_id}.jpg"))
    }
}
