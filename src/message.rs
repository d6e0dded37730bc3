//! Canonical message record written to `messages.json`.
//!
//! This module provides [`MessageRecord`], the platform-independent
//! representation of one harvested channel message. The harvester builds one
//! record per platform message, the media downloader may attach an image path
//! once, and the output writer serializes the batch.
//!
//! # Serialization
//!
//! Field order is stable: `id`, `date`, `text`, `media`, `sender_id`,
//! `views`, `forwards`, `image_path`. Nullable fields are written as `null`;
//! `image_path` is omitted entirely unless a photo was downloaded.
//!
//! ```
//! use tgharvest::MessageRecord;
//! use chrono::{TimeZone, Utc};
//!
//! let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
//! let record = MessageRecord::new(42, date).with_text("Привет");
//! let json = serde_json::to_string(&record)?;
//!
//! assert!(json.starts_with(r#"{"id":42,"date":"2024-01-15T10:30:00Z""#));
//! assert!(json.contains("Привет"));
//! assert!(!json.contains("image_path"));
//! # Ok::<(), serde_json::Error>(())
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A harvested channel message.
///
/// # Fields
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `id` | `i64` | Message id, unique within one channel's retrieval window |
/// | `date` | `DateTime<Utc>` | When the message was posted |
/// | `text` | `Option<String>` | Message text, `""` for media-only posts, `None` if absent |
/// | `media` | `bool` | Whether any media payload is attached |
/// | `sender_id` | `Option<i64>` | Platform id of the sender |
/// | `views` | `Option<u64>` | View counter |
/// | `forwards` | `Option<u64>` | Forward counter |
/// | `image_path` | `Option<String>` | Path of the downloaded photo |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Platform message id.
    pub id: i64,

    /// Posting time, written as an ISO-8601 string.
    pub date: DateTime<Utc>,

    /// Message text.
    #[serde(default)]
    pub text: Option<String>,

    /// `true` if the platform message carried any media payload.
    ///
    /// Set for every media kind, including the ones that are not downloaded.
    pub media: bool,

    /// Platform id of the sender.
    #[serde(default)]
    pub sender_id: Option<i64>,

    /// View counter.
    #[serde(default)]
    pub views: Option<u64>,

    /// Forward counter.
    #[serde(default)]
    pub forwards: Option<u64>,

    /// Path of the downloaded photo.
    ///
    /// Present only when `media` is true and the download succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub image_path: Option<String>,
}

impl MessageRecord {
    /// Creates a record with only the required fields.
    ///
    /// Every optional field starts as `None` and `media` as `false`.
    pub fn new(id: i64, date: DateTime<Utc>) -> Self {
        Self {
            id,
            date,
            text: None,
            media: false,
            sender_id: None,
            views: None,
            forwards: None,
            image_path: None,
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Builder method to set the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder method to set the media flag.
    #[must_use]
    pub fn with_media(mut self, media: bool) -> Self {
        self.media = media;
        self
    }

    /// Builder method to set the sender id.
    #[must_use]
    pub fn with_sender_id(mut self, sender_id: i64) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    /// Builder method to set the view counter.
    #[must_use]
    pub fn with_views(mut self, views: u64) -> Self {
        self.views = Some(views);
        self
    }

    /// Builder method to set the forward counter.
    #[must_use]
    pub fn with_forwards(mut self, forwards: u64) -> Self {
        self.forwards = Some(forwards);
        self
    }

    /// Records the location of a successfully downloaded photo.
    pub fn attach_image(&mut self, path: &Path) {
        self.image_path = Some(path.display().to_string());
    }

    /// Returns `true` if a photo was downloaded for this record.
    pub fn has_image(&self) -> bool {
        self.image_path.is_some()
    }
}
