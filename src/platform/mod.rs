//! The platform capability consumed by the harvesting pipeline.
//!
//! [`TelegramSource`] is the seam between the pipeline and whatever talks to
//! the platform: a live client session, a recorded export on disk
//! ([`ExportSource`]), or a test double. The pipeline only ever sees the
//! platform-neutral types defined here.
//!
//! # Architecture
//!
//! - [`TelegramSource::resolve`] maps an identifier to a [`ResolvedEntity`]
//! - [`TelegramSource::history`] yields a lazy [`MessageStream`] of
//!   [`RawMessage`]s, in the order the platform returns them
//! - [`TelegramSource::download_media`] saves one [`MediaRef`] to disk
//!
//! Every call reports failures as [`PlatformError`], so rate limits arrive as
//! a structured `RateLimited { wait_seconds }` signal.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use thiserror::Error;

use crate::config::Credentials;
use crate::error::PlatformError;

pub mod export;
pub mod memory;

pub use export::ExportSource;
pub use memory::{MemoryChannel, MemorySource};

/// Lazy, finite, non-restartable sequence of platform messages.
pub type MessageStream<'a> = BoxStream<'a, Result<RawMessage, PlatformError>>;

/// Failure to read a single optional field of a platform message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read field `{field}`: {reason}")]
pub struct FieldError {
    /// Name of the field
    pub field: &'static str,
    /// What was wrong with it
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// An optional field as delivered by the platform: absent, present, or unreadable.
pub type FieldResult<T> = Result<Option<T>, FieldError>;

/// Canonical platform entity for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Identifier the entity was resolved from
    pub identifier: String,
    /// Platform id
    pub id: i64,
    /// Public username, if the platform reports one
    pub username: Option<String>,
    /// Display title
    pub title: Option<String>,
}

impl ResolvedEntity {
    pub fn new(identifier: impl Into<String>, id: i64) -> Self {
        Self {
            identifier: identifier.into(),
            id,
            username: None,
            title: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Document,
    Sticker,
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Document => write!(f, "document"),
            MediaKind::Sticker => write!(f, "sticker"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

/// Reference to a media payload, opaque outside the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub reference: String,
}

impl MediaRef {
    pub fn new(kind: MediaKind, reference: impl Into<String>) -> Self {
        Self {
            kind,
            reference: reference.into(),
        }
    }

    pub fn photo(reference: impl Into<String>) -> Self {
        Self::new(MediaKind::Photo, reference)
    }

    pub fn is_photo(&self) -> bool {
        self.kind == MediaKind::Photo
    }
}

/// A platform message before extraction.
///
/// `id` and `date` are always present; the optional fields carry their own
/// read errors so one bad field never costs the whole message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub text: FieldResult<String>,
    pub media: Option<MediaRef>,
    pub sender_id: FieldResult<i64>,
    pub views: FieldResult<u64>,
    pub forwards: FieldResult<u64>,
}

impl RawMessage {
    pub fn new(id: i64, date: DateTime<Utc>) -> Self {
        Self {
            id,
            date,
            text: Ok(None),
            media: None,
            sender_id: Ok(None),
            views: Ok(None),
            forwards: Ok(None),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Ok(Some(text.into()));
        self
    }

    #[must_use]
    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.media = Some(media);
        self
    }

    #[must_use]
    pub fn with_sender_id(mut self, sender_id: i64) -> Self {
        self.sender_id = Ok(Some(sender_id));
        self
    }

    #[must_use]
    pub fn with_views(mut self, views: u64) -> Self {
        self.views = Ok(Some(views));
        self
    }

    #[must_use]
    pub fn with_forwards(mut self, forwards: u64) -> Self {
        self.forwards = Ok(Some(forwards));
        self
    }

    /// The attached photo, if the media payload is one.
    pub fn photo(&self) -> Option<&MediaRef> {
        self.media.as_ref().filter(|m| m.is_photo())
    }
}

/// The platform capability.
///
/// Implementations own their connection. The orchestrator calls
/// [`connect`](Self::connect) once before the first channel and
/// [`disconnect`](Self::disconnect) once after the last.
#[async_trait]
pub trait TelegramSource: Send + Sync {
    /// Returns the human-readable name of this source.
    fn name(&self) -> &'static str;

    /// Opens the platform session.
    async fn connect(&mut self, credentials: Option<&Credentials>) -> Result<(), PlatformError>;

    /// Closes the platform session.
    async fn disconnect(&mut self) -> Result<(), PlatformError>;

    /// Resolves a channel identifier to its canonical entity.
    async fn resolve(&self, identifier: &str) -> Result<ResolvedEntity, PlatformError>;

    /// Streams at most `limit` messages of `entity`, platform order.
    fn history<'a>(&'a self, entity: &'a ResolvedEntity, limit: usize) -> MessageStream<'a>;

    /// Saves a media payload to `dest`.
    async fn download_media(&self, media: &MediaRef, dest: &Path) -> Result<(), PlatformError>;
}
