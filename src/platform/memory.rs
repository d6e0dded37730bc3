//! In-memory [`TelegramSource`] for dry runs and tests.
//!
//! Channels, media payloads and failures are scripted up front. Scripted
//! failures are one-shot: each is returned by exactly one call, so a second
//! attempt at the same channel sees the healthy data.
//!
//! # Example
//!
//! ```rust
//! use tgharvest::error::PlatformError;
//! use tgharvest::platform::memory::{MemoryChannel, MemorySource};
//!
//! let source = MemorySource::new()
//!     .with_channel("Chemed123", MemoryChannel::new(1).with_username("Chemed123"))
//!     .fail_resolve("tikvahpharma", PlatformError::rate_limited(30));
//! ```

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio::fs;

use crate::config::Credentials;
use crate::error::PlatformError;

use super::{MediaRef, MessageStream, RawMessage, ResolvedEntity, TelegramSource};

/// A scripted channel.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    id: i64,
    username: Option<String>,
    title: Option<String>,
    messages: Vec<RawMessage>,
}

impl MemoryChannel {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
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

    /// Appends a message; history is served in insertion order.
    #[must_use]
    pub fn with_message(mut self, message: RawMessage) -> Self {
        self.messages.push(message);
        self
    }
}

/// Calls observed by a [`MemorySource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStats {
    pub connects: usize,
    pub disconnects: usize,
    /// Identifiers passed to `resolve`, in call order
    pub resolves: Vec<String>,
    pub downloads: usize,
}

/// Scripted source.
#[derive(Debug, Default)]
pub struct MemorySource {
    channels: HashMap<String, MemoryChannel>,
    media: HashMap<String, Vec<u8>>,
    connect_failure: Mutex<Option<PlatformError>>,
    disconnect_failure: Mutex<Option<PlatformError>>,
    resolve_failures: Mutex<HashMap<String, VecDeque<PlatformError>>>,
    history_failures: Mutex<HashMap<String, VecDeque<(usize, PlatformError)>>>,
    download_failures: Mutex<HashMap<String, PlatformError>>,
    stats: Mutex<CallStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn get_mut<T>(mutex: &mut Mutex<T>) -> &mut T {
    mutex.get_mut().unwrap_or_else(PoisonError::into_inner)
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_channel(mut self, identifier: impl Into<String>, channel: MemoryChannel) -> Self {
        self.channels.insert(identifier.into(), channel);
        self
    }

    /// Registers the payload served for a media reference.
    #[must_use]
    pub fn with_media(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.media.insert(reference.into(), bytes);
        self
    }

    #[must_use]
    pub fn fail_connect(mut self, error: PlatformError) -> Self {
        *get_mut(&mut self.connect_failure) = Some(error);
        self
    }

    #[must_use]
    pub fn fail_disconnect(mut self, error: PlatformError) -> Self {
        *get_mut(&mut self.disconnect_failure) = Some(error);
        self
    }

    /// Queues a failure for the next `resolve` of `identifier`.
    #[must_use]
    pub fn fail_resolve(mut self, identifier: impl Into<String>, error: PlatformError) -> Self {
        get_mut(&mut self.resolve_failures)
            .entry(identifier.into())
            .or_default()
            .push_back(error);
        self
    }

    /// Queues a failure for the next history stream of `identifier`,
    /// raised after `after` messages were yielded.
    #[must_use]
    pub fn fail_history_after(
        mut self,
        identifier: impl Into<String>,
        after: usize,
        error: PlatformError,
    ) -> Self {
        get_mut(&mut self.history_failures)
            .entry(identifier.into())
            .or_default()
            .push_back((after, error));
        self
    }

    /// Fails the next download of `reference`.
    #[must_use]
    pub fn fail_download(mut self, reference: impl Into<String>, error: PlatformError) -> Self {
        get_mut(&mut self.download_failures).insert(reference.into(), error);
        self
    }

    pub fn stats(&self) -> CallStats {
        lock(&self.stats).clone()
    }

    pub fn connects(&self) -> usize {
        lock(&self.stats).connects
    }

    pub fn disconnects(&self) -> usize {
        lock(&self.stats).disconnects
    }

    pub fn download_calls(&self) -> usize {
        lock(&self.stats).downloads
    }

    /// How many times `identifier` was resolved.
    pub fn resolve_calls(&self, identifier: &str) -> usize {
        lock(&self.stats)
            .resolves
            .iter()
            .filter(|r| *r == identifier)
            .count()
    }
}

#[async_trait]
impl TelegramSource for MemorySource {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn connect(&mut self, _credentials: Option<&Credentials>) -> Result<(), PlatformError> {
        get_mut(&mut self.stats).connects += 1;
        match get_mut(&mut self.connect_failure).take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn disconnect(&mut self) -> Result<(), PlatformError> {
        get_mut(&mut self.stats).disconnects += 1;
        match get_mut(&mut self.disconnect_failure).take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn resolve(&self, identifier: &str) -> Result<ResolvedEntity, PlatformError> {
        lock(&self.stats).resolves.push(identifier.to_string());

        let scripted = lock(&self.resolve_failures)
            .get_mut(identifier)
            .and_then(VecDeque::pop_front);
        if let Some(error) = scripted {
            return Err(error);
        }

        let channel = self
            .channels
            .get(identifier)
            .ok_or_else(|| PlatformError::not_found(identifier))?;

        let mut entity = ResolvedEntity::new(identifier, channel.id);
        entity.username.clone_from(&channel.username);
        entity.title.clone_from(&channel.title);
        Ok(entity)
    }

    fn history<'a>(&'a self, entity: &'a ResolvedEntity, limit: usize) -> MessageStream<'a> {
        let mut items: Vec<Result<RawMessage, PlatformError>> = self
            .channels
            .get(&entity.identifier)
            .map(|c| c.messages.iter().take(limit).cloned().map(Ok).collect())
            .unwrap_or_default();

        let scripted = lock(&self.history_failures)
            .get_mut(&entity.identifier)
            .and_then(VecDeque::pop_front);
        if let Some((after, error)) = scripted {
            items.truncate(after);
            items.push(Err(error));
        }

        stream::iter(items).boxed()
    }

    async fn download_media(&self, media: &MediaRef, dest: &Path) -> Result<(), PlatformError> {
        lock(&self.stats).downloads += 1;

        let scripted = lock(&self.download_failures).remove(&media.reference);
        if let Some(error) = scripted {
            return Err(error);
        }

        let bytes = self.media.get(&media.reference).ok_or_else(|| {
            PlatformError::Other(format!("media {} is not available", media.reference))
        })?;
        fs::write(dest, bytes).await?;
        Ok(())
    }
}
