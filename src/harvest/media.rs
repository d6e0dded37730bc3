//! Photo downloads for harvested records.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info};

use crate::core::ChannelDirs;
use crate::error::PlatformError;
use crate::message::MessageRecord;
use crate::platform::{MediaRef, TelegramSource};

/// Suffix of the file a download is written to before it is moved into place.
const PARTIAL_SUFFIX: &str = "jpg.part";

/// A photo that could not be saved. Scoped to one record.
#[derive(Debug, Error)]
#[error("Failed to download image for message {message_id}: {source}")]
pub struct MediaDownloadError {
    pub message_id: i64,
    #[source]
    pub source: PlatformError,
}

/// Saves photos of one channel into its images directory.
pub struct MediaDownloader<'a, S: ?Sized> {
    source: &'a S,
    dirs: &'a ChannelDirs,
    channel: &'a str,
}

impl<'a, S> MediaDownloader<'a, S>
where
    S: TelegramSource + ?Sized,
{
    /// `dirs.images_dir` must already exist.
    pub fn new(source: &'a S, dirs: &'a ChannelDirs, channel: &'a str) -> Self {
        Self { source, dirs, channel }
    }

    /// Downloads `photo` and attaches its path to `record`.
    ///
    /// The payload lands in `{id}.jpg.part` and is renamed to
    /// [`ChannelDirs::image_file`] once complete. On failure only the
    /// `.part` file is removed, so an image saved by an earlier run stays.
    pub async fn download(
        &self,
        record: &mut MessageRecord,
        photo: &MediaRef,
    ) -> Result<PathBuf, MediaDownloadError> {
        let path = self.dirs.image_file(record.id);
        let partial = path.with_extension(PARTIAL_SUFFIX);

        let saved = match self.source.download_media(photo, &partial).await {
            Ok(()) => fs::rename(&partial, &path).await.map_err(PlatformError::from),
            Err(e) => Err(e),
        };

        match saved {
            Ok(()) => {
                info!(channel = self.channel, message_id = record.id, path = %path.display(), "Downloaded image");
                record.attach_image(&path);
                Ok(path)
            }
            Err(source) => {
                let err = MediaDownloadError {
                    message_id: record.id,
                    source,
                };
                error!(channel = self.channel, message_id = record.id, error = %err, "Image download failed");
                remove_partial(&partial).await;
                Err(err)
            }
        }
    }
}

async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial image"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %path.display(), error = %e, "Could not remove partial image"),
    }
}
