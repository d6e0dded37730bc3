//! [`TelegramSource`] backed by Telegram Desktop channel exports.
//!
//! Layout under the export root:
//!
//! ```text
//! exports/
//! ├── Chemed123/
//! │   ├── result.json
//! │   └── photos/photo_1@15-01-2024_10-30-00.jpg
//! └── tikvahpharma/
//!     └── result.json
//! ```
//!
//! Each directory name is a channel identifier. Messages are served newest
//! first, like the live platform does.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio::fs;
use tracing::debug;

use crate::config::Credentials;
use crate::error::PlatformError;
use crate::parsing::telegram::{ChannelExport, parse_export_message};

use super::{MediaRef, MessageStream, RawMessage, ResolvedEntity, TelegramSource};

/// File name of a channel export.
pub const EXPORT_FILE: &str = "result.json";

/// Source reading channel exports from a directory tree.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> Result<(), tgharvest::PlatformError> {
/// use tgharvest::platform::{ExportSource, TelegramSource};
///
/// let mut source = ExportSource::new("exports");
/// source.connect(None).await?;
/// let entity = source.resolve("Chemed123").await?;
/// println!("{:?}", entity.title);
/// source.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExportSource {
    root: PathBuf,
    connected: bool,
}

impl ExportSource {
    /// Creates a source over the given export root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn ensure_connected(&self) -> Result<(), PlatformError> {
        if self.connected {
            Ok(())
        } else {
            Err(PlatformError::protocol("export source is not connected"))
        }
    }

    fn channel_dir(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }

    async fn load(&self, identifier: &str) -> Result<ChannelExport, PlatformError> {
        self.ensure_connected()?;

        let path = self.channel_dir(identifier).join(EXPORT_FILE);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PlatformError::not_found(identifier));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            PlatformError::protocol(format!("malformed export {}: {e}", path.display()))
        })
    }

    /// Newest-first messages of an export, at most `limit`.
    fn newest_first(&self, identifier: &str, export: &ChannelExport, limit: usize) -> Vec<RawMessage> {
        let dir = self.channel_dir(identifier);
        export
            .messages
            .iter()
            .rev()
            .filter_map(parse_export_message)
            .take(limit)
            .map(|mut raw| {
                // Media references become paths the download step can open directly.
                raw.media = raw.media.map(|media| {
                    MediaRef::new(media.kind, dir.join(&media.reference).display().to_string())
                });
                raw
            })
            .collect()
    }
}

#[async_trait]
impl TelegramSource for ExportSource {
    fn name(&self) -> &'static str {
        "Telegram Desktop export"
    }

    async fn connect(&mut self, credentials: Option<&Credentials>) -> Result<(), PlatformError> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            PlatformError::protocol(format!(
                "export root {} is not readable: {e}",
                self.root.display()
            ))
        })?;
        if !metadata.is_dir() {
            return Err(PlatformError::protocol(format!(
                "export root {} is not a directory",
                self.root.display()
            )));
        }

        if credentials.is_some() {
            debug!("export source does not use platform credentials");
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), PlatformError> {
        self.connected = false;
        Ok(())
    }

    async fn resolve(&self, identifier: &str) -> Result<ResolvedEntity, PlatformError> {
        let export = self.load(identifier).await?;

        let mut entity = ResolvedEntity::new(identifier, export.id.unwrap_or_default());
        entity.username = export.username.filter(|u| !u.is_empty());
        entity.title = export.name;
        Ok(entity)
    }

    fn history<'a>(&'a self, entity: &'a ResolvedEntity, limit: usize) -> MessageStream<'a> {
        stream::once(self.load(&entity.identifier))
            .map(move |loaded| {
                let items: Vec<Result<RawMessage, PlatformError>> = match loaded {
                    Ok(export) => self
                        .newest_first(&entity.identifier, &export, limit)
                        .into_iter()
                        .map(Ok)
                        .collect(),
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items)
            })
            .flatten()
            .boxed()
    }

    async fn download_media(&self, media: &MediaRef, dest: &Path) -> Result<(), PlatformError> {
        self.ensure_connected()?;
        fs::copy(&media.reference, dest).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MediaKind;

    fn write_export(root: &Path, identifier: &str, json: &str) {
        let dir = root.join(identifier);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(EXPORT_FILE), json).unwrap();
    }

    const EXPORT: &str = r#"{
      "name": "Chemed", "type": "public_channel", "id": 1500,
      "messages": [
        {"id": 1, "type": "message", "date_unixtime": "1705314600", "from_id": "channel1500", "text": "first"},
        {"id": 2, "type": "service", "date_unixtime": "1705314660", "action": "pin_message"},
        {"id": 3, "type": "message", "date_unixtime": "1705314720", "photo": "photos/p3.jpg", "text": ""},
        {"id": 4, "type": "message", "date_unixtime": "1705314780", "text": "latest", "views": 40}
      ]
    }"#;

    async fn connected(root: &Path) -> ExportSource {
        let mut source = ExportSource::new(root);
        source.connect(None).await.unwrap();
        source
    }

    #[tokio::test]
    async fn test_connect_requires_existing_root() {
        let mut source = ExportSource::new("/definitely/not/an/export/root");
        let err = source.connect(None).await.unwrap_err();
        assert!(err.is_protocol());
        assert!(!source.is_connected());
    }

    #[tokio::test]
    async fn test_resolve_falls_back_without_username() {
        let tmp = tempfile::tempdir().unwrap();
        write_export(tmp.path(), "Chemed123", EXPORT);
        let source = connected(tmp.path()).await;

        let entity = source.resolve("Chemed123").await.unwrap();
        assert_eq!(entity.id, 1500);
        assert_eq!(entity.username, None);
        assert_eq!(entity.title.as_deref(), Some("Chemed"));
    }

    #[tokio::test]
    async fn test_resolve_missing_channel() {
        let tmp = tempfile::tempdir().unwrap();
        let source = connected(tmp.path()).await;

        let err = source.resolve("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_resolve_malformed_export() {
        let tmp = tempfile::tempdir().unwrap();
        write_export(tmp.path(), "broken", "{ not json");
        let source = connected(tmp.path()).await;

        let err = source.resolve("broken").await.unwrap_err();
        assert!(err.is_protocol());
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_capped() {
        let tmp = tempfile::tempdir().unwrap();
        write_export(tmp.path(), "Chemed123", EXPORT);
        let source = connected(tmp.path()).await;
        let entity = source.resolve("Chemed123").await.unwrap();

        let all: Vec<_> = source.history(&entity, 100).collect().await;
        let ids: Vec<i64> = all.iter().map(|r| r.as_ref().unwrap().id).collect();
        assert_eq!(ids, vec![4, 3, 1]);

        let capped: Vec<_> = source.history(&entity, 2).collect().await;
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_history_resolves_media_paths() {
        let tmp = tempfile::tempdir().unwrap();
        write_export(tmp.path(), "Chemed123", EXPORT);
        let source = connected(tmp.path()).await;
        let entity = source.resolve("Chemed123").await.unwrap();

        let messages: Vec<_> = source.history(&entity, 100).collect().await;
        let photo = messages[1].as_ref().unwrap().media.clone().unwrap();
        assert_eq!(photo.kind, MediaKind::Photo);
        assert_eq!(
            PathBuf::from(&photo.reference),
            tmp.path().join("Chemed123").join("photos/p3.jpg")
        );
    }

    #[tokio::test]
    async fn test_download_media_copies_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_export(tmp.path(), "Chemed123", EXPORT);
        let photos = tmp.path().join("Chemed123/photos");
        std::fs::create_dir_all(&photos).unwrap();
        std::fs::write(photos.join("p3.jpg"), b"\xff\xd8jpeg").unwrap();

        let source = connected(tmp.path()).await;
        let dest = tmp.path().join("3.jpg");
        let media = MediaRef::photo(photos.join("p3.jpg").display().to_string());

        source.download_media(&media, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"\xff\xd8jpeg");

        let missing = MediaRef::photo(photos.join("absent.jpg").display().to_string());
        assert!(source.download_media(&missing, &dest).await.is_err());
    }

    #[tokio::test]
    async fn test_calls_fail_when_disconnected() {
        let tmp = tempfile::tempdir().unwrap();
        write_export(tmp.path(), "Chemed123", EXPORT);
        let mut source = connected(tmp.path()).await;
        source.disconnect().await.unwrap();

        assert!(source.resolve("Chemed123").await.unwrap_err().is_protocol());
    }
}
