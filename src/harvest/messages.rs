//! Message history retrieval and record extraction.

use futures::StreamExt;
use tracing::debug;

use crate::error::PlatformError;
use crate::message::MessageRecord;
use crate::platform::{FieldResult, RawMessage, ResolvedEntity, TelegramSource};

use super::media::MediaDownloader;

/// Records of one channel plus download counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestBatch {
    /// Records in the order the platform returned them
    pub records: Vec<MessageRecord>,
    /// Records with any media attached
    pub with_media: usize,
    /// Photos saved
    pub images: usize,
    /// Photos that failed to download
    pub failed_images: usize,
}

/// Extracts the canonical record from a platform message.
///
/// An unreadable optional field becomes `None`; the rest of the record is kept.
pub fn extract_record(raw: RawMessage) -> MessageRecord {
    let id = raw.id;
    MessageRecord {
        id,
        date: raw.date,
        text: field(id, raw.text),
        media: raw.media.is_some(),
        sender_id: field(id, raw.sender_id),
        views: field(id, raw.views),
        forwards: field(id, raw.forwards),
        image_path: None,
    }
}

fn field<T>(message_id: i64, value: FieldResult<T>) -> Option<T> {
    value.unwrap_or_else(|e| {
        debug!(message_id, error = %e, "Field extraction failed, storing null");
        None
    })
}

/// Retrieves up to `limit` messages of `entity` and extracts them.
///
/// Photos are downloaded as their message comes by; other media kinds are
/// only flagged. A failed download is counted and harvesting goes on. A
/// failure of the history stream itself aborts the batch.
pub async fn harvest_messages<S>(
    source: &S,
    entity: &ResolvedEntity,
    limit: usize,
    downloader: &MediaDownloader<'_, S>,
) -> Result<HarvestBatch, PlatformError>
where
    S: TelegramSource + ?Sized,
{
    let mut batch = HarvestBatch::default();
    let mut history = source.history(entity, limit).take(limit);

    while let Some(item) = history.next().await {
        let raw = item?;
        let photo = raw.photo().cloned();
        let mut record = extract_record(raw);

        if record.media {
            batch.with_media += 1;
        }
        if let Some(photo) = photo {
            match downloader.download(&mut record, &photo).await {
                Ok(_) => batch.images += 1,
                Err(_) => batch.failed_images += 1,
            }
        }

        batch.records.push(record);
    }

    Ok(batch)
}
