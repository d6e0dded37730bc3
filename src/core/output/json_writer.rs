//! JSON output writer.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::message::MessageRecord;

/// Writes records to a JSON file as an array, replacing any previous file.
///
/// # Format
/// ```json
/// [
///   {
///     "id": 2,
///     "date": "2024-01-15T10:31:00Z",
///     "text": "Hi",
///     "media": false,
///     "sender_id": null,
///     "views": 15,
///     "forwards": null
///   }
/// ]
/// ```
///
/// The file is truncated, not replaced atomically: a crash mid-write can
/// leave a partial document.
pub async fn write_json(records: &[MessageRecord], output_path: &Path) -> Result<()> {
    let json = to_json(records)?;
    let mut file = File::create(output_path).await?;
    file.write_all(json.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Converts records to a pretty-printed JSON array.
///
/// Same document as [`write_json`]. Non-ASCII text is kept verbatim.
pub fn to_json(records: &[MessageRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
