//! Telegram Desktop export parsing.
//!
//! Types and helpers used by [`ExportSource`](crate::platform::ExportSource)
//! to turn `result.json` entries into [`RawMessage`]s.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::platform::{FieldError, FieldResult, MediaKind, MediaRef, RawMessage};

/// Offset Telegram adds to channel ids in "marked" peer ids.
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

/// Raw export message structure for deserialization.
///
/// Loosely typed on purpose: optional fields are kept as [`Value`] so a
/// malformed field can be reported without failing the whole file.
#[derive(Debug, Deserialize)]
pub struct ExportRawMessage {
    /// Message ID
    pub id: Option<i64>,
    /// Message type (we only care about "message")
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Local time, `YYYY-MM-DDTHH:MM:SS`
    pub date: Option<String>,
    /// Unix timestamp as string
    pub date_unixtime: Option<String>,
    /// Peer id of the sender, e.g. `user123` or `channel456`
    pub from_id: Option<Value>,
    /// Message text (can be string or array)
    pub text: Option<Value>,
    /// Relative path of an attached photo
    pub photo: Option<String>,
    /// Relative path of an attached file
    pub file: Option<String>,
    /// Kind of the attached file (`video_file`, `voice_message`, ...)
    pub media_type: Option<String>,
    pub views: Option<Value>,
    pub forwards: Option<Value>,
}

/// Channel export wrapper.
#[derive(Debug, Deserialize)]
pub struct ChannelExport {
    pub name: Option<String>,
    /// Export type, e.g. `public_channel`
    #[serde(rename = "type")]
    pub export_type: Option<String>,
    pub id: Option<i64>,
    /// Public username; written by some exporters, absent in Desktop exports
    pub username: Option<String>,
    #[serde(default)]
    pub messages: Vec<ExportRawMessage>,
}

/// Extracts text content from Telegram's complex `text` field.
///
/// The `text` field can be:
/// - A simple string: `"Hello"`
/// - An array with strings and objects: `["Text", {"type": "link", "text": "url"}]`
///
/// Empty text (media-only posts) is kept as `""`; only `null` yields `Ok(None)`.
pub fn extract_telegram_text(text_value: &Value) -> FieldResult<String> {
    let text = match text_value {
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("text")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string),
                _ => None,
            })
            .collect::<String>(),
        Value::Null => return Ok(None),
        other => {
            return Err(FieldError::new(
                "text",
                format!("expected string or array, got {}", json_type(other)),
            ));
        }
    };

    Ok(Some(text))
}

/// Parses a Unix timestamp string to DateTime.
///
/// Telegram stores timestamps as strings like "1234567890".
pub fn parse_unix_timestamp(ts_str: &str) -> Option<DateTime<Utc>> {
    ts_str
        .parse::<i64>()
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

/// Parses the export's `date` field, read as UTC.
pub fn parse_export_date(date: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses a `from_id` peer string into a marked peer id.
///
/// `user123` → `123`, `chat123` → `-123`, `channel123` → `-1000000000123`.
pub fn parse_peer_id(value: &Value) -> FieldResult<i64> {
    let raw = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => {
            return n
                .as_i64()
                .map(Some)
                .ok_or_else(|| FieldError::new("sender_id", format!("out of range: {n}")));
        }
        Value::String(s) => s.as_str(),
        other => {
            return Err(FieldError::new(
                "sender_id",
                format!("expected peer string, got {}", json_type(other)),
            ));
        }
    };

    let unrecognized = || FieldError::new("sender_id", format!("unrecognized peer id '{raw}'"));
    let out_of_range = || FieldError::new("sender_id", format!("peer id '{raw}' out of range"));
    // Unsigned digits only; `str::parse` would also take a sign.
    let parse = |digits: &str| {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unrecognized());
        }
        digits.parse::<i64>().map_err(|_| out_of_range())
    };

    let id = if let Some(rest) = raw.strip_prefix("channel") {
        CHANNEL_ID_OFFSET
            .checked_add(parse(rest)?)
            .and_then(i64::checked_neg)
            .ok_or_else(out_of_range)?
    } else if let Some(rest) = raw.strip_prefix("chat") {
        parse(rest)?.checked_neg().ok_or_else(out_of_range)?
    } else if let Some(rest) = raw.strip_prefix("user") {
        parse(rest)?
    } else {
        parse(raw)?
    };

    Ok(Some(id))
}

/// Reads a non-negative counter field such as `views`.
pub fn parse_counter(field: &'static str, value: &Value) -> FieldResult<u64> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| FieldError::new(field, format!("expected non-negative integer, got {n}"))),
        other => Err(FieldError::new(
            field,
            format!("expected integer, got {}", json_type(other)),
        )),
    }
}

/// Classifies the media attached to an export message, if any.
pub fn classify_media(msg: &ExportRawMessage) -> Option<MediaRef> {
    if let Some(photo) = &msg.photo {
        return Some(MediaRef::photo(photo));
    }

    let kind = match msg.media_type.as_deref() {
        Some("video_file" | "video_message" | "animation") => MediaKind::Video,
        Some("voice_message" | "audio_file") => MediaKind::Audio,
        Some("sticker") => MediaKind::Sticker,
        Some(_) => MediaKind::Other,
        None if msg.file.is_some() => MediaKind::Document,
        None => return None,
    };

    Some(MediaRef::new(kind, msg.file.clone().unwrap_or_default()))
}

/// Converts an export entry into a [`RawMessage`].
///
/// Returns `None` if:
/// - The entry type is not "message"
/// - The id is missing
/// - Neither `date_unixtime` nor `date` can be parsed
pub fn parse_export_message(msg: &ExportRawMessage) -> Option<RawMessage> {
    if msg.msg_type != "message" {
        return None;
    }

    let id = msg.id?;
    let date = msg
        .date_unixtime
        .as_deref()
        .and_then(parse_unix_timestamp)
        .or_else(|| msg.date.as_deref().and_then(parse_export_date))?;

    let mut raw = RawMessage::new(id, date);
    raw.text = msg.text.as_ref().map_or(Ok(None), extract_telegram_text);
    raw.media = classify_media(msg);
    raw.sender_id = msg.from_id.as_ref().map_or(Ok(None), parse_peer_id);
    raw.views = msg
        .views
        .as_ref()
        .map_or(Ok(None), |v| parse_counter("views", v));
    raw.forwards = msg
        .forwards
        .as_ref()
        .map_or(Ok(None), |v| parse_counter("forwards", v));

    Some(raw)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
