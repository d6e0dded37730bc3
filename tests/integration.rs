//! Integration tests for full harvest runs.
//!
//! Runs drive the [`Orchestrator`] against a scripted [`MemorySource`] and
//! inspect the resulting directory tree.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tempfile::tempdir;
use tokio::time::Instant;

use tgharvest::config::{HarvestConfig, RateLimitPolicy};
use tgharvest::core::{Channel, ChannelOutcome, OutputLayout, RunContext};
use tgharvest::harvest::{AbandonCause, Orchestrator};
use tgharvest::platform::{MediaKind, MediaRef, MemoryChannel, MemorySource, RawMessage};
use tgharvest::{MessageRecord, PlatformError};

// ============================================================================
// Helpers
// ============================================================================

const DATE: &str = "2024-01-15";

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap() + chrono::Duration::minutes(minute)
}

fn text_message(id: i64, text: &str) -> RawMessage {
    RawMessage::new(id, at(id)).with_text(text).with_views(100 + id as u64)
}

fn run_ctx() -> RunContext {
    RunContext::parse(DATE).unwrap()
}

fn messages_file(root: &Path, channel: &str) -> std::path::PathBuf {
    OutputLayout::new(root)
        .channel_dirs(&run_ctx(), &Channel::new(channel))
        .messages_file()
}

fn images_dir(root: &Path, channel: &str) -> std::path::PathBuf {
    OutputLayout::new(root)
        .channel_dirs(&run_ctx(), &Channel::new(channel))
        .images_dir
}

fn read_json(path: &Path) -> Vec<Value> {
    let content = fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

async fn harvest(source: MemorySource, config: HarvestConfig) -> (Orchestrator<MemorySource>, tgharvest::core::RunReport) {
    let mut orchestrator = Orchestrator::new(source, config).unwrap();
    let report = orchestrator.run_for(run_ctx()).await.unwrap();
    (orchestrator, report)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_text_only_channel() {
    let tmp = tempdir().unwrap();
    let channel = MemoryChannel::new(1001)
        .with_username("Chemed123")
        .with_message(text_message(3, "Paracetamol 500mg in stock"))
        .with_message(text_message(2, "Open until 8pm"))
        .with_message(text_message(1, "ሰላም"));
    let source = MemorySource::new().with_channel("Chemed123", channel);
    let config = HarvestConfig::new(["Chemed123"]).with_data_root(tmp.path());

    let (_, report) = harvest(source, config).await;
    assert_eq!(report.completed(), 1);

    let records = read_json(&messages_file(tmp.path(), "Chemed123"));
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.get("image_path").is_none()));
    assert!(records.iter().all(|r| r["media"] == false));
    assert_eq!(records[2]["text"], "ሰላም");
    assert_eq!(records[0]["id"], 3);
    assert_eq!(records[0]["views"], 103);
    assert_eq!(count_files(&images_dir(tmp.path(), "Chemed123")), 0);
}

#[tokio::test]
async fn test_photo_is_downloaded_next_to_record() {
    let tmp = tempdir().unwrap();
    let channel = MemoryChannel::new(1002)
        .with_username("lobelia4cosmetics")
        .with_message(text_message(11, "New arrivals").with_media(MediaRef::photo("photo-11")))
        .with_message(text_message(10, "Restocked"));
    let source = MemorySource::new()
        .with_channel("lobelia4cosmetics", channel)
        .with_media("photo-11", vec![0xFF, 0xD8, 0xFF]);
    let config = HarvestConfig::new(["lobelia4cosmetics"]).with_data_root(tmp.path());

    let (_, report) = harvest(source, config).await;
    let summary = report.outcomes[0].summary().unwrap();
    assert_eq!(summary.images, 1);
    assert_eq!(summary.with_media, 1);

    let images = images_dir(tmp.path(), "lobelia4cosmetics");
    let expected = images.join("11.jpg");
    let records = read_json(&messages_file(tmp.path(), "lobelia4cosmetics"));

    assert_eq!(records[0]["image_path"], expected.display().to_string());
    assert!(records[1].get("image_path").is_none());
    assert_eq!(count_files(&images), 1);
    assert_eq!(fs::read(expected).unwrap(), vec![0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn test_failed_download_keeps_record() {
    let tmp = tempdir().unwrap();
    let channel = MemoryChannel::new(1003)
        .with_message(RawMessage::new(5, at(5)).with_media(MediaRef::photo("photo-5")));
    let source = MemorySource::new()
        .with_channel("medicalethiopia", channel)
        .with_media("photo-5", b"jpeg".to_vec())
        .fail_download("photo-5", PlatformError::protocol("FILE_REFERENCE_EXPIRED"));
    let config = HarvestConfig::new(["medicalethiopia"]).with_data_root(tmp.path());

    let (_, report) = harvest(source, config).await;
    let summary = report.outcomes[0].summary().unwrap();
    assert_eq!(summary.failed_images, 1);
    assert_eq!(summary.images, 0);

    let records = read_json(&messages_file(tmp.path(), "medicalethiopia"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["media"], true);
    assert!(records[0]["text"].is_null());
    assert!(records[0].get("image_path").is_none());
    assert_eq!(count_files(&images_dir(tmp.path(), "medicalethiopia")), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_channel_is_abandoned_after_wait() {
    let tmp = tempdir().unwrap();
    let source = MemorySource::new()
        .with_channel("tikvahpharma", MemoryChannel::new(1).with_message(text_message(1, "x")))
        .with_channel("Chemed123", MemoryChannel::new(2).with_message(text_message(1, "y")))
        .fail_resolve("tikvahpharma", PlatformError::rate_limited(30));
    let config = HarvestConfig::new(["tikvahpharma", "Chemed123"]).with_data_root(tmp.path());

    let start = Instant::now();
    let (orchestrator, report) = harvest(source, config).await;

    assert!(start.elapsed() >= Duration::from_secs(30));
    assert_eq!(
        report.outcome("tikvahpharma").and_then(ChannelOutcome::abandon_cause),
        Some(&AbandonCause::RateLimited { wait_seconds: 30 })
    );
    assert!(!messages_file(tmp.path(), "tikvahpharma").exists());
    assert!(report.outcome("Chemed123").is_some_and(ChannelOutcome::is_completed));
    assert!(messages_file(tmp.path(), "Chemed123").is_file());
    assert_eq!(orchestrator.source().resolve_calls("tikvahpharma"), 1);
}

// ============================================================================
// Run-level properties
// ============================================================================

#[tokio::test]
async fn test_channels_run_in_configured_order() {
    let tmp = tempdir().unwrap();
    let source = MemorySource::new()
        .with_channel("b", MemoryChannel::new(2))
        .with_channel("a", MemoryChannel::new(1));
    let config = HarvestConfig::new(["b", "ghost", "a"]).with_data_root(tmp.path());

    let (orchestrator, report) = harvest(source, config).await;

    let order: Vec<&str> = report.outcomes.iter().map(ChannelOutcome::identifier).collect();
    assert_eq!(order, vec!["b", "ghost", "a"]);
    assert_eq!(orchestrator.source().stats().resolves, vec!["b", "ghost", "a"]);
    assert!(matches!(
        report.outcome("ghost").and_then(ChannelOutcome::abandon_cause),
        Some(AbandonCause::Unknown(_))
    ));
}

#[tokio::test]
async fn test_connection_closed_once_when_every_channel_fails() {
    let tmp = tempdir().unwrap();
    let source = MemorySource::new()
        .with_channel("a", MemoryChannel::new(1).with_message(text_message(1, "x")))
        .fail_resolve("a", PlatformError::protocol("CHANNEL_PRIVATE"));
    let config = HarvestConfig::new(["a", "missing"]).with_data_root(tmp.path());

    let (orchestrator, report) = harvest(source, config).await;

    assert_eq!(report.completed(), 0);
    assert_eq!(report.abandoned(), 2);
    assert_eq!(orchestrator.source().connects(), 1);
    assert_eq!(orchestrator.source().disconnects(), 1);
}

#[tokio::test]
async fn test_stream_failure_leaves_no_messages_file() {
    let tmp = tempdir().unwrap();
    let channel = MemoryChannel::new(1)
        .with_message(text_message(2, "first"))
        .with_message(text_message(1, "second"));
    let source = MemorySource::new()
        .with_channel("Thequorachannel", channel)
        .fail_history_after("Thequorachannel", 1, PlatformError::protocol("connection reset"));
    let config = HarvestConfig::new(["Thequorachannel"]).with_data_root(tmp.path());

    let (_, report) = harvest(source, config).await;

    assert!(matches!(
        report.outcomes[0].abandon_cause(),
        Some(AbandonCause::Protocol(_))
    ));
    assert!(!messages_file(tmp.path(), "Thequorachannel").exists());
}

#[tokio::test]
async fn test_rerun_overwrites_messages_file() {
    let tmp = tempdir().unwrap();
    let config = HarvestConfig::new(["medinethiopiainsider"]).with_data_root(tmp.path());

    let first = MemorySource::new().with_channel(
        "medinethiopiainsider",
        MemoryChannel::new(1)
            .with_message(text_message(3, "a"))
            .with_message(text_message(2, "b"))
            .with_message(text_message(1, "c")),
    );
    harvest(first, config.clone()).await;

    let second = MemorySource::new().with_channel(
        "medinethiopiainsider",
        MemoryChannel::new(1).with_message(text_message(4, "only")),
    );
    harvest(second, config).await;

    let records: Vec<MessageRecord> =
        serde_json::from_str(&fs::read_to_string(messages_file(tmp.path(), "medinethiopiainsider")).unwrap())
            .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text.as_deref(), Some("only"));
}

#[tokio::test]
async fn test_message_limit_caps_records() {
    let tmp = tempdir().unwrap();
    let mut channel = MemoryChannel::new(1);
    for id in (1..=150).rev() {
        channel = channel.with_message(text_message(id, "post"));
    }
    let source = MemorySource::new().with_channel("Chemed123", channel);
    let config = HarvestConfig::new(["Chemed123"]).with_data_root(tmp.path());

    let (_, report) = harvest(source, config).await;

    assert_eq!(report.total_records(), 100);
    let records = read_json(&messages_file(tmp.path(), "Chemed123"));
    assert_eq!(records.len(), 100);
    assert_eq!(records[0]["id"], 150);
    assert_eq!(records[99]["id"], 51);
}

#[tokio::test]
async fn test_non_photo_media_is_flagged_only() {
    let tmp = tempdir().unwrap();
    let channel = MemoryChannel::new(1)
        .with_message(RawMessage::new(2, at(2)).with_media(MediaRef::new(MediaKind::Video, "clip")))
        .with_message(RawMessage::new(1, at(1)).with_media(MediaRef::new(MediaKind::Document, "price-list.pdf")));
    let source = MemorySource::new().with_channel("chan", channel);
    let config = HarvestConfig::new(["chan"]).with_data_root(tmp.path());

    let (orchestrator, _) = harvest(source, config).await;

    let records = read_json(&messages_file(tmp.path(), "chan"));
    assert!(records.iter().all(|r| r["media"] == true && r.get("image_path").is_none()));
    assert_eq!(orchestrator.source().download_calls(), 0);
}

#[tokio::test]
async fn test_resolved_username_keys_output() {
    let tmp = tempdir().unwrap();
    let source = MemorySource::new().with_channel(
        "t.me-alias",
        MemoryChannel::new(1).with_username("tikvahpharma").with_message(text_message(1, "x")),
    );
    let config = HarvestConfig::new(["t.me-alias"]).with_data_root(tmp.path());

    let (_, report) = harvest(source, config).await;

    assert_eq!(report.outcomes[0].summary().unwrap().key, "tikvahpharma");
    assert!(messages_file(tmp.path(), "tikvahpharma").is_file());
    assert!(!messages_file(tmp.path(), "t.me-alias").exists());
}

#[tokio::test(start_paused = true)]
async fn test_retry_once_policy_recovers_channel() {
    let tmp = tempdir().unwrap();
    let source = MemorySource::new()
        .with_channel("tikvahpharma", MemoryChannel::new(1).with_message(text_message(1, "x")))
        .fail_resolve("tikvahpharma", PlatformError::rate_limited(10));
    let config = HarvestConfig::new(["tikvahpharma"])
        .with_data_root(tmp.path())
        .with_rate_limit_policy(RateLimitPolicy::RetryOnce);

    let start = Instant::now();
    let (orchestrator, report) = harvest(source, config).await;

    assert!(start.elapsed() >= Duration::from_secs(10));
    assert_eq!(report.completed(), 1);
    assert_eq!(orchestrator.source().resolve_calls("tikvahpharma"), 2);
    assert!(messages_file(tmp.path(), "tikvahpharma").is_file());
}
