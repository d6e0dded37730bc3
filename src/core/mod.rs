//! Core types shared by the harvesting pipeline.
//!
//! This module contains:
//! - [`models`] - Channels, the run date token and the output layout
//! - [`output`] - The `messages.json` writer
//! - [`report`] - Per-channel outcomes and the run summary

pub mod models;
pub mod output;
pub mod report;

// Re-export main types for convenience
pub use models::{Channel, ChannelDirs, OutputLayout, RunContext};
pub use output::{to_json, write_json};
pub use report::{ChannelOutcome, ChannelSummary, RunReport};
