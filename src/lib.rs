//! # tgharvest
//!
//! Harvests the recent history of public Telegram channels into a
//! date-partitioned file layout, downloading photos along the way.
//!
//! ## Overview
//!
//! For every configured channel, in order, tgharvest:
//! - resolves the identifier to the platform's channel entity
//! - retrieves up to `message_limit` recent messages, newest first
//! - extracts a [`MessageRecord`] per message and downloads attached photos
//! - writes the records to `messages.json`
//!
//! ```text
//! {data_root}/telegram_messages/{YYYY-MM-DD}/{channel}/messages.json
//! {data_root}/telegram_images/{YYYY-MM-DD}/{channel}/{message_id}.jpg
//! ```
//!
//! A failing channel (rate limit, API error, anything else) is abandoned
//! without output and the run moves on to the next one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tgharvest::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let config = HarvestConfig::new(["Chemed123", "tikvahpharma"]);
//! let mut orchestrator = Orchestrator::new(ExportSource::new("exports"), config)?;
//!
//! let report = orchestrator.run().await?;
//! for outcome in &report.outcomes {
//!     println!("{}: completed = {}", outcome.identifier(), outcome.is_completed());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`config`] - [`HarvestConfig`](config::HarvestConfig), credentials, rate-limit policy
//! - [`core`] - Run date token, output layout, JSON writer, run report
//! - [`harvest`] - The pipeline and the [`Orchestrator`](harvest::Orchestrator)
//! - [`platform`] - The [`TelegramSource`](platform::TelegramSource) capability
//!   and its implementations
//! - [`parsing`] - Telegram Desktop export format
//! - [`message`] - [`MessageRecord`]
//! - [`error`] - Error types ([`HarvestError`], [`PlatformError`], [`Result`])
//! - [`cli`] - Command-line arguments (feature `cli`)
//! - [`prelude`] - Convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod harvest;
pub mod message;
pub mod parsing;
pub mod platform;

// Re-export the main types at the crate root for convenience
pub use error::{HarvestError, PlatformError, Result};
pub use message::MessageRecord;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use tgharvest::prelude::*;
/// ```
pub mod prelude {
    pub use crate::MessageRecord;

    // Error types
    pub use crate::error::{HarvestError, PlatformError, Result};

    // Configuration
    pub use crate::config::{Credentials, HarvestConfig, RateLimitPolicy};

    // Run models and report
    pub use crate::core::{ChannelOutcome, ChannelSummary, OutputLayout, RunContext, RunReport};

    // Pipeline
    pub use crate::harvest::{AbandonCause, Orchestrator};

    // Platform capability and sources
    pub use crate::platform::{ExportSource, MemorySource, TelegramSource};
}
