//! Output writers.
//!
//! - [`write_json`] / [`to_json`] - JSON array of [`MessageRecord`](crate::MessageRecord)s,
//!   the `messages.json` document of one channel and one run
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> tgharvest::Result<()> {
//! use tgharvest::core::output::write_json;
//! use tgharvest::MessageRecord;
//! use chrono::Utc;
//!
//! let records = vec![MessageRecord::new(1, Utc::now()).with_text("Hello!")];
//! write_json(&records, "messages.json".as_ref()).await?;
//! # Ok(())
//! # }
//! ```

mod json_writer;

pub use json_writer::{to_json, write_json};
