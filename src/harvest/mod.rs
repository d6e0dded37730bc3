//! The harvesting pipeline.
//!
//! Each configured channel goes through the same stages, sequentially:
//!
//! 1. [`resolve_channel`] maps the identifier to its platform entity
//! 2. [`harvest_messages`] streams up to `message_limit` messages and
//!    extracts [`MessageRecord`](crate::MessageRecord)s, downloading photos
//!    through [`MediaDownloader`] as they come by
//! 3. the records are written to `messages.json`
//!
//! [`ChannelBoundary`] wraps the stages of one channel and turns any failure
//! into an abandoned outcome. [`Orchestrator`] drives the whole run.

pub mod boundary;
pub mod media;
pub mod messages;
pub mod orchestrator;
pub mod resolver;

pub use boundary::{AbandonCause, ChannelBoundary};
pub use media::{MediaDownloadError, MediaDownloader};
pub use messages::{HarvestBatch, extract_record, harvest_messages};
pub use orchestrator::Orchestrator;
pub use resolver::{ResolvedChannel, resolve_channel};
