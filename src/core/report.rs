//! Per-channel outcomes and the run summary.

use std::path::PathBuf;

use crate::harvest::AbandonCause;

/// Statistics about one completed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    /// Identifier from the configuration
    pub identifier: String,
    /// Key used for the output paths (handle or identifier)
    pub key: String,
    /// Records written to `messages.json`
    pub records: usize,
    /// Records flagged as carrying media
    pub with_media: usize,
    /// Photos downloaded
    pub images: usize,
    /// Photos whose download failed
    pub failed_images: usize,
    /// The written `messages.json`
    pub messages_file: PathBuf,
}

/// Terminal state of one channel's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Output was written.
    Completed(ChannelSummary),
    /// No output was written; the cause was logged.
    Abandoned {
        identifier: String,
        cause: AbandonCause,
    },
}

impl ChannelOutcome {
    pub fn identifier(&self) -> &str {
        match self {
            ChannelOutcome::Completed(summary) => &summary.identifier,
            ChannelOutcome::Abandoned { identifier, .. } => identifier,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ChannelOutcome::Completed(_))
    }

    pub fn summary(&self) -> Option<&ChannelSummary> {
        match self {
            ChannelOutcome::Completed(summary) => Some(summary),
            ChannelOutcome::Abandoned { .. } => None,
        }
    }

    pub fn abandon_cause(&self) -> Option<&AbandonCause> {
        match self {
            ChannelOutcome::Completed(_) => None,
            ChannelOutcome::Abandoned { cause, .. } => Some(cause),
        }
    }
}

/// Outcome of every channel in one run, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Date token of the run
    pub date: String,
    pub outcomes: Vec<ChannelOutcome>,
}

impl RunReport {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: ChannelOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn abandoned(&self) -> usize {
        self.outcomes.len() - self.completed()
    }

    /// Records written across all completed channels.
    pub fn total_records(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(ChannelOutcome::summary)
            .map(|s| s.records)
            .sum()
    }

    /// Photos downloaded across all completed channels.
    pub fn total_images(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(ChannelOutcome::summary)
            .map(|s| s.images)
            .sum()
    }

    /// Returns the outcome for a configured identifier.
    pub fn outcome(&self, identifier: &str) -> Option<&ChannelOutcome> {
        self.outcomes.iter().find(|o| o.identifier() == identifier)
    }
}
