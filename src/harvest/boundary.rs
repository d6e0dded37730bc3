//! Per-channel error boundary.
//!
//! Every channel runs inside [`ChannelBoundary::run`]. Whatever fails in the
//! pipeline is classified here and ends the channel as
//! [`ChannelOutcome::Abandoned`]; nothing escapes to the next channel.
//!
//! ```text
//! Start ──ok──────────────────────────────▶ Completed
//!   │
//!   ├─ RateLimited(W) ─ sleep W ─┬─────────▶ Abandoned   (Abandon)
//!   │                            └─ Start (once)          (RetryOnce)
//!   ├─ Protocol ──────────────────────────▶ Abandoned
//!   └─ anything else ─────────────────────▶ Abandoned
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::RateLimitPolicy;
use crate::core::{ChannelOutcome, ChannelSummary};
use crate::error::{HarvestError, PlatformError};

/// Why a channel produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbandonCause {
    /// The platform demanded a cooldown; the wait was served.
    RateLimited { wait_seconds: u64 },
    /// Platform-level error other than rate limiting.
    Protocol(String),
    /// Any other failure (not found, I/O, serialization).
    Unknown(String),
}

impl AbandonCause {
    /// Classifies a pipeline failure.
    pub fn classify(err: &HarvestError) -> Self {
        match err.as_platform() {
            Some(PlatformError::RateLimited { wait_seconds }) => AbandonCause::RateLimited {
                wait_seconds: *wait_seconds,
            },
            Some(e @ PlatformError::Protocol { .. }) => AbandonCause::Protocol(e.to_string()),
            _ => AbandonCause::Unknown(err.to_string()),
        }
    }
}

impl fmt::Display for AbandonCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonCause::RateLimited { wait_seconds } => {
                write!(f, "rate limited ({wait_seconds}s wait served)")
            }
            AbandonCause::Protocol(message) => write!(f, "Telegram API error: {message}"),
            AbandonCause::Unknown(message) => write!(f, "{message}"),
        }
    }
}

/// Runs one channel's pipeline and turns its result into an outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelBoundary {
    policy: RateLimitPolicy,
}

impl ChannelBoundary {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Runs `attempt` for `channel` until it completes or is abandoned.
    ///
    /// A rate limit suspends for exactly the signaled duration before the
    /// policy decides between abandoning and a single retry.
    pub async fn run<F, Fut>(&self, channel: &str, mut attempt: F) -> ChannelOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ChannelSummary, HarvestError>>,
    {
        let mut retries_left = match self.policy {
            RateLimitPolicy::Abandon => 0,
            RateLimitPolicy::RetryOnce => 1,
        };

        loop {
            let err = match attempt().await {
                Ok(summary) => return ChannelOutcome::Completed(summary),
                Err(err) => err,
            };

            let cause = AbandonCause::classify(&err);
            match &cause {
                AbandonCause::RateLimited { wait_seconds } => {
                    warn!(channel, wait_seconds, "Rate limit hit, waiting before continuing");
                    tokio::time::sleep(Duration::from_secs(*wait_seconds)).await;

                    if retries_left > 0 {
                        retries_left -= 1;
                        info!(channel, "Retrying channel after rate-limit wait");
                        continue;
                    }
                }
                AbandonCause::Protocol(_) => {
                    error!(channel, error = %err, "Telegram API error");
                }
                AbandonCause::Unknown(_) => {
                    error!(channel, error = %err, "Error harvesting channel");
                }
            }

            error!(channel, cause = %cause, "Channel abandoned, no output written");
            return ChannelOutcome::Abandoned {
                identifier: channel.to_string(),
                cause,
            };
        }
    }
}
