//! Channel resolution.

use tracing::{debug, warn};

use crate::config::validate_channel_identifier;
use crate::core::Channel;
use crate::error::PlatformError;
use crate::platform::{ResolvedEntity, TelegramSource};

/// A configured channel together with its platform entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub channel: Channel,
    pub entity: ResolvedEntity,
}

/// Resolves `identifier` through the source.
///
/// The platform username becomes the channel handle. Without a username (or
/// with one that cannot be used as a directory name) the configured
/// identifier stays the output key. Errors are returned as-is; there is no
/// retry here.
pub async fn resolve_channel<S>(source: &S, identifier: &str) -> Result<ResolvedChannel, PlatformError>
where
    S: TelegramSource + ?Sized,
{
    let entity = source.resolve(identifier).await?;

    let mut channel = Channel::new(identifier);
    match entity.username.as_deref() {
        Some(username) if validate_channel_identifier(username).is_ok() => {
            channel = channel.with_handle(username);
        }
        Some(username) => {
            warn!(
                channel = identifier,
                username, "platform username is not usable as a path, keeping identifier"
            );
        }
        None => debug!(channel = identifier, "no username reported, keeping identifier"),
    }

    Ok(ResolvedChannel { channel, entity })
}
