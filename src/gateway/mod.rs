//! Delivery gateway interfaces.
//!
//! The archival pipeline talks to the chat platform only through these
//! traits: resolve a channel id to a sendable text channel, send a record
//! into it, and list the pinned messages it holds. The production
//! implementation is the Discord REST client in [`discord`]; tests swap in
//! an in-memory mock.

pub mod discord;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::archive::format::ArchiveRecord;
use crate::domain::{ChannelId, GuildId, Message};

// Re-export the production implementation
pub use discord::DiscordRestGateway;

/// Errors surfaced by gateway calls
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed API payload: {0}")]
    Payload(String),
}

/// Resolves channel ids to sendable channels.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Resolve a channel id.
    ///
    /// Returns `Ok(None)` when the channel does not exist or is not a
    /// sendable text channel — callers treat that as a routing miss, not
    /// an error.
    async fn resolve_channel(
        &self,
        channel_id: ChannelId,
    ) -> Result<Option<Arc<dyn TextChannel>>, GatewayError>;
}

/// A resolved, sendable text channel.
#[async_trait]
pub trait TextChannel: Send + Sync {
    /// The guild this channel belongs to
    fn guild_id(&self) -> GuildId;

    /// Deliver an archival record into the channel
    async fn send_record(&self, record: &ArchiveRecord) -> Result<(), GatewayError>;

    /// List the channel's currently pinned messages, in the order the
    /// platform returns them
    async fn pinned_messages(&self) -> Result<Vec<Message>, GatewayError>;
}
