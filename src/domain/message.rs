//! Message payloads and archival jobs.
//!
//! A [`Message`] carries everything the worker needs to rebuild an archival
//! record without ever going back to the platform API: content, author
//! identity, raw embeds, attachment locators, and the permanent jump link.

use serde::{Deserialize, Serialize};

use super::{ChannelId, GuildId, MessageId, UserId};

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Raw user id
    pub id: UserId,

    /// Display name at the time of the edit
    pub name: String,

    /// Avatar URL, if the user has one set
    pub avatar_url: Option<String>,
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name
    pub filename: String,

    /// CDN URL of the attachment
    pub url: String,
}

/// A message as observed at edit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id
    pub id: MessageId,

    /// Channel the message lives in
    pub channel_id: ChannelId,

    /// Message author
    pub author: Author,

    /// Plain text content (may be empty for embed-only messages)
    pub content: String,

    /// Whether the message is currently pinned
    pub pinned: bool,

    /// Raw embed objects, forwarded verbatim when archiving
    #[serde(default)]
    pub embeds: Vec<serde_json::Value>,

    /// Attached files
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Permanent link back to the original message
    pub jump_url: String,
}

/// An edit notification delivered by the external event source.
#[derive(Debug, Clone)]
pub struct MessageEdit {
    /// Guild the message belongs to
    pub guild_id: GuildId,

    /// Pinned flag before the edit, if the event source had the
    /// previous revision cached
    pub previous_pinned: Option<bool>,

    /// The message after the edit
    pub message: Message,
}

/// One unit of archival work: a single pinned message bound for the
/// guild's archive channel. Created at enqueue time, consumed and
/// discarded by the worker, never persisted.
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    /// Guild whose route decides the destination
    pub guild_id: GuildId,

    /// The pinned message to archive
    pub message: Message,
}
