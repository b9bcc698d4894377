//! Domain types for the pin archiver.
//!
//! This module contains the core data structures:
//! - Message: a Discord message payload as seen at edit time
//! - MessageEdit: the edit notification delivered by the event source
//! - ArchiveJob: one unit of archival work

pub mod message;

// Re-export commonly used types
pub use message::{ArchiveJob, Attachment, Author, Message, MessageEdit};

/// Discord snowflake identifying a guild.
pub type GuildId = u64;

/// Discord snowflake identifying a channel.
pub type ChannelId = u64;

/// Discord snowflake identifying a message.
pub type MessageId = u64;

/// Discord snowflake identifying a user.
pub type UserId = u64;
