//! pinarchiver - Pinned-message archiver for Discord
//!
//! Watches message edits, detects when a message becomes pinned, and
//! republishes a durable copy into the guild's configured archive channel.
//!
//! # Architecture
//!
//! The core is an asynchronous pipeline:
//! - Edit notifications are filtered (pinned? excluded?) and enqueued
//! - An unbounded MPSC queue decouples ingestion from delivery
//! - A single worker loop drains the queue, resolves routing from an
//!   in-memory cache, formats a record, and sends it via the gateway
//!
//! Routing and exclusions are cached in process memory, rehydrated from a
//! SQLite settings store at startup, and written through by the
//! configuration mutators.
//!
//! # Modules
//!
//! - `archive`: the archival pipeline (caches, queue, worker, formatting)
//! - `store`: SQLite-backed settings persistence
//! - `gateway`: delivery gateway traits and the Discord REST client
//! - `domain`: shared data structures
//! - `cli`: administrative command surface

pub mod archive;
pub mod cli;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod store;

// Re-export main types at crate root for convenience
pub use archive::{
    format_record, ArchiveOutcome, ArchiveRecord, ArchiveSummary, BulkArchiveReport,
    IngestOutcome, PinArchiver, WorkerHandle,
};
pub use domain::{ArchiveJob, Attachment, Author, ChannelId, GuildId, Message, MessageEdit};
pub use gateway::{DeliveryGateway, DiscordRestGateway, GatewayError, TextChannel};
pub use store::{GuildSettings, SettingsStore, StoreError};
