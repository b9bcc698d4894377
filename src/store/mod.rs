//! SQLite-backed settings store.
//!
//! Two tables survive restarts: `archive_channels` (one route per guild)
//! and `excluded_channels` (keyed by channel id, which is globally unique).
//! Every logical operation opens its own connection inside
//! `spawn_blocking`, uses it, and releases it — no long-lived transaction
//! ever spans operations.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::domain::{ChannelId, GuildId};

/// Errors that can occur talking to the settings store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS archive_channels (
    guild_id   INTEGER PRIMARY KEY,
    channel_id INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS excluded_channels (
    channel_id INTEGER PRIMARY KEY,
    guild_id   INTEGER NOT NULL
);
";

/// Per-guild configuration as read directly from the store.
///
/// The settings query bypasses the in-memory caches because it needs the
/// per-guild exclusion listing, which the caches do not index by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    /// Configured archive channel, if archiving is enabled
    pub archive_channel: Option<ChannelId>,

    /// Channels excluded from archiving in this guild
    pub excluded_channels: Vec<ChannelId>,
}

/// Handle to the SQLite settings database.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Open the store at the given path, creating the file and schema if
    /// they do not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let store = Self { path };
        store
            .with_conn(|conn| conn.execute_batch(SCHEMA))
            .await?;
        Ok(store)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a closure against a connection scoped to this one operation
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || -> rusqlite::Result<T> {
            let conn = Connection::open(&path)?;
            f(&conn)
        })
        .await?;
        Ok(result?)
    }

    /// Bulk-read all routes for cache rehydration
    pub async fn load_routes(&self) -> Result<Vec<(GuildId, ChannelId)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT guild_id, channel_id FROM archive_channels")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64))
            })?;
            rows.collect()
        })
        .await
    }

    /// Bulk-read all exclusions for cache rehydration
    pub async fn load_exclusions(&self) -> Result<Vec<(GuildId, ChannelId)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT guild_id, channel_id FROM excluded_channels")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64))
            })?;
            rows.collect()
        })
        .await
    }

    /// Persist a new route for a guild
    pub async fn insert_route(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO archive_channels (guild_id, channel_id) VALUES (?1, ?2)",
                params![guild_id as i64, channel_id as i64],
            )?;
            Ok(())
        })
        .await
    }

    /// Delete the route for a guild, keyed solely by guild id.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_route(&self, guild_id: GuildId) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM archive_channels WHERE guild_id = ?1",
                params![guild_id as i64],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Persist a new exclusion
    pub async fn insert_exclusion(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO excluded_channels (channel_id, guild_id) VALUES (?1, ?2)",
                params![channel_id as i64, guild_id as i64],
            )?;
            Ok(())
        })
        .await
    }

    /// Delete an exclusion by channel id, returning `true` if it existed
    pub async fn delete_exclusion(&self, channel_id: ChannelId) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM excluded_channels WHERE channel_id = ?1",
                params![channel_id as i64],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Read a guild's archive channel and exclusion list directly from the
    /// database
    pub async fn guild_settings(&self, guild_id: GuildId) -> Result<GuildSettings, StoreError> {
        self.with_conn(move |conn| {
            let archive_channel = conn
                .query_row(
                    "SELECT channel_id FROM archive_channels WHERE guild_id = ?1",
                    params![guild_id as i64],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .map(|id| id as u64);

            let mut stmt = conn.prepare(
                "SELECT channel_id FROM excluded_channels WHERE guild_id = ?1 ORDER BY channel_id",
            )?;
            let excluded_channels = stmt
                .query_map(params![guild_id as i64], |row| {
                    Ok(row.get::<_, i64>(0)? as u64)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(GuildSettings {
                archive_channel,
                excluded_channels,
            })
        })
        .await
    }
}
