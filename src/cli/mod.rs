//! Command-line interface for the pin archiver.
//!
//! The administrative command surface: enabling and disabling per-guild
//! archiving, managing channel exclusions, inspecting a guild's settings,
//! and running a bulk archive of a channel's current pins.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::archive::{JobReceiver, PinArchiver};
use crate::config::Settings;
use crate::domain::{ChannelId, GuildId};
use crate::gateway::DiscordRestGateway;
use crate::store::SettingsStore;

/// pinarchiver - archive pinned Discord messages
#[derive(Parser, Debug)]
#[command(name = "pinarchiver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enable archiving of pinned messages for a guild
    Enable {
        /// Guild id
        guild_id: GuildId,

        /// Text channel to archive pins into
        channel_id: ChannelId,
    },

    /// Disable archiving for a guild
    Disable {
        /// Guild id
        guild_id: GuildId,
    },

    /// Exclude a channel from archiving
    Exclude {
        /// Guild the channel belongs to
        guild_id: GuildId,

        /// Channel to exclude
        channel_id: ChannelId,
    },

    /// Re-include a previously excluded channel
    Include {
        /// Channel to include again
        channel_id: ChannelId,
    },

    /// Show a guild's archive settings
    Settings {
        /// Guild id
        guild_id: GuildId,
    },

    /// Archive every currently pinned message in a channel
    ArchiveAll {
        /// Channel whose pins should be archived
        channel_id: ChannelId,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load()?;

        match self.command {
            Commands::Enable {
                guild_id,
                channel_id,
            } => {
                let (archiver, _jobs) = build_archiver(&settings).await?;
                archiver.enable_archiving(guild_id, channel_id).await?;
                println!("Archiving pins of guild {guild_id} to channel {channel_id}");
                Ok(())
            }
            Commands::Disable { guild_id } => {
                let (archiver, _jobs) = build_archiver(&settings).await?;
                archiver.disable_archiving(guild_id).await?;
                println!("Archiving disabled for guild {guild_id}");
                Ok(())
            }
            Commands::Exclude {
                guild_id,
                channel_id,
            } => {
                let (archiver, _jobs) = build_archiver(&settings).await?;
                archiver.exclude_source(guild_id, channel_id).await?;
                println!("Channel {channel_id} excluded from archiving");
                Ok(())
            }
            Commands::Include { channel_id } => {
                let (archiver, _jobs) = build_archiver(&settings).await?;
                archiver.include_source(channel_id).await?;
                println!("Channel {channel_id} included for archiving");
                Ok(())
            }
            Commands::Settings { guild_id } => show_settings(&settings, guild_id).await,
            Commands::ArchiveAll { channel_id } => {
                let (archiver, _jobs) = build_archiver(&settings).await?;
                let report = archiver
                    .archive_all(channel_id)
                    .await
                    .context("Bulk archive failed")?;
                println!(
                    "Archived {} of {} pinned messages",
                    report.delivered, report.pinned
                );
                Ok(())
            }
        }
    }
}

/// Open the store, build the Discord gateway, and rehydrate the caches
async fn build_archiver(settings: &Settings) -> Result<(Arc<PinArchiver>, JobReceiver)> {
    let store = SettingsStore::open(&settings.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open settings database: {}",
                settings.database_path.display()
            )
        })?;

    let mut gateway = DiscordRestGateway::new(settings.token.clone());
    if let Some(base) = &settings.api_base {
        gateway = gateway.with_base_url(base.clone());
    }

    let (archiver, jobs) = PinArchiver::new(store, Arc::new(gateway));
    archiver
        .rehydrate()
        .await
        .context("Failed to load settings from the database")?;

    Ok((archiver, jobs))
}

/// Print a guild's archive channel and exclusion list.
///
/// Reads the store directly: the settings view needs the per-guild
/// exclusion listing, which the in-memory caches do not index by.
async fn show_settings(settings: &Settings, guild_id: GuildId) -> Result<()> {
    let store = SettingsStore::open(&settings.database_path).await?;
    let guild = store.guild_settings(guild_id).await?;

    match guild.archive_channel {
        Some(channel_id) => println!("Archive channel: {channel_id}"),
        None => println!("Archive channel: unset"),
    }

    if guild.excluded_channels.is_empty() {
        println!("Excluded channels: none");
    } else {
        println!("Excluded channels:");
        for channel_id in guild.excluded_channels {
            println!("  {channel_id}");
        }
    }

    Ok(())
}
