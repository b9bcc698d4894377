//! The pin archival pipeline.
//!
//! [`PinArchiver`] ties the pieces together: the in-memory routing cache
//! and exclusion set, the write-through configuration mutators, the edit
//! ingestion filter feeding the job queue, and the per-job archive path
//! the worker loop runs.

pub mod cache;
pub mod format;
pub mod queue;
pub mod worker;

// Re-export commonly used types
pub use cache::{ExclusionSet, RouteCache};
pub use format::{format_record, ArchiveRecord, ArchiveSummary};
pub use queue::{JobReceiver, JobSender};
pub use worker::WorkerHandle;

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::domain::{ArchiveJob, ChannelId, GuildId, MessageEdit};
use crate::gateway::{DeliveryGateway, GatewayError};
use crate::store::{SettingsStore, StoreError};

/// How the ingestion filter handled an edit notification.
///
/// Discards are normal branches, not errors: the event source has no
/// return channel to act on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The message is pinned and a job was enqueued
    Enqueued,

    /// The message is not pinned
    NotPinned,

    /// The source channel is excluded from archiving
    Excluded,

    /// The worker has shut down and the queue is gone
    WorkerGone,
}

/// How a single archival job was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The record was delivered to the archive channel
    Delivered,

    /// The guild has no archive channel configured
    NoRoute,

    /// The destination could not be resolved to a sendable text channel
    UnresolvedChannel,

    /// The delivery gateway rejected the send; logged and dropped
    SendFailed,
}

/// Result of a bulk archive-on-demand run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkArchiveReport {
    /// Pinned messages found in the channel
    pub pinned: usize,

    /// Records actually delivered
    pub delivered: usize,
}

/// The archival service.
///
/// Explicitly owned and injected: collaborators receive a shared handle
/// rather than reaching for a global, so tests can build isolated
/// instances against a scratch store and a mock gateway.
pub struct PinArchiver {
    routes: RouteCache,
    exclusions: ExclusionSet,
    store: SettingsStore,
    gateway: Arc<dyn DeliveryGateway>,
    jobs: JobSender,
}

impl PinArchiver {
    /// Create the service with empty caches and a wired job queue.
    ///
    /// The returned [`JobReceiver`] is handed to [`worker::spawn`] (or
    /// drained directly in tests). Call [`rehydrate`](Self::rehydrate)
    /// before processing anything.
    pub fn new(
        store: SettingsStore,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> (Arc<Self>, JobReceiver) {
        let (jobs, receiver) = queue::channel();
        let archiver = Arc::new(Self {
            routes: RouteCache::new(),
            exclusions: ExclusionSet::new(),
            store,
            gateway,
            jobs,
        });
        (archiver, receiver)
    }

    /// Create, rehydrate, and start the worker loop.
    ///
    /// Rehydration failure is fatal here: the worker must not run against
    /// an unknown cache state.
    pub async fn start(
        store: SettingsStore,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> Result<(Arc<Self>, WorkerHandle), StoreError> {
        let (archiver, jobs) = Self::new(store, gateway);
        archiver.rehydrate().await?;
        let handle = worker::spawn(archiver.clone(), jobs);
        Ok((archiver, handle))
    }

    /// Replace both caches from a bulk read of the settings store
    pub async fn rehydrate(&self) -> Result<(), StoreError> {
        let routes = self.store.load_routes().await?;
        let exclusions = self.store.load_exclusions().await?;

        self.routes.rehydrate(routes);
        self.exclusions
            .rehydrate(exclusions.into_iter().map(|(_, channel_id)| channel_id));

        info!(
            routes = self.routes.len(),
            exclusions = self.exclusions.len(),
            "caches rehydrated from settings store"
        );
        Ok(())
    }

    /// Enable archiving for a guild, replacing any existing route.
    ///
    /// Any previous route is removed first (cache and store), then the new
    /// one is inserted into the cache; the store write only happens if the
    /// cache insert was new, so a concurrent enable that got there first
    /// turns this call into a no-op rather than a duplicate-key failure.
    pub async fn enable_archiving(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        self.disable_archiving(guild_id).await?;

        if !self.routes.insert(guild_id, channel_id) {
            return Ok(());
        }

        info!(guild_id, channel_id, "archiving enabled");
        self.store.insert_route(guild_id, channel_id).await
    }

    /// Disable archiving for a guild. No-op if no route exists.
    pub async fn disable_archiving(&self, guild_id: GuildId) -> Result<(), StoreError> {
        if self.routes.remove(guild_id).is_none() {
            return Ok(());
        }

        info!(guild_id, "archiving disabled");
        self.store.delete_route(guild_id).await?;
        Ok(())
    }

    /// Exclude a channel from archiving. No-op if already excluded.
    pub async fn exclude_source(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        if !self.exclusions.insert(channel_id) {
            return Ok(());
        }

        debug!(channel_id, "excluding channel from archiving");
        self.store.insert_exclusion(guild_id, channel_id).await
    }

    /// Re-include a channel. No-op if it was not excluded.
    pub async fn include_source(&self, channel_id: ChannelId) -> Result<(), StoreError> {
        if !self.exclusions.remove(channel_id) {
            return Ok(());
        }

        debug!(channel_id, "re-including channel for archiving");
        self.store.delete_exclusion(channel_id).await?;
        Ok(())
    }

    /// Ingest an edit notification from the event source.
    ///
    /// Never blocks: pinned messages from non-excluded channels are
    /// enqueued onto the unbounded queue, everything else is discarded.
    pub fn on_message_edited(&self, edit: MessageEdit) -> IngestOutcome {
        if !edit.message.pinned {
            return IngestOutcome::NotPinned;
        }
        if self.exclusions.contains(edit.message.channel_id) {
            debug!(
                channel_id = edit.message.channel_id,
                message_id = edit.message.id,
                "channel excluded, skipping pinned message"
            );
            return IngestOutcome::Excluded;
        }

        let enqueued = self.jobs.enqueue(ArchiveJob {
            guild_id: edit.guild_id,
            message: edit.message,
        });
        if enqueued {
            IngestOutcome::Enqueued
        } else {
            IngestOutcome::WorkerGone
        }
    }

    /// Archive a single job: look up the route, resolve the destination,
    /// format, and send. Every miss along the way drops the job as a
    /// normal branch; only a rejected send is logged as an error.
    pub async fn archive(&self, job: ArchiveJob) -> ArchiveOutcome {
        let Some(destination) = self.routes.lookup(job.guild_id) else {
            debug!(guild_id = job.guild_id, "no archive channel configured, dropping job");
            return ArchiveOutcome::NoRoute;
        };

        info!(
            message_id = job.message.id,
            author_id = job.message.author.id,
            "archiving message"
        );

        let channel = match self.gateway.resolve_channel(destination).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                info!(channel_id = destination, "archive channel not sendable, dropping job");
                return ArchiveOutcome::UnresolvedChannel;
            }
            Err(e) => {
                info!(channel_id = destination, error = %e, "could not resolve archive channel, dropping job");
                return ArchiveOutcome::UnresolvedChannel;
            }
        };

        let record = format_record(&job.message);
        if let Err(e) = channel.send_record(&record).await {
            error!(error = %e, "failed to send message to archive channel");
            return ArchiveOutcome::SendFailed;
        }

        ArchiveOutcome::Delivered
    }

    /// Archive every currently pinned message in a channel, bypassing the
    /// queue and the exclusion filter — an explicit request overrides both.
    pub async fn archive_all(
        &self,
        channel_id: ChannelId,
    ) -> Result<BulkArchiveReport, GatewayError> {
        let Some(channel) = self.gateway.resolve_channel(channel_id).await? else {
            info!(channel_id, "channel not resolvable, nothing to archive");
            return Ok(BulkArchiveReport::default());
        };

        let pinned = channel.pinned_messages().await?;
        let guild_id = channel.guild_id();

        let mut report = BulkArchiveReport {
            pinned: pinned.len(),
            delivered: 0,
        };
        for message in pinned {
            let outcome = self.archive(ArchiveJob { guild_id, message }).await;
            if outcome == ArchiveOutcome::Delivered {
                report.delivered += 1;
            }
        }

        Ok(report)
    }

    /// Cache read: the archive channel currently routed for a guild
    pub fn route_for(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.routes.lookup(guild_id)
    }

    /// Cache read: whether a channel is currently excluded
    pub fn is_excluded(&self, channel_id: ChannelId) -> bool {
        self.exclusions.contains(channel_id)
    }

    /// The underlying settings store (for the read-only settings query)
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::domain::ChannelId;
    use crate::gateway::{DeliveryGateway, GatewayError, TextChannel};

    /// Gateway that resolves nothing; for tests that never reach delivery
    pub(crate) struct NullGateway;

    #[async_trait]
    impl DeliveryGateway for NullGateway {
        async fn resolve_channel(
            &self,
            _channel_id: ChannelId,
        ) -> Result<Option<Arc<dyn TextChannel>>, GatewayError> {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::NullGateway;
    use super::*;
    use crate::domain::{Author, Message};
    use tempfile::TempDir;

    async fn test_archiver() -> (Arc<PinArchiver>, JobReceiver, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::open(temp.path().join("settings.db"))
            .await
            .unwrap();
        let (archiver, jobs) = PinArchiver::new(store, Arc::new(NullGateway));
        archiver.rehydrate().await.unwrap();
        (archiver, jobs, temp)
    }

    fn edit(guild_id: GuildId, channel_id: ChannelId, pinned: bool) -> MessageEdit {
        MessageEdit {
            guild_id,
            previous_pinned: Some(false),
            message: Message {
                id: 111,
                channel_id,
                author: Author {
                    id: 9,
                    name: "maya".to_string(),
                    avatar_url: None,
                },
                content: "hello".to_string(),
                pinned,
                embeds: vec![],
                attachments: vec![],
                jump_url: format!("https://discord.com/channels/{guild_id}/{channel_id}/111"),
            },
        }
    }

    #[tokio::test]
    async fn test_enable_writes_through_to_store() {
        let (archiver, _jobs, _temp) = test_archiver().await;

        archiver.enable_archiving(42, 100).await.unwrap();

        assert_eq!(archiver.route_for(42), Some(100));
        assert_eq!(archiver.store().load_routes().await.unwrap(), vec![(42, 100)]);
    }

    #[tokio::test]
    async fn test_reenable_replaces_route() {
        let (archiver, _jobs, _temp) = test_archiver().await;

        archiver.enable_archiving(42, 100).await.unwrap();
        archiver.enable_archiving(42, 200).await.unwrap();

        assert_eq!(archiver.route_for(42), Some(200));
        // Exactly one row, pointing at the new destination
        assert_eq!(archiver.store().load_routes().await.unwrap(), vec![(42, 200)]);
    }

    #[tokio::test]
    async fn test_disable_is_noop_when_absent() {
        let (archiver, _jobs, _temp) = test_archiver().await;

        archiver.disable_archiving(42).await.unwrap();
        assert!(archiver.store().load_routes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exclude_include_round_trip() {
        let (archiver, _jobs, _temp) = test_archiver().await;

        archiver.exclude_source(42, 7).await.unwrap();
        assert!(archiver.is_excluded(7));

        // Double exclusion is a silent no-op
        archiver.exclude_source(42, 7).await.unwrap();
        assert_eq!(archiver.store().load_exclusions().await.unwrap().len(), 1);

        archiver.include_source(7).await.unwrap();
        assert!(!archiver.is_excluded(7));
        assert!(archiver.store().load_exclusions().await.unwrap().is_empty());

        // Double inclusion likewise
        archiver.include_source(7).await.unwrap();
    }

    #[tokio::test]
    async fn test_ingest_filters_unpinned() {
        let (archiver, mut jobs, _temp) = test_archiver().await;

        assert_eq!(
            archiver.on_message_edited(edit(42, 7, false)),
            IngestOutcome::NotPinned
        );
        assert!(jobs.try_next().is_none());
    }

    #[tokio::test]
    async fn test_ingest_filters_excluded_channel() {
        let (archiver, mut jobs, _temp) = test_archiver().await;
        archiver.exclude_source(42, 7).await.unwrap();

        assert_eq!(
            archiver.on_message_edited(edit(42, 7, true)),
            IngestOutcome::Excluded
        );
        assert!(jobs.try_next().is_none());
    }

    #[tokio::test]
    async fn test_ingest_enqueues_pinned() {
        let (archiver, mut jobs, _temp) = test_archiver().await;

        assert_eq!(
            archiver.on_message_edited(edit(42, 7, true)),
            IngestOutcome::Enqueued
        );

        let job = jobs.try_next().unwrap();
        assert_eq!(job.guild_id, 42);
        assert_eq!(job.message.id, 111);
    }

    #[tokio::test]
    async fn test_archive_without_route_is_noop() {
        let (archiver, _jobs, _temp) = test_archiver().await;

        let job = ArchiveJob {
            guild_id: 42,
            message: edit(42, 7, true).message,
        };
        assert_eq!(archiver.archive(job).await, ArchiveOutcome::NoRoute);
    }

    #[tokio::test]
    async fn test_rehydrate_restores_caches() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.db");

        let store = SettingsStore::open(&path).await.unwrap();
        store.insert_route(42, 100).await.unwrap();
        store.insert_exclusion(42, 7).await.unwrap();

        let (archiver, _jobs) = PinArchiver::new(store, Arc::new(NullGateway));
        assert_eq!(archiver.route_for(42), None);

        archiver.rehydrate().await.unwrap();
        assert_eq!(archiver.route_for(42), Some(100));
        assert!(archiver.is_excluded(7));
    }
}
