//! In-memory routing cache and exclusion set.
//!
//! Both caches sit on the hot path of event ingestion and job processing,
//! so lookups never touch the database. They are rehydrated from the
//! settings store once at startup and written through by the configuration
//! mutators afterwards.

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use crate::domain::{ChannelId, GuildId};

/// Guild → archive channel routing, shared between the configuration
/// mutators and the archival worker.
#[derive(Debug, Default)]
pub struct RouteCache {
    routes: DashMap<GuildId, ChannelId>,
}

impl RouteCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the archive channel configured for a guild
    pub fn lookup(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.routes.get(&guild_id).map(|entry| *entry)
    }

    /// Insert a route if the guild has none yet.
    ///
    /// Returns `true` if the route was newly inserted. An existing route is
    /// left untouched; callers replace a route by removing it first.
    pub fn insert(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        match self.routes.entry(guild_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(channel_id);
                true
            }
        }
    }

    /// Remove the route for a guild, returning the previous destination
    pub fn remove(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.routes.remove(&guild_id).map(|(_, channel_id)| channel_id)
    }

    /// Replace the entire cache content from a bulk store read.
    ///
    /// Startup only: callers must not consult the cache until this returns.
    pub fn rehydrate(&self, entries: impl IntoIterator<Item = (GuildId, ChannelId)>) {
        self.routes.clear();
        for (guild_id, channel_id) in entries {
            self.routes.insert(guild_id, channel_id);
        }
    }

    /// Number of configured routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are configured
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Channels excluded from archiving, keyed by channel id alone since a
/// channel belongs to exactly one guild.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    channels: DashSet<ChannelId>,
}

impl ExclusionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a channel is excluded from archiving
    pub fn contains(&self, channel_id: ChannelId) -> bool {
        self.channels.contains(&channel_id)
    }

    /// Add an exclusion, returning `true` if it was newly added
    pub fn insert(&self, channel_id: ChannelId) -> bool {
        self.channels.insert(channel_id)
    }

    /// Remove an exclusion, returning `true` if it was present
    pub fn remove(&self, channel_id: ChannelId) -> bool {
        self.channels.remove(&channel_id).is_some()
    }

    /// Replace the entire set content from a bulk store read (startup only)
    pub fn rehydrate(&self, channels: impl IntoIterator<Item = ChannelId>) {
        self.channels.clear();
        for channel_id in channels {
            self.channels.insert(channel_id);
        }
    }

    /// Number of excluded channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are excluded
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_first_writer_wins() {
        let cache = RouteCache::new();

        assert!(cache.insert(42, 100));
        assert!(!cache.insert(42, 200));

        // The losing insert must not overwrite the existing route
        assert_eq!(cache.lookup(42), Some(100));
    }

    #[test]
    fn test_remove_returns_previous_destination() {
        let cache = RouteCache::new();
        cache.insert(42, 100);

        assert_eq!(cache.remove(42), Some(100));
        assert_eq!(cache.remove(42), None);
        assert_eq!(cache.lookup(42), None);
    }

    #[test]
    fn test_rehydrate_replaces_content() {
        let cache = RouteCache::new();
        cache.insert(1, 10);

        cache.rehydrate(vec![(2, 20), (3, 30)]);

        assert_eq!(cache.lookup(1), None);
        assert_eq!(cache.lookup(2), Some(20));
        assert_eq!(cache.lookup(3), Some(30));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_exclusion_round_trip_is_a_no_op() {
        let set = ExclusionSet::new();

        assert!(set.insert(7));
        assert!(!set.insert(7));
        assert!(set.contains(7));

        assert!(set.remove(7));
        assert!(!set.remove(7));
        assert!(!set.contains(7));
        assert!(set.is_empty());
    }

    #[test]
    fn test_exclusion_rehydrate() {
        let set = ExclusionSet::new();
        set.insert(1);

        set.rehydrate(vec![7, 8]);

        assert!(!set.contains(1));
        assert!(set.contains(7));
        assert!(set.contains(8));
        assert_eq!(set.len(), 2);
    }
}
