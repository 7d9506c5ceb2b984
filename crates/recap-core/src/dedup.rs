//! Per-chat record of external resources already summarized.
//!
//! A resource is recorded only after it was processed successfully, so a
//! failed attempt can be retried. Entries live for the whole process unless a
//! caller prunes them explicitly.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::{RecapError, Result};
use crate::types::ChatId;

/// Storage behind [`DedupCache`].
///
/// `try_reserve` must check and mark atomically per chat.
pub trait SeenStore: Send + Sync {
    /// When the resource was recorded in this chat, if ever.
    fn seen_at(&self, chat_id: ChatId, resource_id: &str) -> Option<DateTime<Utc>>;

    /// Record a successful processing and clear any reservation.
    fn record(&self, chat_id: ChatId, resource_id: &str, at: DateTime<Utc>);

    /// Mark the resource as in flight. Returns `false` when it is already
    /// recorded or already in flight.
    fn try_reserve(&self, chat_id: ChatId, resource_id: &str) -> bool;

    /// Drop an in-flight mark without recording.
    fn release(&self, chat_id: ChatId, resource_id: &str);

    /// Forget entries recorded before `cutoff`. Returns how many were removed.
    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize;
}

#[derive(Debug, Default)]
struct ChatSeen {
    seen: HashMap<String, DateTime<Utc>>,
    in_flight: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemorySeenStore {
    chats: DashMap<ChatId, ChatSeen>,
}

impl InMemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeenStore for InMemorySeenStore {
    fn seen_at(&self, chat_id: ChatId, resource_id: &str) -> Option<DateTime<Utc>> {
        self.chats
            .get(&chat_id)
            .and_then(|chat| chat.seen.get(resource_id).copied())
    }

    fn record(&self, chat_id: ChatId, resource_id: &str, at: DateTime<Utc>) {
        let mut chat = self.chats.entry(chat_id).or_default();
        chat.in_flight.remove(resource_id);
        chat.seen.insert(resource_id.to_string(), at);
    }

    fn try_reserve(&self, chat_id: ChatId, resource_id: &str) -> bool {
        let mut chat = self.chats.entry(chat_id).or_default();
        if chat.seen.contains_key(resource_id) {
            return false;
        }
        chat.in_flight.insert(resource_id.to_string())
    }

    fn release(&self, chat_id: ChatId, resource_id: &str) {
        if let Some(mut chat) = self.chats.get_mut(&chat_id) {
            chat.in_flight.remove(resource_id);
        }
    }

    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for mut chat in self.chats.iter_mut() {
            let before = chat.seen.len();
            chat.seen.retain(|_, at| *at >= cutoff);
            removed += before - chat.seen.len();
        }
        removed
    }
}

/// Rejects repeated processing of the same resource in the same chat.
#[derive(Clone)]
pub struct DedupCache {
    store: Arc<dyn SeenStore>,
}

impl std::fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupCache").finish_non_exhaustive()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(Arc::new(InMemorySeenStore::new()))
    }
}

impl DedupCache {
    pub fn new(store: Arc<dyn SeenStore>) -> Self {
        Self { store }
    }

    /// Fails with [`RecapError::AlreadyProcessed`] if the resource was
    /// recorded for this chat. `override_flag` skips the lookup entirely.
    pub fn check_and_maybe_reject(
        &self,
        chat_id: ChatId,
        resource_id: &str,
        override_flag: bool,
    ) -> Result<()> {
        if override_flag {
            return Ok(());
        }
        if self.store.seen_at(chat_id, resource_id).is_some() {
            tracing::debug!("Seen {} before in chat {}", resource_id, chat_id);
            return Err(already_processed(chat_id, resource_id));
        }
        Ok(())
    }

    /// Record a successful processing.
    pub fn record(&self, chat_id: ChatId, resource_id: &str, at: DateTime<Utc>) {
        self.store.record(chat_id, resource_id, at);
    }

    /// Check and reserve in one atomic step.
    ///
    /// A second request for the same resource is rejected while the first is
    /// still running. With `override_flag` the returned claim neither checks
    /// nor records anything.
    pub fn claim(&self, chat_id: ChatId, resource_id: &str, override_flag: bool) -> Result<DedupClaim> {
        if override_flag {
            return Ok(DedupClaim {
                store: None,
                chat_id,
                resource_id: resource_id.to_string(),
            });
        }
        if !self.store.try_reserve(chat_id, resource_id) {
            tracing::debug!("Seen {} before in chat {}", resource_id, chat_id);
            return Err(already_processed(chat_id, resource_id));
        }
        Ok(DedupClaim {
            store: Some(Arc::clone(&self.store)),
            chat_id,
            resource_id: resource_id.to_string(),
        })
    }

    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        self.store.prune_older_than(cutoff)
    }
}

fn already_processed(chat_id: ChatId, resource_id: &str) -> RecapError {
    RecapError::AlreadyProcessed {
        chat_id,
        resource_id: resource_id.to_string(),
    }
}

/// Reservation returned by [`DedupCache::claim`].
///
/// Dropping it without [`commit`](Self::commit) releases the reservation and
/// leaves no record behind.
#[must_use = "dropping a claim releases it without recording"]
pub struct DedupClaim {
    store: Option<Arc<dyn SeenStore>>,
    chat_id: ChatId,
    resource_id: String,
}

impl DedupClaim {
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn commit(mut self, at: DateTime<Utc>) {
        if let Some(store) = self.store.take() {
            store.record(self.chat_id, &self.resource_id, at);
        }
    }
}

impl Drop for DedupClaim {
    fn drop(&mut self) {
        if let Some(store) = self.store.take() {
            store.release(self.chat_id, &self.resource_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rejects_second_request_unless_overridden() {
        let cache = DedupCache::default();

        assert!(cache.check_and_maybe_reject(1, "v1", false).is_ok());
        cache.record(1, "v1", Utc::now());

        let err = cache.check_and_maybe_reject(1, "v1", false).unwrap_err();
        assert_eq!(
            err,
            RecapError::AlreadyProcessed {
                chat_id: 1,
                resource_id: "v1".to_string()
            }
        );
        assert!(cache.check_and_maybe_reject(1, "v1", true).is_ok());
    }

    #[test]
    fn chats_do_not_share_records() {
        let cache = DedupCache::default();
        cache.record(1, "v1", Utc::now());
        assert!(cache.check_and_maybe_reject(2, "v1", false).is_ok());
    }

    #[test]
    fn check_alone_does_not_record() {
        let cache = DedupCache::default();
        assert!(cache.check_and_maybe_reject(1, "v1", false).is_ok());
        assert!(cache.check_and_maybe_reject(1, "v1", false).is_ok());
    }

    #[test]
    fn committed_claim_records_the_resource() {
        let cache = DedupCache::default();
        let claim = cache.claim(1, "v1", false).unwrap();
        assert_eq!(claim.resource_id(), "v1");
        claim.commit(Utc::now());

        assert!(cache.check_and_maybe_reject(1, "v1", false).is_err());
        assert!(cache.claim(1, "v1", false).is_err());
    }

    #[test]
    fn dropped_claim_leaves_no_record() {
        let cache = DedupCache::default();
        {
            let _claim = cache.claim(1, "v1", false).unwrap();
        }
        assert!(cache.check_and_maybe_reject(1, "v1", false).is_ok());
        assert!(cache.claim(1, "v1", false).is_ok());
    }

    #[test]
    fn in_flight_claim_blocks_a_concurrent_claim() {
        let cache = DedupCache::default();
        let first = cache.claim(1, "v1", false).unwrap();

        assert!(matches!(
            cache.claim(1, "v1", false),
            Err(RecapError::AlreadyProcessed { .. })
        ));
        drop(first);
        assert!(cache.claim(1, "v1", false).is_ok());
    }

    #[test]
    fn override_claim_never_records() {
        let cache = DedupCache::default();
        cache.claim(1, "v1", true).unwrap().commit(Utc::now());
        assert!(cache.check_and_maybe_reject(1, "v1", false).is_ok());
    }

    #[test]
    fn prune_forgets_old_entries_only() {
        let cache = DedupCache::default();
        let now = Utc::now();
        cache.record(1, "old", now - Duration::days(30));
        cache.record(1, "new", now);

        assert_eq!(cache.prune_older_than(now - Duration::days(1)), 1);
        assert!(cache.check_and_maybe_reject(1, "old", false).is_ok());
        assert!(cache.check_and_maybe_reject(1, "new", false).is_err());
    }
}
