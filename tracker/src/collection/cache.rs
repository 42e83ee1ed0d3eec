use crate::types::{CollectionSnapshot, Identity, TokenId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf, time::Duration};
use tokio::sync::RwLock;

/// Identity-only projection of a snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub captured_at: DateTime<Utc>,
    pub identities: BTreeMap<TokenId, Identity>,
}

impl CacheEntry {
    pub fn capture(snapshot: &CollectionSnapshot, captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            identities: snapshot
                .tokens
                .iter()
                .map(|token| (token.id, token.identity.clone()))
                .collect(),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.captured_at) < ttl,
            Err(_) => true,
        }
    }
}

/// Identity fields come from `cache` when it is still fresh, market fields
/// and the set of ids always come from `fresh`.
pub fn merge(
    mut fresh: CollectionSnapshot,
    cache: Option<&CacheEntry>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> CollectionSnapshot {
    let cache = match cache {
        Some(entry) if entry.is_fresh(now, ttl) => entry,
        _ => return fresh,
    };

    for token in fresh.tokens.iter_mut() {
        if let Some(identity) = cache.identities.get(&token.id) {
            token.identity = identity.clone();
        }
    }

    fresh
}

/// The process-wide cache slot, optionally mirrored to a JSON file.
pub struct MetadataCache {
    slot: RwLock<Option<CacheEntry>>,
    path: Option<PathBuf>,
}

impl MetadataCache {
    pub fn in_memory() -> Self {
        Self {
            slot: RwLock::new(None),
            path: None,
        }
    }

    /// Starts from the file at `path` when it holds a readable entry.
    pub async fn load(path: Option<PathBuf>) -> Self {
        let entry = match &path {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                    Ok(entry) => {
                        log::info!(
                            "loaded {} cached identities from {}",
                            entry.identities.len(),
                            path.display()
                        );
                        Some(entry)
                    }
                    Err(e) => {
                        log::warn!("ignoring unreadable cache {}: {e}", path.display());
                        None
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => {
                    log::warn!("failed to read cache {}: {e}", path.display());
                    None
                }
            },
            None => None,
        };

        Self {
            slot: RwLock::new(entry),
            path,
        }
    }

    pub async fn entry(&self) -> Option<CacheEntry> {
        self.slot.read().await.clone()
    }

    /// Merges `fresh` against the stored entry and replaces the entry with the
    /// result, all under the write lock. An empty snapshot is never stored and
    /// neither is one fetched before the stored entry was captured.
    pub async fn merge_and_store(
        &self,
        fresh: CollectionSnapshot,
        ttl: Duration,
        force_refresh: bool,
    ) -> CollectionSnapshot {
        let mut slot = self.slot.write().await;

        let captured_at = fresh.fetched_at;
        let merged = if force_refresh {
            fresh
        } else {
            merge(fresh, (*slot).as_ref(), Utc::now(), ttl)
        };

        if merged.is_empty() {
            return merged;
        }

        if let Some(current) = (*slot).as_ref() {
            if current.captured_at > captured_at {
                log::debug!("discarding cache write older than the stored entry");
                return merged;
            }
        }

        let entry = CacheEntry::capture(&merged, captured_at);
        self.persist(&entry).await;
        *slot = Some(entry);

        merged
    }

    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;

        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => log::info!("removed cache file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("failed to remove cache {}: {e}", path.display()),
            }
        }
    }

    async fn persist(&self, entry: &CacheEntry) {
        let path = match &self.path {
            Some(path) => path,
            None => return,
        };

        let bytes = match serde_json::to_vec(entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("failed to serialize cache: {e}");
                return;
            }
        };

        let tmp = path.with_extension("tmp");
        let written = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            log::warn!("failed to write cache {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod test {
    use super::{merge, CacheEntry, MetadataCache};
    use crate::types::{CollectionSnapshot, Identity, MarketData, Token};
    use chrono::{Duration as ChronoDuration, Utc};
    use std::time::Duration;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn token(id: u32, name: &str, floor: f64) -> Token {
        Token {
            id,
            identity: Identity {
                name: name.to_string(),
                artist: "artist".to_string(),
                image_url: format!("{id}.png"),
                thumbnail_url: format!("{id}_t.png"),
            },
            market: MarketData {
                floor_price: floor,
                ..Default::default()
            },
        }
    }

    fn snapshot(tokens: Vec<Token>) -> CollectionSnapshot {
        CollectionSnapshot {
            tokens,
            season_size: 100,
            fetched_at: Utc::now(),
            complete: true,
        }
    }

    fn cached() -> CacheEntry {
        CacheEntry::capture(
            &snapshot(vec![token(1, "cached one", 9.0), token(2, "cached two", 9.0)]),
            Utc::now(),
        )
    }

    #[test]
    fn identity_from_cache_market_from_fresh() {
        let fresh = snapshot(vec![token(1, "fresh one", 0.5)]);

        let merged = merge(fresh, Some(&cached()), Utc::now(), WEEK);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.tokens[0].identity.name, "cached one");
        assert_eq!(merged.tokens[0].market.floor_price, 0.5);
    }

    #[test]
    fn ids_are_never_synthesized() {
        let fresh = snapshot(vec![token(3, "three", 0.1)]);

        let merged = merge(fresh.clone(), Some(&cached()), Utc::now(), WEEK);

        assert_eq!(merged, fresh);
    }

    #[test]
    fn expired_cache_is_no_cache() {
        let fresh = snapshot(vec![token(1, "fresh one", 0.5)]);
        let mut stale = cached();
        stale.captured_at = Utc::now() - ChronoDuration::days(8);

        assert_eq!(
            merge(fresh.clone(), Some(&stale), Utc::now(), WEEK),
            merge(fresh.clone(), None, Utc::now(), WEEK)
        );
        assert_eq!(merge(fresh.clone(), None, Utc::now(), WEEK), fresh);
    }

    #[test]
    fn merge_is_idempotent() {
        let fresh = snapshot(vec![token(1, "fresh one", 0.5), token(4, "four", 1.0)]);
        let cache = cached();
        let now = Utc::now();

        let once = merge(fresh, Some(&cache), now, WEEK);
        let twice = merge(once.clone(), Some(&cache), now, WEEK);

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn slot_refuses_older_writes() {
        let cache = MetadataCache::in_memory();

        let newer = snapshot(vec![token(1, "newer", 0.1)]);
        let mut older = snapshot(vec![token(1, "older", 0.2)]);
        older.fetched_at = newer.fetched_at - ChronoDuration::seconds(30);

        cache.merge_and_store(newer, WEEK, true).await;
        let served = cache.merge_and_store(older, WEEK, true).await;

        assert_eq!(served.tokens[0].identity.name, "older");
        assert_eq!(
            cache.entry().await.unwrap().identities[&1].name,
            "newer"
        );
    }

    #[tokio::test]
    async fn empty_snapshot_is_not_stored() {
        let cache = MetadataCache::in_memory();
        cache
            .merge_and_store(snapshot(vec![token(1, "one", 0.1)]), WEEK, false)
            .await;

        cache.merge_and_store(snapshot(vec![]), WEEK, false).await;

        assert_eq!(cache.entry().await.unwrap().identities.len(), 1);
    }

    #[tokio::test]
    async fn force_refresh_skips_merge_but_writes() {
        let cache = MetadataCache::in_memory();
        cache
            .merge_and_store(snapshot(vec![token(1, "first", 0.1)]), WEEK, false)
            .await;

        let merged = cache
            .merge_and_store(snapshot(vec![token(1, "renamed", 0.2)]), WEEK, false)
            .await;
        assert_eq!(merged.tokens[0].identity.name, "first");

        let forced = cache
            .merge_and_store(snapshot(vec![token(1, "renamed", 0.3)]), WEEK, true)
            .await;
        assert_eq!(forced.tokens[0].identity.name, "renamed");
        assert_eq!(cache.entry().await.unwrap().identities[&1].name, "renamed");
    }

    #[tokio::test]
    async fn persisted_across_loads() {
        let path = std::env::temp_dir().join(format!(
            "memes-cache-{}-{}.json",
            std::process::id(),
            Utc::now().timestamp_subsec_nanos()
        ));

        let cache = MetadataCache::load(Some(path.clone())).await;
        assert!(cache.entry().await.is_none());
        cache
            .merge_and_store(snapshot(vec![token(7, "seven", 0.1)]), WEEK, false)
            .await;

        let reloaded = MetadataCache::load(Some(path.clone())).await;
        assert_eq!(reloaded.entry().await, cache.entry().await);

        reloaded.clear().await;
        assert!(reloaded.entry().await.is_none());
        assert!(!path.exists());
    }
}
