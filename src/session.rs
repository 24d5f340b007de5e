use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::models::chair::Owner;

struct CachedOwner {
    owner: Owner,
    cached_at: DateTime<Utc>,
}

/// Bounded read-through cache from access token to owner identity.
///
/// Entries are served only within the staleness window; a miss or a
/// stale hit consults the loader (the authoritative owner table) and
/// refreshes the entry. The cache is best-effort: when full, expired
/// entries are swept and a still-full cache simply skips insertion, so
/// correctness always falls back to the loader.
pub struct SessionCache {
    entries: DashMap<String, CachedOwner>,
    capacity: usize,
    ttl: Duration,
}

impl SessionCache {
    pub fn new(capacity: usize, ttl_seconds: i64) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn lookup<F>(&self, token: &str, load: F) -> Option<Owner>
    where
        F: FnOnce(&str) -> Option<Owner>,
    {
        let now = Utc::now();

        if let Some(hit) = self.entries.get(token) {
            if now - hit.cached_at < self.ttl {
                return Some(hit.owner.clone());
            }
        }

        let owner = load(token)?;

        if self.entries.len() >= self.capacity {
            self.sweep_expired(now);
        }
        if self.entries.len() < self.capacity || self.entries.contains_key(token) {
            self.entries.insert(
                token.to_string(),
                CachedOwner {
                    owner: owner.clone(),
                    cached_at: now,
                },
            );
        }

        Some(owner)
    }

    fn sweep_expired(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, v| now - v.cached_at < self.ttl);
    }

    #[cfg(test)]
    fn force_stale(&self, token: &str) {
        if let Some(mut entry) = self.entries.get_mut(token) {
            entry.cached_at = Utc::now() - Duration::hours(1);
        }
    }
}
