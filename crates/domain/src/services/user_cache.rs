use std::{collections::BTreeMap, time::Duration};

use moka::sync::Cache;

use crate::model::UserInfo;

/// Short-lived cache of `users/info` lookups shared by every view, so a
/// user seen in one queue is not fetched again by the next.
#[derive(Debug, Clone)]
pub struct UserInfoCache {
    entries: Cache<String, UserInfo>,
}

impl UserInfoCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
    pub const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(capacity)
                .build(),
        }
    }

    pub fn get(&self, id: &str) -> Option<UserInfo> {
        let found = self.entries.get(id);
        let result = if found.is_some() { "hit" } else { "miss" };
        metrics::counter!("user_cache_lookups_total", "result" => result).increment(1);
        found
    }

    /// Caches resolved users only; lookups that came back with an error
    /// are retried on the next fetch.
    pub fn insert(&self, info: UserInfo) {
        if info.is_resolved() && !info.id.is_empty() {
            self.entries.insert(info.id.clone(), info);
        }
    }

    pub fn insert_all(&self, users: impl IntoIterator<Item = UserInfo>) {
        for info in users {
            self.insert(info);
        }
    }

    /// IDs from `ids` not currently cached, de-duplicated, in input order.
    pub fn missing<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for id in ids {
            if !self.entries.contains_key(id) && !missing.iter().any(|m| m == id) {
                missing.push(id.to_string());
            }
        }
        missing
    }

    /// Cached users among `ids`, keyed by ID.
    pub fn lookup<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, UserInfo> {
        ids.into_iter()
            .filter_map(|id| self.get(id).map(|info| (id.to_string(), info)))
            .collect()
    }
}

impl Default for UserInfoCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}
