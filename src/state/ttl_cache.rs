use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

use tokio::time::Duration;
use tokio::time::Instant;

/// A small read-through cache whose entries expire `ttl` after insertion.
///
/// Entries are cloned out; values are expected to be cheap (amounts, token
/// metadata).
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((value, inserted)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, (value, Instant::now()));
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// number of entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// returns the cached value, or runs `fetch` and caches its result.
    ///
    /// a failed fetch caches nothing. the lock is not held while `fetch`
    /// runs.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> anyhow::Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1u32);
        assert_eq!(Some(1), cache.get(&"a"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(Some(1), cache.get(&"a"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(None, cache.get(&"a"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn read_through_fetches_once() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let mut calls = 0;

        for _ in 0..3 {
            let value = cache
                .get_or_fetch("k", || {
                    calls += 1;
                    async { Ok(7u32) }
                })
                .await
                .unwrap();
            assert_eq!(7, value);
        }
        assert_eq!(1, calls);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_fetch("k", || async { anyhow::bail!("rpc down") })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
