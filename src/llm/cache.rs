//! Content-addressed completion cache
//!
//! Keys are content hashes of rendered prompts, so identical prompt text
//! always maps to the same entry regardless of which request produced it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::debug;

use crate::config::CacheConfig;

/// Cached result of a completed model call
#[derive(Debug, Clone)]
pub struct CachedCompletion {
    pub answer: String,
    pub tokens_used: i64,
    pub cost_usd: f64,
    pub duration_seconds: f64,
}

/// Cache entry with TTL support
#[derive(Debug, Clone)]
struct CacheEntry {
    data: CachedCompletion,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: CachedCompletion, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-memory TTL cache for completion results
pub struct CompletionCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    config: CacheConfig,
    stats: Arc<RwLock<CacheStats>>,
}

impl CompletionCache {
    /// Create a new cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a new cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    /// Get a cached completion by key
    pub async fn get(&self, key: &str) -> Option<CachedCompletion> {
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get(key) {
            if entry.is_expired() {
                entries.remove(key);
                self.increment_miss().await;
                debug!("Completion cache miss (expired) for key {}", key);
                return None;
            }

            self.increment_hit().await;
            debug!("Completion cache hit for key {}", key);
            return Some(entry.data.clone());
        }

        self.increment_miss().await;
        debug!("Completion cache miss for key {}", key);
        None
    }

    /// Cache a completion result under the configured TTL
    pub async fn set(&self, key: String, value: CachedCompletion) {
        let mut entries = self.entries.write().await;

        // Check if we need to evict entries
        if entries.len() >= self.config.max_entries {
            self.evict_oldest_entries(&mut entries).await;
        }

        let ttl = Duration::from_secs(self.config.ttl_seconds);
        entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Clean up expired entries
    pub async fn cleanup_expired(&self) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Cleaned up {} expired completion cache entries", removed);
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // Private helper methods

    async fn increment_hit(&self) {
        if self.config.enable_stats {
            let mut stats = self.stats.write().await;
            stats.hits += 1;
        }
    }

    async fn increment_miss(&self) {
        if self.config.enable_stats {
            let mut stats = self.stats.write().await;
            stats.misses += 1;
        }
    }

    async fn evict_oldest_entries(&self, entries: &mut HashMap<String, CacheEntry>) {
        // Simple eviction: remove 10% of entries
        let evict_count = (entries.len() / 10).max(1);
        let keys_to_remove: Vec<String> = entries.keys().take(evict_count).cloned().collect();

        for key in keys_to_remove {
            entries.remove(&key);
        }

        if self.config.enable_stats {
            let mut stats = self.stats.write().await;
            stats.evictions += evict_count as u64;
        }

        debug!("Evicted {} completion cache entries", evict_count);
    }
}

impl Default for CompletionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CompletionCache {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            config: self.config.clone(),
            stats: self.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(answer: &str) -> CachedCompletion {
        CachedCompletion {
            answer: answer.to_string(),
            tokens_used: 42,
            cost_usd: 0.0001,
            duration_seconds: 1.5,
        }
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let cache = CompletionCache::new();
        cache.set("k1".to_string(), completion("hello")).await;

        let hit = cache.get("k1").await.unwrap();
        assert_eq!(hit.answer, "hello");
        assert_eq!(hit.tokens_used, 42);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_miss_on_absent_key() {
        let cache = CompletionCache::new();
        assert!(cache.get("absent").await.is_none());
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = CompletionCache::with_config(CacheConfig {
            ttl_seconds: 0,
            max_entries: 10,
            enable_stats: true,
        });
        cache.set("k1".to_string(), completion("hello")).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.get("k1").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_eviction_when_full() {
        let cache = CompletionCache::with_config(CacheConfig {
            ttl_seconds: 3600,
            max_entries: 2,
            enable_stats: true,
        });
        cache.set("k1".to_string(), completion("a")).await;
        cache.set("k2".to_string(), completion("b")).await;
        cache.set("k3".to_string(), completion("c")).await;

        assert!(cache.len().await <= 2);
        assert!(cache.stats().await.evictions >= 1);
    }

    #[tokio::test]
    async fn test_hit_rate() {
        let cache = CompletionCache::new();
        cache.set("k1".to_string(), completion("a")).await;
        let _ = cache.get("k1").await;
        let _ = cache.get("k2").await;

        let stats = cache.stats().await;
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
