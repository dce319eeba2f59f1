//! Reasoning reply cache.
//!
//! Identical prompts (same plan, same weather, same market data) return
//! the stored reply instead of calling the backend again. Only genuine
//! replies are stored; the fallback never is.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache key: model name plus the full prompt text.
///
/// Lookups compare the whole prompt, so two prompts never share a reply.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PromptKey {
    model: Arc<str>,
    prompt: Arc<str>,
}

impl PromptKey {
    pub fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: Arc::from(model),
            prompt: Arc::from(prompt),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// In-memory reply cache using moka.
pub struct ReplyCache {
    cache: Cache<PromptKey, String>,
}

impl ReplyCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Build from config; `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.max_entries, config.ttl))
    }

    pub async fn get(&self, key: &PromptKey) -> Option<String> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: PromptKey, reply: String) {
        self.cache.insert(key, reply).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ReplyCache {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self::new(config.max_entries, config.ttl)
    }
}

impl std::fmt::Debug for ReplyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyCache")
            .field("entries", &self.entry_count())
            .finish()
    }
}
