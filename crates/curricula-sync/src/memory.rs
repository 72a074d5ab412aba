use async_trait::async_trait;
use curricula_core::{KeyValueStore, Result};
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoreEntry {
    value: String,
    created_at: Instant,
    ttl: Option<Duration>,
}

impl StoreEntry {
    fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.created_at.elapsed() > ttl,
            None => false,
        }
    }
}

/// In-memory key-value store with TTL expiry. The default store for tests
/// and single-process runs; durable backends plug in behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoreEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn compose_key(namespace: &str, key: &str) -> String {
        format!("{}:{}", namespace, key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let composed = Self::compose_key(namespace, key);
        if let Some(entry) = self.entries.get(&composed) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(&composed);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.entries.insert(
            Self::compose_key(namespace, key),
            StoreEntry {
                value,
                created_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        self.entries.remove(&Self::compose_key(namespace, key));
        Ok(())
    }
}
