//! Caching of strategy responses.
//!
//! The cache is owned by the caller and injected into a [`CachedStrategy`];
//! the pipeline itself keeps no global state.

use super::{DocumentSource, Extraction, ExtractionError, ExtractionStrategy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Key-value store for extraction results.
pub trait ResponseCache: Send + Sync {
    /// Look up a cached extraction.
    fn get(&self, key: &str) -> Option<Extraction>;

    /// Store an extraction.
    fn put(&self, key: &str, value: Extraction);
}

/// In-memory cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Extraction>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Extraction> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: Extraction) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }
}

/// Strategy wrapper answering repeated sources from a cache.
///
/// Only successful extractions are cached, so a failure is retried on the
/// next run. The key is `"<strategy name>:<source id>"`.
pub struct CachedStrategy {
    inner: Arc<dyn ExtractionStrategy>,
    cache: Arc<dyn ResponseCache>,
}

impl CachedStrategy {
    /// Wrap a strategy.
    pub fn new(inner: Arc<dyn ExtractionStrategy>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { inner, cache }
    }

    fn key(&self, source: &DocumentSource) -> String {
        format!("{}:{}", self.inner.name(), source.id)
    }
}

impl ExtractionStrategy for CachedStrategy {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn cost(&self) -> f64 {
        self.inner.cost()
    }

    fn run(&self, source: &DocumentSource) -> Result<Extraction, ExtractionError> {
        let key = self.key(source);
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("Cache hit for {}", key);
            return Ok(hit);
        }
        let extraction = self.inner.run(source)?;
        self.cache.put(&key, extraction.clone());
        Ok(extraction)
    }
}
