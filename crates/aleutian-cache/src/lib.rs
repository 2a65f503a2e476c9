// ABOUTME: Persisted routing/embedding cache (spec.md §6): a sled-backed
// ABOUTME: key-value store for per-corpus tool embedding vectors

pub mod entry;
pub mod error;

pub use entry::{cache_key, RoutingCacheEntry, ToolEmbeddings, KEY_PREFIX};
pub use error::{CacheError, Result};

use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Thin wrapper over an embedded `sled` database, storing one
/// `RoutingCacheEntry` per corpus hash under the `routing/emb/v1/` prefix.
pub struct RoutingCache {
    db: sled::Db,
}

impl RoutingCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Opens a transient, temp-dir-backed database — used by tests and the
    /// dump utility's empty-cache path.
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    #[instrument(skip(self, embeddings))]
    pub fn put(&self, corpus_hash: &str, embeddings: ToolEmbeddings, ttl: Option<Duration>) -> Result<()> {
        let entry = RoutingCacheEntry::new(corpus_hash, embeddings, ttl);
        let bytes = bincode::serde::encode_to_vec(&entry, bincode::config::standard())?;
        self.db.insert(cache_key(corpus_hash).as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Fetches an entry, filtering out ones that have expired. An expired
    /// entry is left in place — `gc()` is what removes it.
    pub fn get(&self, corpus_hash: &str) -> Result<Option<RoutingCacheEntry>> {
        let Some(bytes) = self.db.get(cache_key(corpus_hash).as_bytes())? else {
            return Ok(None);
        };
        let (entry, _): (RoutingCacheEntry, usize) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        if entry.is_expired() {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Removes every expired entry. Returns the number removed.
    pub fn gc(&self) -> Result<usize> {
        let mut removed = 0;
        for item in self.db.scan_prefix(KEY_PREFIX.as_bytes()) {
            let (key, bytes) = item?;
            let (entry, _): (RoutingCacheEntry, usize) = match bincode::serde::decode_from_slice(&bytes, bincode::config::standard()) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(error = %e, "dropping undecodable routing-cache entry");
                    self.db.remove(&key)?;
                    removed += 1;
                    continue;
                }
            };
            if entry.is_expired() {
                self.db.remove(&key)?;
                removed += 1;
            }
        }
        if removed > 0 {
            self.db.flush()?;
            debug!(removed, "garbage-collected expired routing-cache entries");
        }
        Ok(removed)
    }

    /// Iterates every stored entry, decoding errors aside (used by the dump
    /// utility; entries that fail to decode are skipped rather than failing
    /// the whole scan).
    pub fn iter_entries(&self) -> impl Iterator<Item = RoutingCacheEntry> + '_ {
        self.db.scan_prefix(KEY_PREFIX.as_bytes()).filter_map(|item| {
            let (_, bytes) = item.ok()?;
            let (entry, _): (RoutingCacheEntry, usize) =
                bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).ok()?;
            Some(entry)
        })
    }

    pub fn len(&self) -> usize {
        self.db.scan_prefix(KEY_PREFIX.as_bytes()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// L2 norm of an embedding vector, used by the dump utility's per-tool stats.
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}
