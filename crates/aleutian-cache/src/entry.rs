// ABOUTME: The stored value shape for one routing-cache entry: a per-tool
// ABOUTME: embedding map plus an optional TTL, keyed by corpus hash (spec.md §6)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const KEY_PREFIX: &str = "routing/emb/v1/";

/// One tool's routing embedding, typically unit-normalized (L2 ≈ 1.0).
pub type ToolEmbeddings = HashMap<String, Vec<f32>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingCacheEntry {
    pub corpus_hash: String,
    pub embeddings: ToolEmbeddings,
    /// Unix seconds after which this entry is considered stale. `None` means
    /// it never expires.
    pub expires_at: Option<u64>,
}

impl RoutingCacheEntry {
    pub fn new(corpus_hash: impl Into<String>, embeddings: ToolEmbeddings, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| now_unix_secs() + d.as_secs());
        Self {
            corpus_hash: corpus_hash.into(),
            embeddings,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => now_unix_secs() >= exp,
            None => false,
        }
    }

    /// Seconds remaining until expiry, `None` if the entry never expires or
    /// has already expired.
    pub fn ttl_remaining(&self) -> Option<u64> {
        let exp = self.expires_at?;
        let now = now_unix_secs();
        if exp > now {
            Some(exp - now)
        } else {
            None
        }
    }
}

pub fn cache_key(corpus_hash: &str) -> String {
    format!("{KEY_PREFIX}{corpus_hash}")
}

fn now_unix_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs()
}
