// ABOUTME: 64-bit FNV-1a dedup for multi-result synthesis — outputs can be
// ABOUTME: 10 KB+, so dedup keys on a hash, never the full string

use fnv::FnvHasher;
use std::hash::Hasher;

pub fn fnv_hash(text: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

/// Returns the indices of `outputs` to keep: first occurrence of each
/// distinct FNV hash, in original order.
pub fn dedup_indices(outputs: &[&str]) -> Vec<usize> {
    let mut seen = std::collections::HashSet::new();
    let mut kept = Vec::new();
    for (i, output) in outputs.iter().enumerate() {
        if seen.insert(fnv_hash(output)) {
            kept.push(i);
        }
    }
    kept
}
