// ABOUTME: Semantic-repetition check: cosine-similarity comparison against a
// ABOUTME: session's prior tool queries, per tool (spec.md §4.4 step 9)

use aleutian_core::SessionId;
use dashmap::DashMap;

/// Session-scoped, per-tool history of query embeddings. Grows monotonically
/// across a session's invocations (not just one batch), so repetition is
/// caught even across separate `execute_batch` calls.
#[derive(Default)]
pub struct SemanticRepetitionTracker {
    history: DashMap<(SessionId, String), Vec<Vec<f32>>>,
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

impl SemanticRepetitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `embedding` is within `threshold` cosine similarity
    /// of any prior query embedding recorded for `(session, tool)`.
    pub fn is_repetition(&self, session: SessionId, tool: &str, embedding: &[f32], threshold: f32) -> bool {
        match self.history.get(&(session, tool.to_string())) {
            Some(prior) => prior.iter().any(|p| cosine(p, embedding) >= threshold),
            None => false,
        }
    }

    /// Records `embedding` as a prior query for `(session, tool)`.
    pub fn record(&self, session: SessionId, tool: &str, embedding: Vec<f32>) {
        self.history
            .entry((session, tool.to_string()))
            .or_default()
            .push(embedding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors_is_one() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors_is_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn no_repetition_with_empty_history() {
        let tracker = SemanticRepetitionTracker::new();
        let session = SessionId::new_v4();
        assert!(!tracker.is_repetition(session, "find-callers", &[1.0, 0.0], 0.7));
    }

    #[test]
    fn detects_repetition_above_threshold() {
        let tracker = SemanticRepetitionTracker::new();
        let session = SessionId::new_v4();
        tracker.record(session, "find-callers", vec![1.0, 0.0]);
        assert!(tracker.is_repetition(session, "find-callers", &[0.99, 0.1], 0.7));
    }

    #[test]
    fn does_not_cross_tool_boundaries() {
        let tracker = SemanticRepetitionTracker::new();
        let session = SessionId::new_v4();
        tracker.record(session, "find-callers", vec![1.0, 0.0]);
        assert!(!tracker.is_repetition(session, "find-callees", &[1.0, 0.0], 0.7));
    }
}
