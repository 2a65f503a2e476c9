use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the Executor, in the teacher's `CodeGraphConfig` style:
/// `serde`-derived, `Default`-derived, loadable from TOML or environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Count-based circuit breaker threshold (spec.md §4.4 step 7).
    pub circuit_breaker_threshold: usize,
    /// Consecutive-CB-fire limit before the loop returns early.
    pub consecutive_cb_limit: usize,
    /// Cosine-similarity threshold for the semantic-repetition check.
    pub semantic_repetition_threshold: f32,
    /// Default index-search timeout.
    #[serde(with = "duration_millis")]
    pub search_timeout: Duration,
    /// Default bounded-search result cap.
    pub search_result_cap: usize,
    /// Post-loop not-found tally threshold (spec.md §4.4 step 19).
    pub not_found_synthesize_threshold: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_threshold: 2,
            consecutive_cb_limit: 2,
            semantic_repetition_threshold: 0.7,
            search_timeout: Duration::from_millis(500),
            search_result_cap: 50,
            not_found_synthesize_threshold: 3,
        }
    }
}

impl ExecutorConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
