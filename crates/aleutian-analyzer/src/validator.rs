// ABOUTME: Semantic tool-name validator: corrects a mismatched (query, tool)
// ABOUTME: pairing and deduplicates the correction per session (spec.md §4.1)

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashSet;

static CALL_CHAIN_PHRASES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:call chain|call graph|call hierarchy|call tree|call stack|call flow|call path)\b").unwrap()
});

static WHAT_DOES_PHRASES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:what does|what functions|functions that)\b").unwrap()
});

static WHO_CALLS_PHRASES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:who calls|what calls|callers of|usages of|references to)\b").unwrap()
});

static FUNCTIONS_CALLED_BY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:functions|what is|what are)\b.*\bcalled by\b").unwrap()
});

/// Result of running the validator against a (query, tool) pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub tool_name: String,
    pub reason: Option<String>,
}

/// Corrects a mismatched tool-name/query pairing. Pure function; per-session
/// deduplication is layered on top by [`ValidatorCache`].
pub fn validate_tool_name(query: &str, selected_tool: &str) -> ValidationOutcome {
    let is_callers_or_callees = selected_tool == "callers" || selected_tool == "callees";

    if is_callers_or_callees && CALL_CHAIN_PHRASES_RE.is_match(query) {
        return ValidationOutcome {
            tool_name: "get-call-chain".to_string(),
            reason: Some(format!(
                "query asks for a call chain/graph/hierarchy; rewrote `{selected_tool}` to `get-call-chain`"
            )),
        };
    }

    if selected_tool == "callees" && FUNCTIONS_CALLED_BY_RE.is_match(query) {
        // Special case: "functions called by X" keeps `callees` (X is the caller).
        return ValidationOutcome {
            tool_name: "callees".to_string(),
            reason: None,
        };
    }

    if selected_tool == "callers" && WHAT_DOES_PHRASES_RE.is_match(query) {
        return ValidationOutcome {
            tool_name: "callees".to_string(),
            reason: Some(format!(
                "query asks what a symbol calls; rewrote `callers` to `callees`"
            )),
        };
    }

    if selected_tool == "callees" && WHO_CALLS_PHRASES_RE.is_match(query) {
        return ValidationOutcome {
            tool_name: "callers".to_string(),
            reason: Some(format!(
                "query asks who calls a symbol; rewrote `callees` to `callers`"
            )),
        };
    }

    ValidationOutcome {
        tool_name: selected_tool.to_string(),
        reason: None,
    }
}

/// Per-session dedup cache over `semantic_correction` trace steps: a
/// correction is only reported once per `(session, query-prefix,
/// corrected-tool)` triple, mirroring the trace lookup the analyzer performs
/// against the session's recorded steps.
#[derive(Default)]
pub struct ValidatorCache {
    seen: RwLock<HashSet<(String, String, String)>>,
}

const QUERY_PREFIX_LEN: usize = 50;

impl ValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(session_id: &str, query: &str, corrected_tool: &str) -> (String, String, String) {
        let prefix_len = query
            .char_indices()
            .nth(QUERY_PREFIX_LEN)
            .map(|(idx, _)| idx)
            .unwrap_or(query.len());
        (
            session_id.to_string(),
            query[..prefix_len].to_string(),
            corrected_tool.to_string(),
        )
    }

    /// Validate and record the correction. Returns `None` for the `reason`
    /// when there was no correction, or when an identical correction was
    /// already reported for this session.
    pub fn validate(&self, session_id: &str, query: &str, selected_tool: &str) -> ValidationOutcome {
        let outcome = validate_tool_name(query, selected_tool);
        if outcome.reason.is_none() {
            return outcome;
        }

        let key = Self::key(session_id, query, &outcome.tool_name);
        let already_seen = {
            let seen = self.seen.read();
            seen.contains(&key)
        };
        if already_seen {
            return ValidationOutcome {
                tool_name: outcome.tool_name,
                reason: None,
            };
        }

        self.seen.write().insert(key);
        outcome
    }

    /// Test entry point: clears all recorded corrections for this cache.
    pub fn clear(&self) {
        self.seen.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_callers_to_call_chain() {
        let outcome = validate_tool_name("show me the call chain for Foo", "callers");
        assert_eq!(outcome.tool_name, "get-call-chain");
        assert!(outcome.reason.is_some());
    }

    #[test]
    fn rewrites_callers_to_callees_on_what_does_phrasing() {
        let outcome = validate_tool_name("what does Foo call?", "callers");
        assert_eq!(outcome.tool_name, "callees");
    }

    #[test]
    fn rewrites_callees_to_callers_on_who_calls_phrasing() {
        let outcome = validate_tool_name("who calls Foo?", "callees");
        assert_eq!(outcome.tool_name, "callers");
    }

    #[test]
    fn functions_called_by_special_case_stays_callees() {
        let outcome = validate_tool_name("what are the functions called by Foo?", "callees");
        assert_eq!(outcome.tool_name, "callees");
        assert!(outcome.reason.is_none());
    }

    #[test]
    fn no_correction_when_tool_already_matches() {
        let outcome = validate_tool_name("what does Foo call?", "callees");
        assert_eq!(outcome.tool_name, "callees");
        assert!(outcome.reason.is_none());
    }

    #[test]
    fn cache_deduplicates_identical_correction_per_session() {
        let cache = ValidatorCache::new();
        let first = cache.validate("session-1", "what does Foo call?", "callers");
        let second = cache.validate("session-1", "what does Foo call?", "callers");
        assert!(first.reason.is_some());
        assert!(second.reason.is_none());
        assert_eq!(second.tool_name, "callees");
    }

    #[test]
    fn cache_reports_again_for_a_different_session() {
        let cache = ValidatorCache::new();
        let first = cache.validate("session-1", "what does Foo call?", "callers");
        let other_session = cache.validate("session-2", "what does Foo call?", "callers");
        assert!(first.reason.is_some());
        assert!(other_session.reason.is_some());
    }

    #[test]
    fn clear_resets_dedup_state() {
        let cache = ValidatorCache::new();
        cache.validate("session-1", "what does Foo call?", "callers");
        cache.clear();
        let after_clear = cache.validate("session-1", "what does Foo call?", "callers");
        assert!(after_clear.reason.is_some());
    }
}
