// ABOUTME: Trace-step construction (spec.md §4.4.2): copies typed params into
// ABOUTME: metadata, truncating strings, then merges the tool's own trace step

use aleutian_core::{ToolInvocation, ToolResult, TraceStep};
use serde_json::Value as JsonValue;
use std::time::Duration;

const METADATA_STRING_TRUNCATE: usize = 100;

fn truncate(s: &str) -> String {
    if s.chars().count() <= METADATA_STRING_TRUNCATE {
        s.to_string()
    } else {
        s.chars().take(METADATA_STRING_TRUNCATE).collect()
    }
}

/// Builds the `tool_call` trace step for one invocation, copying its
/// string/int/bool parameters into metadata (truncated at 100 chars), then
/// merging in any richer metadata the tool result itself carries — this is
/// how later passes detect whether a graph tool produced substantive
/// results (e.g. `match_count`, `total_implementations`).
pub fn build_tool_call_step(invocation: &ToolInvocation, result: &ToolResult, duration: Duration) -> TraceStep {
    let mut step = TraceStep::new("tool_call", invocation.tool_name.clone());
    step.target = invocation.tool_name.clone();
    step.duration = duration;
    step.error = result.error.clone();

    if let JsonValue::Object(map) = &invocation.typed_params {
        for (key, value) in map {
            let rendered = match value {
                JsonValue::String(s) => Some(truncate(s)),
                JsonValue::Number(n) => Some(n.to_string()),
                JsonValue::Bool(b) => Some(b.to_string()),
                _ => None,
            };
            if let Some(rendered) = rendered {
                step.metadata.insert(key.clone(), rendered);
            }
        }
    }

    if let Some(tool_step) = &result.trace_step {
        step.merge_from(tool_step);
    }

    step
}

/// Builds a `tool_call_forced` trace step (spec.md §4.4.3).
pub fn build_forced_step(tool_name: &str, result: &ToolResult, duration: Duration) -> TraceStep {
    let mut step = TraceStep::new("tool_call_forced", tool_name);
    step.duration = duration;
    step.error = result.error.clone();
    step.metadata.insert("forced_by".to_string(), "router".to_string());
    let preview: String = result.output_text.chars().take(METADATA_STRING_TRUNCATE).collect();
    step.metadata.insert("result_preview".to_string(), preview);
    if let Some(tool_step) = &result.trace_step {
        step.merge_from(tool_step);
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> ToolInvocation {
        ToolInvocation {
            id: uuid::Uuid::new_v4(),
            tool_name: "find-callers".to_string(),
            typed_params: serde_json::json!({
                "raw_name": "a".repeat(150),
                "top_n": 10,
                "exclude_tests": true,
            }),
        }
    }

    #[test]
    fn truncates_long_string_params() {
        let step = build_tool_call_step(&invocation(), &ToolResult::ok("x"), Duration::default());
        assert_eq!(step.metadata.get("raw_name").unwrap().chars().count(), 100);
    }

    #[test]
    fn copies_numeric_and_bool_params() {
        let step = build_tool_call_step(&invocation(), &ToolResult::ok("x"), Duration::default());
        assert_eq!(step.metadata.get("top_n").unwrap(), "10");
        assert_eq!(step.metadata.get("exclude_tests").unwrap(), "true");
    }

    #[test]
    fn merges_richer_metadata_from_tool_result() {
        let mut result = ToolResult::ok("x");
        let mut tool_step = TraceStep::new("tool_call", "find-callers");
        tool_step.metadata.insert("match_count".to_string(), "5".to_string());
        result.trace_step = Some(tool_step);
        let step = build_tool_call_step(&invocation(), &result, Duration::default());
        assert_eq!(step.metadata.get("match_count").unwrap(), "5");
    }
}
