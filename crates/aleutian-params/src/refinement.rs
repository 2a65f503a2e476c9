// ABOUTME: LLM refinement hook: re-derives typed parameters from an LLM's
// ABOUTME: JSON output, falling back silently to the regex result (spec.md §4.3)

use crate::types::{TopNParams, TypedParams};
use aleutian_llm::LLMProvider;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Parameter schema names sorted deterministically, passed to the LLM as a
/// hint about what fields it may fill in. Only `TopN` params currently
/// expose refinable fields beyond what the regex cascade already derives
/// confidently.
fn schema_fields(params: &TypedParams) -> Vec<&'static str> {
    match params {
        TypedParams::TopN(_) => vec!["exclude_tests", "kind", "sort_by", "top_n"],
        _ => Vec::new(),
    }
}

fn coerce_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn coerce_usize(value: &JsonValue) -> Option<usize> {
    match value {
        JsonValue::Number(n) => n.as_u64().map(|v| v as usize),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Refines `params` with an LLM call scoped to `query`/`tool_name`. Any
/// failure — extractor error, malformed JSON, conversion failure — falls
/// back silently to the original, unmodified `params`. No retries.
pub async fn refine_with_llm(
    params: TypedParams,
    query: &str,
    llm: &dyn LLMProvider,
    regex_hint: &str,
) -> TypedParams {
    let fields = schema_fields(&params);
    if fields.is_empty() {
        return params;
    }

    let prompt = format!(
        "Query: {query}\nTool: {}\nEditable fields (sorted): {}\nRegex hint: {regex_hint}\nReturn a JSON object with only the fields you want to change.",
        params.tool_name(),
        fields.join(", "),
    );

    let response = match llm.generate(&prompt).await {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "llm refinement call failed, falling back to regex result");
            return params;
        }
    };

    let parsed: JsonValue = match serde_json::from_str(response.content.trim()) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "llm refinement output was not valid json, falling back");
            return params;
        }
    };

    let Some(object) = parsed.as_object() else {
        return params;
    };

    match params {
        TypedParams::TopN(mut p) => {
            apply_top_n_overrides(&mut p, object);
            TypedParams::TopN(p)
        }
        other => other,
    }
}

fn apply_top_n_overrides(p: &mut TopNParams, object: &serde_json::Map<String, JsonValue>) {
    if let Some(v) = object.get("exclude_tests").and_then(coerce_bool) {
        p.exclude_tests = v;
    }
    if let Some(v) = object.get("kind").and_then(coerce_string) {
        p.kind = Some(v);
    }
    if let Some(v) = object.get("sort_by").and_then(coerce_string) {
        p.sort_by = Some(v);
    }
    if let Some(v) = object.get("top_n").and_then(coerce_usize) {
        if (1..=100).contains(&v) {
            p.top_n = v;
        }
    }
}
