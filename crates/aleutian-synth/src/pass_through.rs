// ABOUTME: Pass-through detection (spec.md §4.6): a single graph-authoritative
// ABOUTME: result is returned verbatim, with per-tool exceptions

use aleutian_core::ToolResult;
use once_cell::sync::Lazy;
use regex::Regex;

const GRAPH_RESULT_MARKER: &str = "## GRAPH RESULT";
const EXHAUSTIVE_FOOTER: &str = "these results are exhaustive";

static FOUND_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Found (\d+) ").unwrap());
static BULLET_WITH_LOCATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*]\s+.*:.*$").unwrap());

/// True when `output` carries one of the three graph-authoritative markers.
fn is_graph_authoritative(output: &str) -> bool {
    output.contains(GRAPH_RESULT_MARKER) || output.starts_with("Found ") || output.contains(EXHAUSTIVE_FOOTER)
}

/// Counts the locations a `find-references` result reports: prefers the
/// `Found N references` header, falls back to counting bullet lines that
/// contain a `:` (file:line style locations).
fn find_references_location_count(output: &str) -> usize {
    if let Some(caps) = FOUND_COUNT.captures(output) {
        if let Some(n) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
            return n;
        }
    }
    BULLET_WITH_LOCATION.find_iter(output).count()
}

/// Whether `find-references`'s own pass-through exception applies: positive
/// results with ≥ 3 locations are narrated instead of passed through
/// verbatim; "not found" style outputs always pass through to avoid
/// hallucination.
fn find_references_blocks_pass_through(output: &str) -> bool {
    let lower = output.to_lowercase();
    let is_not_found = lower.contains("not found") || lower.contains("no references");
    if is_not_found {
        return false;
    }
    find_references_location_count(output) >= 3
}

/// Evaluates the pass-through rule over one batch of results (spec.md §4.6):
/// exactly one successful result, non-empty output, no errors anywhere in
/// the batch, and the surviving output passes the per-tool exceptions.
/// Returns the verbatim text to return, if pass-through applies.
pub fn evaluate<'a>(tool_names: &[String], results: &'a [ToolResult]) -> Option<&'a str> {
    if results.iter().any(|r| !r.success || r.error.is_some()) {
        return None;
    }
    // An empty-output success still counts against the batch (spec.md §4.6):
    // pass-through requires no empty-output successes, not merely "ignore them".
    if results.iter().any(|r| r.success && r.output_text.trim().is_empty()) {
        return None;
    }
    let non_empty: Vec<(&String, &ToolResult)> = tool_names
        .iter()
        .zip(results.iter())
        .filter(|(_, r)| !r.output_text.trim().is_empty())
        .collect();
    if non_empty.len() != 1 {
        return None;
    }
    let (tool, result) = non_empty[0];
    let output = result.output_text.as_str();

    if !is_graph_authoritative(output) {
        return None;
    }
    if tool == "find-cycles" {
        return None;
    }
    if tool == "find-references" && find_references_blocks_pass_through(output) {
        return None;
    }

    Some(output)
}
