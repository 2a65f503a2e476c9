// ABOUTME: Synthesizer (C5): aggregates tool results into a response string,
// ABOUTME: preferring a verbatim pass-through over a built summary (spec.md §4.6)

pub mod dedup;
pub mod formatters;
pub mod pass_through;
pub mod trace_fallback;

use aleutian_core::{SessionState, ToolResult, TraceStep};
use tracing::instrument;

const CONTEXT_LIMITATIONS_NOTE: &str =
    "_Note: results above are summarized from tool output and may omit detail available in the full graph._";

/// Synthesizes the response text for one step, given the tool names and
/// results accumulated this step and the session's trace so far (used only
/// for the fallback when `results` is empty). Always records a `synthesis`
/// trace step on `session` for observability (spec.md §4.6 final bullet).
#[instrument(skip(session, tool_names, results), fields(session = %session.id, n = results.len()))]
pub fn synthesize(session: &mut SessionState, tool_names: &[String], results: &[ToolResult]) -> String {
    let (source, output) = if let Some(verbatim) = pass_through::evaluate(tool_names, results) {
        ("pass_through", verbatim.to_string())
    } else if !results.is_empty() {
        ("multi_result", multi_result_summary(tool_names, results))
    } else if let Some(fallback) = trace_fallback::summarize(&session.trace) {
        ("trace_fallback", fallback)
    } else {
        ("empty", String::new())
    };

    let mut step = TraceStep::new("synthesis", "synthesizer");
    step.metadata.insert("source".to_string(), source.to_string());
    step.metadata.insert("result_count".to_string(), results.len().to_string());
    step.metadata.insert("output_length".to_string(), output.len().to_string());
    session.trace.push(step);

    output
}

/// Deduplicates results by FNV hash of their output text, formats each
/// unique success, prepends any errors, and appends a context-limitations
/// note (spec.md §4.6 second bullet).
fn multi_result_summary(tool_names: &[String], results: &[ToolResult]) -> String {
    let outputs: Vec<&str> = results.iter().map(|r| r.output_text.as_str()).collect();
    let keep = dedup::dedup_indices(&outputs);

    let mut error_lines = Vec::new();
    let mut success_sections = Vec::new();

    for &i in &keep {
        let result = &results[i];
        let tool = tool_names.get(i).map(|s| s.as_str()).unwrap_or("unknown-tool");
        if let Some(error) = &result.error {
            error_lines.push(format!("- `{tool}` failed: {error}"));
            continue;
        }
        if result.output_text.trim().is_empty() {
            continue;
        }
        let formatted = formatters::format_result(result);
        success_sections.push(format!("### `{tool}`\n{formatted}"));
    }

    let mut sections = Vec::new();
    if !error_lines.is_empty() {
        sections.push(format!("Errors encountered:\n{}", error_lines.join("\n")));
    }
    sections.extend(success_sections);

    if sections.is_empty() {
        return String::new();
    }

    sections.push(CONTEXT_LIMITATIONS_NOTE.to_string());
    sections.join("\n\n")
}
