// ABOUTME: Trace-step fallback (spec.md §4.6): when tool results are empty
// ABOUTME: but the session still recorded tool_call(_forced) steps

use aleutian_core::TraceStep;

/// Builds a bullet-list summary from `tool_call`/`tool_call_forced` trace
/// steps. Returns `None` if there are none to summarize — the caller falls
/// back to the empty string per spec.md §7.
pub fn summarize(trace: &[TraceStep]) -> Option<String> {
    let tool_steps: Vec<&TraceStep> = trace
        .iter()
        .filter(|s| s.action == "tool_call" || s.action == "tool_call_forced")
        .collect();
    if tool_steps.is_empty() {
        return None;
    }

    let mut lines = vec!["Based on the tools run during this session:".to_string()];
    for step in tool_steps {
        let status = if step.error.is_some() { "failed" } else { "succeeded" };
        let mut line = format!("- `{}` {status}", step.tool);
        if !step.symbols_found.is_empty() {
            line.push_str(&format!(" ({} symbols found)", step.symbols_found.len()));
        }
        if let Some(error) = &step.error {
            line.push_str(&format!(": {error}"));
        }
        lines.push(line);
    }
    Some(lines.join("\n"))
}
