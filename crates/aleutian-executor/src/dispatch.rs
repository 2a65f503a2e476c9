// ABOUTME: Single-tool dispatch (spec.md §4.4.1): no retries at this layer,
// ABOUTME: a missing executor is itself a structured failure

use aleutian_core::{ToolExecutor, ToolInvocation, ToolResult};
use std::sync::Arc;
use std::time::Instant;

/// Dispatches one invocation to the wired `ToolExecutor`, timing the call.
/// If no executor is wired, returns a structured failure result rather than
/// panicking — retry policy lives in the surrounding loop or the tool
/// itself, never here.
pub async fn dispatch(executor: Option<&Arc<dyn ToolExecutor>>, invocation: &ToolInvocation) -> ToolResult {
    let Some(executor) = executor else {
        return ToolResult::err("no tool executor is wired for this session");
    };

    let start = Instant::now();
    let result = match executor.execute(invocation).await {
        Ok(result) => result,
        Err(e) => ToolResult::err(e.to_string()),
    };
    let elapsed = start.elapsed();

    if result.duration.is_zero() {
        ToolResult {
            duration: elapsed,
            ..result
        }
    } else {
        result
    }
}
