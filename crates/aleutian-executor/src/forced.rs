// ABOUTME: Forced direct execution (spec.md §4.4.3): router bypasses the LLM,
// ABOUTME: resolves parameters internally and executes a single tool directly

use crate::{dispatch, trace, Executor};
use aleutian_core::{ToolInvocation, ToolResult};
use aleutian_params::{categorize, ToolCategory, TypedParams};
use serde_json::Value as JsonValue;
use std::time::Instant;
use uuid::Uuid;

/// True for tools whose results are authoritative and should force
/// synthesis rather than permit follow-on Grep/Glob loops — every graph
/// tool except the grep-style escape hatch (spec.md glossary: "substantive
/// graph tool").
pub fn is_substantive_graph_tool(tool_name: &str) -> bool {
    !matches!(categorize(tool_name), ToolCategory::Grep)
}

fn build_invocation(params: &TypedParams) -> ToolInvocation {
    let map = params.to_map();
    let json_map: serde_json::Map<String, JsonValue> =
        map.into_iter().map(|(k, v)| (k, JsonValue::String(v))).collect();
    ToolInvocation {
        id: Uuid::new_v4(),
        tool_name: params.tool_name().to_string(),
        typed_params: JsonValue::Object(json_map),
    }
}

impl Executor {
    /// Executes `params` directly, bypassing the LLM decision loop. Records a
    /// `tool_call_forced` trace step, accumulates tokens, and — only when
    /// the tool is substantive and the call succeeded — sets
    /// `session.graph_tool_had_substantive_results`.
    pub async fn execute_forced(
        &self,
        session: &mut aleutian_core::SessionState,
        params: &TypedParams,
    ) -> ToolResult {
        let invocation = build_invocation(params);
        let tool = invocation.tool_name.clone();

        self.events.emit("tool_forced", &[("tool", &tool), ("forced_by", "router")]);

        let start = Instant::now();
        let result = dispatch::dispatch(self.tool_executor.as_ref(), &invocation).await;
        let duration = start.elapsed();

        let step = trace::build_forced_step(&tool, &result, duration);
        session.trace.push(step);

        session.metrics.total_tool_calls += 1;
        session.metrics.total_tokens += result.tokens_used;
        session.mark_dirty(&result.modified_files);

        if result.success && is_substantive_graph_tool(&tool) {
            session.graph_tool_had_substantive_results = true;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aleutian_core::{ConflictReasoningStore, FailureEvent, ProofUpdate, Result as CoreResult, SessionId, SessionState, ToolExecutor};
    use aleutian_params::{EmptyParams, SingleFunctionParams};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopCrs;
    impl ConflictReasoningStore for NoopCrs {
        fn update_proof_number(&self, _update: ProofUpdate) {}
        fn propagate_disproof(&self, _node_id: &str) -> usize {
            0
        }
        fn record_safety_violation(&self, _node_id: &str, _message: &str, _constraints: &[String]) {}
        fn record_failure(&self, _event: FailureEvent) {}
        fn check_cycle(&self, _node_id: &str) -> Option<String> {
            None
        }
    }

    struct EchoExecutor;
    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        async fn execute(&self, invocation: &ToolInvocation) -> CoreResult<ToolResult> {
            Ok(ToolResult::ok(format!("ran {}", invocation.tool_name)))
        }
    }

    #[tokio::test]
    async fn forced_execution_sets_substantive_flag_on_success() {
        let executor = Executor::new(Arc::new(NoopCrs)).with_tool_executor(Arc::new(EchoExecutor));
        let mut session = SessionState::new(SessionId::new_v4());
        let params = TypedParams::SingleFunction(SingleFunctionParams {
            tool_name: "get-call-chain".to_string(),
            symbol_id: Some("main".to_string()),
            raw_name: "main".to_string(),
            package_hint: None,
            dual_endpoint: Some(("main".to_string(), "runRenderLoop".to_string())),
        });
        let result = executor.execute_forced(&mut session, &params).await;
        assert!(result.success);
        assert!(session.graph_tool_had_substantive_results);
        assert_eq!(session.trace.len(), 1);
        assert_eq!(session.trace[0].action, "tool_call_forced");
    }

    #[tokio::test]
    async fn grep_tool_never_sets_substantive_flag() {
        assert!(!is_substantive_graph_tool("grep"));
        let executor = Executor::new(Arc::new(NoopCrs)).with_tool_executor(Arc::new(EchoExecutor));
        let mut session = SessionState::new(SessionId::new_v4());
        let params = TypedParams::Empty(EmptyParams {
            tool_name: "grep".to_string(),
        });
        executor.execute_forced(&mut session, &params).await;
        assert!(!session.graph_tool_had_substantive_results);
    }
}
