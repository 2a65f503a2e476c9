// ABOUTME: Executor (C4): per-invocation safety gate, count/semantic circuit
// ABOUTME: breakers, tool dispatch, proof-number update and cycle check (spec.md §4.4)

pub mod circuit_breaker;
pub mod dispatch;
pub mod forced;
pub mod normalize;
pub mod semantic_repetition;
pub mod trace;

use aleutian_core::{
    BatchFilterer, ConflictReasoningStore, CoordinatorEvents, ExecutorConfig, FailureCategory,
    FailureEvent, FailureSource, GraphRefresher, ProofUpdate, QueryEmbedder, SafetyGate,
    SessionState, ToolExecutor, ToolInvocation, ToolResult, TraceStep, TracingCoordinatorEvents,
};
use aleutian_resolver::ResolutionCache;
use circuit_breaker::{breaker_should_fire, ConsecutiveFireTracker};
use semantic_repetition::SemanticRepetitionTracker;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

pub use forced::is_substantive_graph_tool;

/// Outcome of running a batch of invocations through the loop.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub results: Vec<ToolResult>,
    pub blocked: bool,
}

/// The step-loop orchestrator. Holds the external collaborators as optional
/// `Arc<dyn Trait>` handles (everything but the CRS is best-effort — a
/// missing collaborator degrades gracefully rather than failing the batch).
pub struct Executor {
    config: ExecutorConfig,
    tool_executor: Option<Arc<dyn ToolExecutor>>,
    safety_gate: Option<Arc<dyn SafetyGate>>,
    batch_filterer: Option<Arc<dyn BatchFilterer>>,
    embedder: Option<Arc<dyn QueryEmbedder>>,
    refresher: Option<Arc<dyn GraphRefresher>>,
    resolution_cache: Option<Arc<ResolutionCache>>,
    crs: Arc<dyn ConflictReasoningStore>,
    events: Arc<dyn CoordinatorEvents>,
    semantic_tracker: SemanticRepetitionTracker,
}

impl Executor {
    pub fn new(crs: Arc<dyn ConflictReasoningStore>) -> Self {
        Self {
            config: ExecutorConfig::default(),
            tool_executor: None,
            safety_gate: None,
            batch_filterer: None,
            embedder: None,
            refresher: None,
            resolution_cache: None,
            crs,
            events: Arc::new(TracingCoordinatorEvents),
            semantic_tracker: SemanticRepetitionTracker::new(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tool_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.tool_executor = Some(executor);
        self
    }

    pub fn with_safety_gate(mut self, gate: Arc<dyn SafetyGate>) -> Self {
        self.safety_gate = Some(gate);
        self
    }

    pub fn with_batch_filterer(mut self, filterer: Arc<dyn BatchFilterer>) -> Self {
        self.batch_filterer = Some(filterer);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn QueryEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn GraphRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_resolution_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.resolution_cache = Some(cache);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn CoordinatorEvents>) -> Self {
        self.events = events;
        self
    }

    /// Runs the full per-invocation protocol (spec.md §4.4 steps 1–19) over
    /// `invocations`, mutating `session`'s trace, metrics and flags as it goes.
    #[instrument(skip(self, session, invocations), fields(session = %session.id, n = invocations.len()))]
    pub async fn execute_batch(
        &self,
        session: &mut SessionState,
        invocations: Vec<ToolInvocation>,
    ) -> ExecutionOutcome {
        let invocations = self.maybe_batch_filter(invocations).await;

        let mut counts: HashMap<String, usize> = session.tool_counts();
        let mut consecutive = ConsecutiveFireTracker::new();
        let mut results = Vec::with_capacity(invocations.len());
        let mut not_found_count = 0usize;
        let mut seen_fingerprints: std::collections::HashSet<String> = std::collections::HashSet::new();

        'invocations: for invocation in &invocations {
            let tool = invocation.tool_name.clone();
            consecutive.note_tool(&tool);

            self.events.emit("tool_routed", &[("tool", &tool)]);
            self.maybe_refresh_graph(session).await;
            self.events.emit("tool_invoked", &[("tool", &tool), ("id", &invocation.id.to_string())]);

            // Within-batch duplicate fingerprint short-circuit (spec.md §3 invariant).
            let fingerprint = invocation.fingerprint();
            if !seen_fingerprints.insert(fingerprint) {
                let mut result = ToolResult::err(format!("`{tool}` already executed with identical parameters in this batch"));
                result.success = false;
                let mut step = TraceStep::new("tool_call", tool.clone());
                step.error = result.error.clone();
                step.metadata.insert("blocked".to_string(), "duplicate".to_string());
                session.trace.push(step);
                results.push(result);
                continue 'invocations;
            }

            // Step 6: safety gate.
            if let Some(gate) = &self.safety_gate {
                match gate.check(invocation).await {
                    Ok(outcome) if outcome.blocked => {
                        let message = outcome
                            .error_message
                            .clone()
                            .unwrap_or_else(|| format!("`{tool}` blocked by safety gate"));
                        let result = outcome.result.clone().unwrap_or_else(|| ToolResult::err(message.clone()));
                        let mut step = TraceStep::new("tool_call", tool.clone());
                        step.error = Some(message.clone());
                        step.metadata.insert("blocked".to_string(), "safety".to_string());
                        session.trace.push(step);
                        results.push(result);

                        let node_id = invocation.id.to_string();
                        self.crs.record_safety_violation(&node_id, &message, &outcome.constraints);
                        self.crs.record_failure(FailureEvent {
                            node_id: node_id.clone(),
                            category: FailureCategory::Safety,
                            message,
                            source: FailureSource::Hard,
                        });
                        self.crs.propagate_disproof(&node_id);
                        continue 'invocations;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, tool = %tool, "safety gate errored; continuing with degraded guarantees");
                    }
                }
            }

            // Step 7: count-based circuit breaker.
            let count_before = *counts.get(&tool).unwrap_or(&0);
            if breaker_should_fire(count_before, self.config.circuit_breaker_threshold) {
                self.fire_breaker(session, &tool, "count_threshold", &mut results);
                session.circuit_breaker_active = true;
                let fires = consecutive.record_fire(&tool);
                if fires >= self.config.consecutive_cb_limit as u32 {
                    break 'invocations;
                }
                continue 'invocations;
            }

            // Step 8: increment count (post-CB-check, pre-execution).
            *counts.entry(tool.clone()).or_insert(0) += 1;

            // Step 9: semantic-repetition check.
            if let Some(embedder) = &self.embedder {
                let probe_text = invocation.fingerprint();
                if let Ok(embedding) = embedder.embed(&probe_text).await {
                    let session_id = session.id;
                    let is_repetition = self.semantic_tracker.is_repetition(
                        session_id,
                        &tool,
                        &embedding,
                        self.config.semantic_repetition_threshold,
                    );
                    if is_repetition {
                        self.fire_breaker(session, &tool, "semantic_repetition", &mut results);
                        session.circuit_breaker_active = true;
                        let fires = consecutive.record_fire(&tool);
                        if fires >= self.config.consecutive_cb_limit as u32 {
                            break 'invocations;
                        }
                        continue 'invocations;
                    }
                    self.semantic_tracker.record(session_id, &tool, embedding);
                }
            }

            // Step 11: execute.
            let start = Instant::now();
            let mut result = dispatch::dispatch(self.tool_executor.as_ref(), invocation).await;
            let duration = start.elapsed();

            // Step 12: post-execute normalization.
            if let Some(error) = result.error.clone() {
                if normalize::is_not_found_error(&error) {
                    result.success = true;
                    result.output_text = normalize::NOT_FOUND_MESSAGE.to_string();
                    result.tokens_used = normalize::NOT_FOUND_MESSAGE.len() / 4;
                    result.error = None;
                    not_found_count += 1;
                    self.events.emit("tool_executed", &[("tool", &tool), ("normalized", "not_found")]);
                } else if normalize::is_validation_error(&error) {
                    session.circuit_breaker_active = true;
                    self.events.emit("tool_failed", &[("tool", &tool), ("category", "validation")]);
                } else {
                    self.events.emit("tool_failed", &[("tool", &tool), ("category", "tool_execution")]);
                }
            } else {
                self.events.emit("tool_executed", &[("tool", &tool)]);
            }

            // Step 13: record trace step.
            let step = trace::build_tool_call_step(invocation, &result, duration);
            session.trace.push(step);

            // Step 14: accumulate tokens (struct field only, never a formatted string).
            session.metrics.total_tool_calls += 1;
            session.metrics.total_tokens += result.tokens_used;

            // Step 15: proof-number update.
            let node_id = invocation.id.to_string();
            if result.success {
                self.crs.update_proof_number(ProofUpdate {
                    node_id: node_id.clone(),
                    delta: -1,
                    reason: "tool_success".to_string(),
                    source: FailureSource::Hard,
                });
            } else {
                let reason = format!("tool_failure: {}", result.error.clone().unwrap_or_default());
                self.crs.update_proof_number(ProofUpdate {
                    node_id: node_id.clone(),
                    delta: 1,
                    reason,
                    source: FailureSource::Hard,
                });
                self.crs.record_failure(FailureEvent {
                    node_id: node_id.clone(),
                    category: FailureCategory::ToolExecution,
                    message: result.error.clone().unwrap_or_default(),
                    source: FailureSource::Hard,
                });
            }

            // Step 16: cycle check.
            if let Some(cycle_id) = self.crs.check_cycle(&node_id) {
                self.events.emit("cycle_detected", &[("cycle_id", &cycle_id)]);
            }

            // Step 17: track modified files.
            session.mark_dirty(&result.modified_files);

            // Step 18: emit result event.
            self.events.emit("result_recorded", &[("tool", &tool), ("success", &result.success.to_string())]);

            results.push(result);
        }

        // Step 19: post-loop not-found tally.
        let mut blocked = false;
        if not_found_count >= self.config.not_found_synthesize_threshold {
            let mut synthesized = ToolResult::err(
                "Repeated not-found results across this batch; the symbol may not exist. Synthesize a response now instead of searching further.",
            );
            synthesized.success = false;
            results.push(synthesized);
            blocked = true;
        }

        ExecutionOutcome { results, blocked }
    }

    fn fire_breaker(&self, session: &mut SessionState, tool: &str, reason: &str, results: &mut Vec<ToolResult>) {
        let mut step = TraceStep::new("circuit_breaker", tool);
        step.metadata.insert("expected".to_string(), "true".to_string());
        step.metadata.insert("reason".to_string(), reason.to_string());
        session.trace.push(step);

        self.events.emit("circuit_breaker_fired", &[("tool", tool), ("reason", reason)]);

        let category = if reason == "semantic_repetition" {
            FailureCategory::SemanticRepetition
        } else {
            FailureCategory::CountCircuitBreaker
        };
        self.crs.record_failure(FailureEvent {
            node_id: tool.to_string(),
            category,
            message: format!("`{tool}` circuit breaker fired ({reason})"),
            source: FailureSource::Hard,
        });

        let mut blocked_result = ToolResult::err(format!(
            "`{tool}` is PERMANENTLY BLOCKED for this session ({reason}). Do not call it again — synthesize a response from the results gathered so far."
        ));
        blocked_result.success = false;
        results.push(blocked_result);
    }

    async fn maybe_batch_filter(&self, invocations: Vec<ToolInvocation>) -> Vec<ToolInvocation> {
        if invocations.len() < 3 {
            return invocations;
        }
        let Some(filterer) = &self.batch_filterer else {
            return invocations;
        };
        match filterer.filter(&invocations).await {
            Ok(filtered) => {
                if filtered.len() != invocations.len() {
                    debug!(original = invocations.len(), filtered = filtered.len(), "batch filter reduced invocation count");
                }
                filtered
            }
            Err(e) => {
                warn!(error = %e, "batch filter errored; keeping original batch");
                invocations
            }
        }
    }

    async fn maybe_refresh_graph(&self, session: &mut SessionState) {
        let dirty = session.dirty_files();
        if dirty.is_empty() {
            return;
        }
        let Some(refresher) = &self.refresher else {
            return;
        };
        match refresher.refresh(&dirty).await {
            Ok(outcome) => {
                session.clear_dirty(&outcome.files_refreshed);
                self.events.emit(
                    "graph_refreshed",
                    &[
                        ("nodes_added", &outcome.nodes_added.to_string()),
                        ("nodes_removed", &outcome.nodes_removed.to_string()),
                    ],
                );
                if let Some(cache) = &self.resolution_cache {
                    cache.clear();
                }
            }
            Err(e) => {
                warn!(error = %e, "graph refresh failed; continuing with stale data");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aleutian_core::{Result as CoreResult, SafetyOutcome, SessionId};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingCrs {
        failures: Mutex<Vec<FailureEvent>>,
        proof_updates: Mutex<Vec<ProofUpdate>>,
        disproofs: Mutex<Vec<String>>,
    }

    impl ConflictReasoningStore for RecordingCrs {
        fn update_proof_number(&self, update: ProofUpdate) {
            self.proof_updates.lock().push(update);
        }
        fn propagate_disproof(&self, node_id: &str) -> usize {
            self.disproofs.lock().push(node_id.to_string());
            1
        }
        fn record_safety_violation(&self, _node_id: &str, _message: &str, _constraints: &[String]) {}
        fn record_failure(&self, event: FailureEvent) {
            self.failures.lock().push(event);
        }
        fn check_cycle(&self, _node_id: &str) -> Option<String> {
            None
        }
    }

    struct AlwaysSucceedsExecutor;
    #[async_trait]
    impl ToolExecutor for AlwaysSucceedsExecutor {
        async fn execute(&self, invocation: &ToolInvocation) -> CoreResult<ToolResult> {
            Ok(ToolResult::ok(format!("ran {}", invocation.tool_name)))
        }
    }

    struct AlwaysNotFoundExecutor;
    #[async_trait]
    impl ToolExecutor for AlwaysNotFoundExecutor {
        async fn execute(&self, _invocation: &ToolInvocation) -> CoreResult<ToolResult> {
            Ok(ToolResult::err("symbol 'foo' does not exist"))
        }
    }

    struct BlockingSafetyGate;
    #[async_trait]
    impl SafetyGate for BlockingSafetyGate {
        async fn check(&self, _invocation: &ToolInvocation) -> CoreResult<SafetyOutcome> {
            Ok(SafetyOutcome {
                blocked: true,
                result: None,
                constraints: vec!["no destructive ops".to_string()],
                error_message: Some("blocked: would modify protected path".to_string()),
            })
        }
    }

    fn invocation(tool: &str, params: serde_json::Value) -> ToolInvocation {
        ToolInvocation {
            id: uuid::Uuid::new_v4(),
            tool_name: tool.to_string(),
            typed_params: params,
        }
    }

    #[tokio::test]
    async fn count_circuit_breaker_fires_and_returns_early() {
        let crs = Arc::new(RecordingCrs::default());
        let executor = Executor::new(crs.clone()).with_tool_executor(Arc::new(AlwaysSucceedsExecutor));
        let mut session = SessionState::new(SessionId::new_v4());

        let invocations = vec![
            invocation("find-callers", serde_json::json!({"raw_name": "x"})),
            invocation("find-callers", serde_json::json!({"raw_name": "y"})),
            invocation("find-callers", serde_json::json!({"raw_name": "z"})),
        ];
        let outcome = executor.execute_batch(&mut session, invocations).await;

        // First call succeeds (count 0 < threshold 2). Second call: count is
        // now 1, still < 2, succeeds. Third call: count is 2 >= threshold,
        // blocked, and this is the first consecutive fire so the loop does
        // not yet return early.
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results[0].success);
        assert!(outcome.results[1].success);
        assert!(!outcome.results[2].success);
        assert!(session.circuit_breaker_active);
    }

    #[tokio::test]
    async fn consecutive_breaker_fires_stop_the_loop_early() {
        let crs = Arc::new(RecordingCrs::default());
        let executor = Executor::new(crs).with_tool_executor(Arc::new(AlwaysSucceedsExecutor));
        let mut session = SessionState::new(SessionId::new_v4());

        // Seed the session trace as if find-callers already ran twice.
        session.trace.push(TraceStep::new("tool_call", "find-callers"));
        session.trace.push(TraceStep::new("tool_call", "find-callers"));

        let invocations = vec![
            invocation("find-callers", serde_json::json!({"raw_name": "x"})),
            invocation("find-callers", serde_json::json!({"raw_name": "y"})),
            invocation("find-callers", serde_json::json!({"raw_name": "z"})),
        ];
        let outcome = executor.execute_batch(&mut session, invocations).await;

        // All three are already at/above threshold (count starts at 2), so
        // the first fire is consecutive #1 and the second is consecutive #2
        // — the loop returns before the third invocation runs.
        assert_eq!(outcome.results.len(), 2);
        assert!(!outcome.results[0].success);
        assert!(!outcome.results[1].success);
    }

    #[tokio::test]
    async fn duplicate_fingerprint_in_batch_is_blocked() {
        let crs = Arc::new(RecordingCrs::default());
        let executor = Executor::new(crs).with_tool_executor(Arc::new(AlwaysSucceedsExecutor));
        let mut session = SessionState::new(SessionId::new_v4());

        let params = serde_json::json!({"raw_name": "flush"});
        let invocations = vec![
            invocation("find-callers", params.clone()),
            invocation("find-callers", params),
        ];
        let outcome = executor.execute_batch(&mut session, invocations).await;

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[0].success);
        assert!(!outcome.results[1].success);
    }

    #[tokio::test]
    async fn safety_block_records_trace_and_failure_and_disproof() {
        let crs = Arc::new(RecordingCrs::default());
        let executor = Executor::new(crs.clone())
            .with_tool_executor(Arc::new(AlwaysSucceedsExecutor))
            .with_safety_gate(Arc::new(BlockingSafetyGate));
        let mut session = SessionState::new(SessionId::new_v4());

        let outcome = executor
            .execute_batch(&mut session, vec![invocation("find-callers", serde_json::json!({"raw_name": "rm_rf"}))])
            .await;

        assert_eq!(outcome.results.len(), 1);
        assert!(!outcome.results[0].success);
        assert_eq!(session.trace.len(), 1);
        assert_eq!(session.trace[0].action, "tool_call");
        assert_eq!(crs.failures.lock().len(), 1);
        assert_eq!(crs.failures.lock()[0].category as u8, FailureCategory::Safety as u8);
        assert_eq!(crs.disproofs.lock().len(), 1);
    }

    #[tokio::test]
    async fn not_found_error_is_normalized_to_successful_result() {
        let crs = Arc::new(RecordingCrs::default());
        let executor = Executor::new(crs).with_tool_executor(Arc::new(AlwaysNotFoundExecutor));
        let mut session = SessionState::new(SessionId::new_v4());

        let outcome = executor
            .execute_batch(&mut session, vec![invocation("find-callers", serde_json::json!({"raw_name": "foo"}))])
            .await;

        assert!(outcome.results[0].success);
        assert!(outcome.results[0].output_text.starts_with("## Search Result: Not Found"));
        assert_eq!(session.trace[0].error, None);
    }

    #[tokio::test]
    async fn three_not_found_results_trigger_synthesize_now_block() {
        let crs = Arc::new(RecordingCrs::default());
        let executor = Executor::new(crs).with_tool_executor(Arc::new(AlwaysNotFoundExecutor));
        let mut session = SessionState::new(SessionId::new_v4());

        let invocations = vec![
            invocation("find-callers", serde_json::json!({"raw_name": "a"})),
            invocation("find-callees", serde_json::json!({"raw_name": "b"})),
            invocation("find-references", serde_json::json!({"raw_name": "c"})),
        ];
        let outcome = executor.execute_batch(&mut session, invocations).await;

        assert_eq!(outcome.results.len(), 4);
        assert!(outcome.blocked);
    }

    #[tokio::test]
    async fn successful_results_accumulate_tokens_from_struct_field() {
        let crs = Arc::new(RecordingCrs::default());
        let executor = Executor::new(crs).with_tool_executor(Arc::new(AlwaysSucceedsExecutor));
        let mut session = SessionState::new(SessionId::new_v4());

        executor
            .execute_batch(&mut session, vec![invocation("find-callers", serde_json::json!({"raw_name": "a"}))])
            .await;

        assert_eq!(session.metrics.total_tool_calls, 1);
    }
}
