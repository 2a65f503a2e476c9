use crate::error::Result;
use crate::types::{Symbol, ToolInvocation, ToolResult};
use async_trait::async_trait;
use std::time::Duration;

/// External collaborator: the code-graph's symbol index. Only this interface
/// is in scope for this crate — the index itself (parsing, storage) is not.
#[async_trait]
pub trait SymbolIndex: Send + Sync {
    fn get_by_id(&self, id: &str) -> Option<Symbol>;

    fn get_by_name(&self, name: &str) -> Vec<Symbol>;

    /// Bounded, ranked search. Implementations must enforce their own
    /// timeout if given an open-ended budget; callers additionally apply a
    /// 500ms default via `tokio::time::timeout`.
    async fn search(&self, query: &str, limit: usize, timeout: Duration) -> Result<Vec<Symbol>>;

    /// Test/setup hook.
    fn add(&self, symbol: Symbol);
}

/// A node's edges in the call/dependency graph.
#[derive(Debug, Clone, Default)]
pub struct GraphNode {
    pub outgoing: Vec<String>,
    pub incoming: Vec<String>,
}

/// External collaborator: graph analytics over the code graph.
pub trait GraphAnalytics: Send + Sync {
    fn get_node(&self, id: &str) -> Option<GraphNode>;
}

/// Outcome of refreshing the graph for a set of dirty files.
#[derive(Debug, Clone, Default)]
pub struct RefreshOutcome {
    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub files_refreshed: Vec<String>,
    pub duration: Duration,
}

/// External collaborator: lazily refreshes the graph for dirty files.
#[async_trait]
pub trait GraphRefresher: Send + Sync {
    async fn refresh(&self, dirty_files: &[String]) -> Result<RefreshOutcome>;
}

/// A single proof-number update, as emitted by the Executor after every step.
#[derive(Debug, Clone)]
pub struct ProofUpdate {
    pub node_id: String,
    pub delta: i64,
    pub reason: String,
    pub source: FailureSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Safety,
    CountCircuitBreaker,
    SemanticRepetition,
    Validation,
    ToolExecution,
}

#[derive(Debug, Clone)]
pub struct FailureEvent {
    pub node_id: String,
    pub category: FailureCategory,
    pub message: String,
    pub source: FailureSource,
}

/// External collaborator: the Conflict-driven Reasoning Store. Tracks proof
/// numbers, learns from failures, detects cycles, and records traces. Only
/// the interface is in scope; a minimal in-memory implementation sufficient
/// to drive the Executor's own tests lives in `aleutian-executor`'s test
/// support, not here.
pub trait ConflictReasoningStore: Send + Sync {
    fn update_proof_number(&self, update: ProofUpdate);

    /// Marks `node_id` disproven and propagates the disproof to its parents,
    /// returning the number of affected nodes.
    fn propagate_disproof(&self, node_id: &str) -> usize;

    fn record_safety_violation(&self, node_id: &str, message: &str, constraints: &[String]);

    fn record_failure(&self, event: FailureEvent);

    /// Brent's-algorithm cycle detection, amortized O(1) per step. Returns
    /// the cycle's representative node id if one was just closed.
    fn check_cycle(&self, node_id: &str) -> Option<String>;
}

/// External collaborator: a single tool's execution contract.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, invocation: &ToolInvocation) -> Result<ToolResult>;
}

/// Outcome of the safety gate's review of one invocation (spec.md §4.4 step 6).
#[derive(Debug, Clone, Default)]
pub struct SafetyOutcome {
    pub blocked: bool,
    pub result: Option<ToolResult>,
    pub constraints: Vec<String>,
    pub error_message: Option<String>,
}

/// External collaborator: reviews an invocation before dispatch. A gate that
/// errors is treated as non-fatal — the loop continues with degraded
/// guarantees (spec.md §7).
#[async_trait]
pub trait SafetyGate: Send + Sync {
    async fn check(&self, invocation: &ToolInvocation) -> Result<SafetyOutcome>;
}

/// External collaborator: best-effort whole-batch filtering, wired on the
/// session's router. On error the caller keeps the original batch.
#[async_trait]
pub trait BatchFilterer: Send + Sync {
    async fn filter(&self, invocations: &[ToolInvocation]) -> Result<Vec<ToolInvocation>>;
}

/// External collaborator: embeds a tool query for the semantic-repetition
/// cosine-similarity check (spec.md §4.4 step 9).
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// External collaborator: emits coordinator events observed by the wider
/// agent runtime (routing, invocation, tool-executed/-failed, cycle-detected,
/// graph-refreshed). A thin sink; the Executor never blocks on delivery.
pub trait CoordinatorEvents: Send + Sync {
    fn emit(&self, event: &str, fields: &[(&str, &str)]);
}

/// A `CoordinatorEvents` sink that only logs via `tracing`, used when no
/// richer event bus is wired (tests, the CLI dump utility).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCoordinatorEvents;

impl CoordinatorEvents for TracingCoordinatorEvents {
    fn emit(&self, event: &str, fields: &[(&str, &str)]) {
        let rendered: String = fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(event, "{rendered}");
    }
}
