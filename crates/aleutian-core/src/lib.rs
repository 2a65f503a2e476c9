// ABOUTME: Shared types, error kinds, and external-collaborator traits
// ABOUTME: for the tool execution and symbol resolution core

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::ExecutorConfig;
pub use error::{CoreError, Result};
pub use traits::{
    BatchFilterer, ConflictReasoningStore, CoordinatorEvents, FailureCategory, FailureEvent,
    FailureSource, GraphAnalytics, GraphNode, GraphRefresher, ProofUpdate, QueryEmbedder,
    RefreshOutcome, SafetyGate, SafetyOutcome, SymbolIndex, ToolExecutor, TracingCoordinatorEvents,
};
pub use types::{
    ResolutionStrategy, SessionId, SessionMetrics, SessionState, Symbol, SymbolKind,
    SymbolResolution, ToolInvocation, ToolResult, TraceStep,
};
