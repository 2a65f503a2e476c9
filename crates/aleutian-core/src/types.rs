use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub type SessionId = Uuid;

/// Kind of a resolved code symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Type,
    Class,
    Struct,
    Interface,
    Enum,
    Variable,
    Constant,
    Field,
    Property,
    Import,
}

impl SymbolKind {
    /// True for the kinds C2's disambiguator/conceptual filter treat as callable.
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }

    /// True for the non-callable kinds conceptual resolution filters out entirely.
    pub fn is_non_callable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Import
                | SymbolKind::Variable
                | SymbolKind::Type
                | SymbolKind::Interface
                | SymbolKind::Class
                | SymbolKind::Struct
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Type => "type",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Import => "import",
        };
        write!(f, "{}", s)
    }
}

/// A code symbol owned by the graph; referenced by index and resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub language: String,
    pub exported: bool,
    pub receiver: Option<String>,
}

/// Resolution strategy that produced a symbol mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    Exact,
    Name,
    NameDisambiguated,
    NameAmbiguous,
    Substring,
    Fuzzy,
    FuzzyAmbiguous,
    Stem,
    Conceptual,
}

/// Result of resolving a surface name to a canonical graph symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolResolution {
    pub symbol_id: String,
    /// A coarse, per-strategy constant for observability only — never branched on.
    pub confidence: f32,
    pub strategy: ResolutionStrategy,
}

/// One invocation of a tool, exclusively owned by the Executor for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: Uuid,
    pub tool_name: String,
    pub typed_params: JsonValue,
}

impl ToolInvocation {
    /// Fingerprint used for within-batch duplicate detection: tool name plus
    /// a canonical rendering of its parameters.
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.tool_name, self.typed_params)
    }
}

/// Output of a single tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: JsonValue,
    pub output_text: String,
    pub error: Option<String>,
    pub tokens_used: usize,
    pub duration: Duration,
    pub truncated: bool,
    pub cached: bool,
    pub modified_files: Vec<String>,
    pub trace_step: Option<TraceStep>,
}

impl ToolResult {
    pub fn ok(output_text: impl Into<String>) -> Self {
        let text = output_text.into();
        Self {
            success: true,
            output: JsonValue::String(text.clone()),
            output_text: text,
            error: None,
            tokens_used: 0,
            duration: Duration::default(),
            truncated: false,
            cached: false,
            modified_files: Vec::new(),
            trace_step: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        let msg = error.into();
        Self {
            success: false,
            output: JsonValue::Null,
            output_text: String::new(),
            error: Some(msg),
            tokens_used: 0,
            duration: Duration::default(),
            truncated: false,
            cached: false,
            modified_files: Vec::new(),
            trace_step: None,
        }
    }
}

/// Append-only trace entry recorded for every invocation, success, failure or block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub action: String,
    pub tool: String,
    pub target: String,
    pub duration: Duration,
    pub error: Option<String>,
    pub metadata: HashMap<String, String>,
    pub symbols_found: Vec<String>,
}

impl TraceStep {
    pub fn new(action: impl Into<String>, tool: impl Into<String>) -> Self {
        let tool = tool.into();
        Self {
            action: action.into(),
            target: tool.clone(),
            tool,
            duration: Duration::default(),
            error: None,
            metadata: HashMap::new(),
            symbols_found: Vec::new(),
        }
    }

    /// Merge a tool-supplied trace step's richer metadata into this one.
    /// This is how later passes detect whether a graph tool produced
    /// substantive results (e.g. `match_count`, `total_implementations`).
    pub fn merge_from(&mut self, other: &TraceStep) {
        for (k, v) in &other.metadata {
            self.metadata.insert(k.clone(), v.clone());
        }
        if self.symbols_found.is_empty() {
            self.symbols_found = other.symbols_found.clone();
        }
    }
}

/// Per-session mutable state observed (and exclusively mutated) by the Executor.
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub total_tool_calls: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: SessionId,
    pub trace: Vec<TraceStep>,
    pub metrics: SessionMetrics,
    pub circuit_breaker_active: bool,
    pub graph_tool_had_substantive_results: bool,
    /// Single-writer-multiple-reader dirty set, drained by the next graph
    /// refresh (spec.md §4.5). Monotonic within a step.
    dirty_files: std::collections::HashSet<String>,
}

impl SessionState {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            trace: Vec::new(),
            metrics: SessionMetrics::default(),
            circuit_breaker_active: false,
            graph_tool_had_substantive_results: false,
            dirty_files: std::collections::HashSet::new(),
        }
    }

    /// Accumulate a tool's modified files into the dirty set. Monotonic
    /// within a step; cleared by `drain_dirty_files` on graph refresh.
    pub fn mark_dirty(&mut self, files: &[String]) {
        for f in files {
            self.dirty_files.insert(f.clone());
        }
    }

    pub fn dirty_files(&self) -> Vec<String> {
        self.dirty_files.iter().cloned().collect()
    }

    /// Clears exactly the files the refresher reported as refreshed.
    pub fn clear_dirty(&mut self, refreshed: &[String]) {
        for f in refreshed {
            self.dirty_files.remove(f);
        }
    }

    /// Cumulative per-tool invocation counts, recomputed from prior trace
    /// steps so counts are cumulative across router and LLM paths.
    pub fn tool_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for step in &self.trace {
            if step.action == "tool_call" || step.action == "tool_call_forced" {
                *counts.entry(step.tool.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}
