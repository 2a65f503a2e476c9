// ABOUTME: Query Analyzer (C1): turns a free-text query into ranked candidates,
// ABOUTME: context hints and a corrected tool name, with no graph or LLM access

pub mod candidates;
pub mod context;
pub mod secondary;
pub mod validator;

pub use candidates::extract_candidates;
pub use context::{extract_interface_name, extract_package_context, extract_path_endpoints, extract_search_pattern, PathEndpoints};
pub use secondary::{extract_exclude_tests, extract_kind_filter, extract_reverse, extract_sort_dimension, extract_top_n, SortDimension};
pub use validator::{validate_tool_name, ValidationOutcome, ValidatorCache};

/// Everything C1 extracts from a single free-text query, gathered in one
/// pass. C3 combines this with resolver output to build typed parameters;
/// C4/C5 never call the analyzer directly.
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    pub candidates: Vec<String>,
    pub interface_name: Option<String>,
    pub package_context: Option<String>,
    pub path_endpoints: Option<PathEndpoints>,
    pub search_pattern: Option<String>,
    pub top_n: usize,
    pub sort_dimension: SortDimension,
    pub exclude_tests: bool,
    pub reverse: bool,
    pub kind_filter: Option<String>,
}

/// Runs the full §4.1 extraction pass over a query. Pure and deterministic;
/// never touches the graph or an LLM (out-of-scope contract).
pub fn analyze(query: &str) -> QueryAnalysis {
    QueryAnalysis {
        candidates: extract_candidates(query),
        interface_name: extract_interface_name(query),
        package_context: extract_package_context(query),
        path_endpoints: extract_path_endpoints(query),
        search_pattern: extract_search_pattern(query),
        top_n: extract_top_n(query),
        sort_dimension: extract_sort_dimension(query),
        exclude_tests: extract_exclude_tests(query),
        reverse: extract_reverse(query),
        kind_filter: extract_kind_filter(query),
    }
}
