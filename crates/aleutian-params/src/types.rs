// ABOUTME: The typed parameter family: one variant per tool, each carrying
// ABOUTME: strongly-typed fields with defaults, plus a uniform to_map() projection

use std::collections::HashMap;

const NO_PARAM_TOOLS: &[&str] = &["list-packages", "find-entry-points", "find-extractable-regions"];

const SINGLE_FUNCTION_TOOLS: &[&str] = &[
    "find-callers",
    "find-callees",
    "find-references",
    "find-implementations",
    "find-dominators",
    "find-critical-path",
    "find-control-dependencies",
    "get-call-chain",
];

const TWO_ENDPOINT_TOOLS: &[&str] = &["find-path", "find-common-dependency"];

const TOP_N_TOOLS: &[&str] = &[
    "find-hotspots",
    "find-important",
    "find-weighted-criticality",
    "find-articulation-points",
    "find-communities",
    "find-module-api",
    "find-loops",
    "find-merge-points",
];

const GREP_TOOLS: &[&str] = &["search", "grep"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    NoParam,
    SingleFunction,
    TwoEndpoint,
    TopN,
    Grep,
}

pub fn categorize(tool_name: &str) -> ToolCategory {
    if NO_PARAM_TOOLS.contains(&tool_name) {
        ToolCategory::NoParam
    } else if SINGLE_FUNCTION_TOOLS.contains(&tool_name) {
        ToolCategory::SingleFunction
    } else if TWO_ENDPOINT_TOOLS.contains(&tool_name) {
        ToolCategory::TwoEndpoint
    } else if TOP_N_TOOLS.contains(&tool_name) {
        ToolCategory::TopN
    } else if GREP_TOOLS.contains(&tool_name) {
        ToolCategory::Grep
    } else {
        // Tools outside the representative table are treated as
        // single-function by default, the most common shape.
        ToolCategory::SingleFunction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    FilesWithMatches,
    Count,
    Content,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::FilesWithMatches => "files_with_matches",
            OutputMode::Count => "count",
            OutputMode::Content => "content",
        }
    }

    /// Deduce the output mode from keywords in the query. Defaults to `Content`.
    pub fn from_query(query: &str) -> Self {
        let lower = query.to_lowercase();
        if lower.contains("which files") || lower.contains("file list") || lower.contains("files with") {
            OutputMode::FilesWithMatches
        } else if lower.contains("how many") || lower.contains("count of") || lower.contains("number of") {
            OutputMode::Count
        } else {
            OutputMode::Content
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmptyParams {
    pub tool_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SingleFunctionParams {
    pub tool_name: String,
    pub symbol_id: Option<String>,
    pub raw_name: String,
    pub package_hint: Option<String>,
    /// `get-call-chain`'s dual-endpoint resolution for "from X to Y" queries.
    pub dual_endpoint: Option<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct TwoEndpointParams {
    pub tool_name: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Low,
    Medium,
    High,
}

impl Resolution {
    pub fn as_f32(&self) -> f32 {
        match self {
            Resolution::Low => 0.5,
            Resolution::Medium => 1.0,
            Resolution::High => 2.0,
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Medium
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopNParams {
    pub tool_name: String,
    pub top_n: usize,
    pub kind: Option<String>,
    pub sort_by: Option<String>,
    pub exclude_tests: bool,
    pub reverse: bool,
    pub resolution: Resolution,
    pub include_bridges: bool,
    pub show_nesting: bool,
    pub show_irreducible: bool,
    /// `find-merge-points`'s `sources` list (spec.md §9 open question):
    /// parsed and carried for wire-format completeness, but deliberately
    /// never read by the executor or synthesizer — see DESIGN.md.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GrepParams {
    pub tool_name: String,
    pub pattern: String,
    pub output_mode: Option<OutputMode>,
}

/// Tagged family of typed parameter records, one variant per tool, each
/// carrying the tool's name plus strongly-typed fields with defaults.
#[derive(Debug, Clone)]
pub enum TypedParams {
    Empty(EmptyParams),
    SingleFunction(SingleFunctionParams),
    TwoEndpoint(TwoEndpointParams),
    TopN(TopNParams),
    Grep(GrepParams),
}

impl TypedParams {
    pub fn tool_name(&self) -> &str {
        match self {
            TypedParams::Empty(p) => &p.tool_name,
            TypedParams::SingleFunction(p) => &p.tool_name,
            TypedParams::TwoEndpoint(p) => &p.tool_name,
            TypedParams::TopN(p) => &p.tool_name,
            TypedParams::Grep(p) => &p.tool_name,
        }
    }

    /// Uniform projection to a string map, used for logging and LLM hinting.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("tool_name".to_string(), self.tool_name().to_string());
        match self {
            TypedParams::Empty(_) => {}
            TypedParams::SingleFunction(p) => {
                if let Some(id) = &p.symbol_id {
                    map.insert("symbol_id".to_string(), id.clone());
                }
                map.insert("raw_name".to_string(), p.raw_name.clone());
                if let Some(pkg) = &p.package_hint {
                    map.insert("package_hint".to_string(), pkg.clone());
                }
                if let Some((from, to)) = &p.dual_endpoint {
                    map.insert("dual_from".to_string(), from.clone());
                    map.insert("dual_to".to_string(), to.clone());
                }
            }
            TypedParams::TwoEndpoint(p) => {
                map.insert("from".to_string(), p.from.clone());
                map.insert("to".to_string(), p.to.clone());
            }
            TypedParams::TopN(p) => {
                map.insert("top_n".to_string(), p.top_n.to_string());
                if let Some(kind) = &p.kind {
                    map.insert("kind".to_string(), kind.clone());
                }
                if let Some(sort_by) = &p.sort_by {
                    map.insert("sort_by".to_string(), sort_by.clone());
                }
                map.insert("exclude_tests".to_string(), p.exclude_tests.to_string());
                map.insert("reverse".to_string(), p.reverse.to_string());
                map.insert("resolution".to_string(), p.resolution.as_f32().to_string());
                map.insert("include_bridges".to_string(), p.include_bridges.to_string());
                map.insert("show_nesting".to_string(), p.show_nesting.to_string());
                map.insert("show_irreducible".to_string(), p.show_irreducible.to_string());
                if !p.sources.is_empty() {
                    map.insert("sources".to_string(), p.sources.join(","));
                }
            }
            TypedParams::Grep(p) => {
                map.insert("pattern".to_string(), p.pattern.clone());
                if let Some(mode) = &p.output_mode {
                    map.insert("output_mode".to_string(), mode.as_str().to_string());
                }
            }
        }
        map
    }
}
