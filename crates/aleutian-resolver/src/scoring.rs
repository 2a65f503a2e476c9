// ABOUTME: Disambiguation scoring shared by exact-name disambiguation and
// ABOUTME: substring-match picking (spec.md §4.2 steps 2-3). Lower is better.

use aleutian_core::{GraphAnalytics, Symbol, SymbolKind};

const TEST_FILE_PENALTY: i64 = 50_000;
const NOT_EXPORTED_PENALTY: i64 = 20_000;
const UNDERSCORE_PREFIX_PENALTY: i64 = 10_000;
const ZERO_OUTGOING_EDGES_PENALTY: i64 = 5_000;
const ABSENT_FROM_GRAPH_PENALTY: i64 = 8_000;
const DEPTH_PENALTY_PER_SEGMENT: i64 = 1_000;
const QUERY_CONTEXT_FILE_BONUS: i64 = -3_000;
const QUERY_CONTEXT_NAME_BONUS: i64 = -4_000;
const NON_FUNCTION_KIND_BONUS_SUBSTRING: i64 = -5_000;
const FAN_OUT_BONUS_CAP: i64 = -2_000;
const MIN_CONTEXT_WORD_LEN: usize = 4;

/// Cross-language test-file detection: suffix/prefix patterns and directory
/// segments used across the common scripting and systems languages.
pub fn is_test_file(file_path: &str) -> bool {
    let lower = file_path.to_lowercase();
    let filename = lower.rsplit('/').next().unwrap_or(&lower);

    if filename.ends_with("_test.go")
        || filename.ends_with("_test.py")
        || filename.starts_with("test_")
        || filename == "conftest.py"
    {
        return true;
    }

    for ext in [".js", ".jsx", ".ts", ".tsx"] {
        if filename.ends_with(&format!(".test{ext}")) || filename.ends_with(&format!(".spec{ext}")) {
            return true;
        }
    }

    lower.split('/').any(|segment| {
        matches!(segment, "test" | "tests" | "__tests__" | "testing")
    })
}

fn kind_tie_break(kind: SymbolKind) -> i64 {
    if kind.is_callable() {
        0
    } else if matches!(
        kind,
        SymbolKind::Type | SymbolKind::Class | SymbolKind::Struct | SymbolKind::Interface | SymbolKind::Enum
    ) {
        1
    } else {
        2
    }
}

fn path_depth(file_path: &str) -> usize {
    file_path.matches('/').count()
}

/// Query words of length ≥ 4, excluding the search term itself.
fn context_words<'a>(query: &'a str, search_term: &str) -> Vec<&'a str> {
    query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.len() >= MIN_CONTEXT_WORD_LEN && !w.eq_ignore_ascii_case(search_term))
        .collect()
}

/// Score a candidate symbol for exact-name disambiguation (spec.md §4.2
/// step 2) and substring-match picking (step 3, when `prefer_non_function`
/// is set). Lower scores win.
pub fn score_candidate(
    symbol: &Symbol,
    search_term: &str,
    query: &str,
    graph: Option<&dyn GraphAnalytics>,
    prefer_non_function: bool,
) -> i64 {
    let mut score = 0i64;

    if is_test_file(&symbol.file_path) {
        score += TEST_FILE_PENALTY;
    }
    if !symbol.exported {
        score += NOT_EXPORTED_PENALTY;
    }
    if symbol.name.starts_with('_') {
        score += UNDERSCORE_PREFIX_PENALTY;
    }

    match graph.and_then(|g| g.get_node(&symbol.id)) {
        Some(node) if node.outgoing.is_empty() => score += ZERO_OUTGOING_EDGES_PENALTY,
        None => score += ABSENT_FROM_GRAPH_PENALTY,
        _ => {}
    }

    let depth = path_depth(&symbol.file_path);
    if depth > 2 {
        score += DEPTH_PENALTY_PER_SEGMENT * (depth as i64 - 2);
    }

    score += kind_tie_break(symbol.kind);

    if prefer_non_function && !symbol.kind.is_callable() {
        score += NON_FUNCTION_KIND_BONUS_SUBSTRING;
    }

    let ctx_words = context_words(query, search_term);
    if ctx_words
        .iter()
        .any(|w| symbol.file_path.to_lowercase().contains(&w.to_lowercase()))
    {
        score += QUERY_CONTEXT_FILE_BONUS;
    }

    for word in ctx_words {
        if symbol.name.to_lowercase().contains(&word.to_lowercase()) {
            score += QUERY_CONTEXT_NAME_BONUS;
        }
    }

    score
}

/// Fan-out bonus for substring-match picking: favors symbols with more call
/// edges, capped so it never outweighs the structural penalties above.
pub fn fan_out_bonus(symbol: &Symbol, graph: Option<&dyn GraphAnalytics>) -> i64 {
    let edges = graph
        .and_then(|g| g.get_node(&symbol.id))
        .map(|n| n.outgoing.len() + n.incoming.len())
        .unwrap_or(0);
    (-(edges as i64)).max(FAN_OUT_BONUS_CAP)
}
