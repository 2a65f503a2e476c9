// ABOUTME: The tool-name switch that builds a TypedParams variant from
// ABOUTME: analyzer candidates and resolver output (spec.md §4.3)

use crate::types::{
    categorize, EmptyParams, GrepParams, OutputMode, Resolution, SingleFunctionParams, ToolCategory,
    TopNParams, TwoEndpointParams, TypedParams,
};
use aleutian_analyzer::QueryAnalysis;
use aleutian_core::{CoreError, Result, SessionId};
use aleutian_resolver::SymbolResolver;

fn is_dot_notation(name: &str) -> bool {
    name.contains('.') && !name.contains('/')
}

/// Builds the typed parameter record for `tool_name` from the analyzer's
/// output and (when needed) the resolver's cascade.
pub async fn extract_params(
    tool_name: &str,
    query: &str,
    analysis: &QueryAnalysis,
    resolver: &SymbolResolver,
    session: SessionId,
) -> Result<TypedParams> {
    match categorize(tool_name) {
        ToolCategory::NoParam => Ok(TypedParams::Empty(EmptyParams {
            tool_name: tool_name.to_string(),
        })),

        ToolCategory::SingleFunction => {
            let raw_name = analysis
                .candidates
                .first()
                .cloned()
                .ok_or_else(|| CoreError::Validation(format!("{tool_name}: no candidate symbol name found in query")))?;

            let symbol_id = if is_dot_notation(&raw_name) {
                Some(raw_name.clone())
            } else {
                resolver
                    .resolve(session, &raw_name, query)
                    .await
                    .ok()
                    .map(|r| r.symbol_id)
            };

            let dual_endpoint = if tool_name == "get-call-chain" {
                if let Some(endpoints) = &analysis.path_endpoints {
                    let from_res = resolver.resolve(session, &endpoints.from, query).await.ok();
                    let to_name = endpoints.to_multi.as_deref().unwrap_or(&endpoints.to_single);
                    let to_res = resolver.resolve(session, to_name, query).await.ok();
                    match (from_res, to_res) {
                        (Some(from), Some(to)) => Some((from.symbol_id, to.symbol_id)),
                        _ => None,
                    }
                } else {
                    None
                }
            } else {
                None
            };

            Ok(TypedParams::SingleFunction(SingleFunctionParams {
                tool_name: tool_name.to_string(),
                symbol_id,
                raw_name,
                package_hint: analysis.package_context.clone(),
                dual_endpoint,
            }))
        }

        ToolCategory::TwoEndpoint => {
            let endpoints = analysis.path_endpoints.as_ref().ok_or_else(|| {
                CoreError::Validation(format!("{tool_name}: requires both a `from` and a `to` endpoint"))
            })?;
            let to = endpoints.to_multi.clone().unwrap_or_else(|| endpoints.to_single.clone());

            let from_res = resolver
                .resolve(session, &endpoints.from, query)
                .await
                .map(|r| r.symbol_id)
                .unwrap_or_else(|_| endpoints.from.clone());
            let to_res = resolver
                .resolve(session, &to, query)
                .await
                .map(|r| r.symbol_id)
                .unwrap_or(to);

            Ok(TypedParams::TwoEndpoint(TwoEndpointParams {
                tool_name: tool_name.to_string(),
                from: from_res,
                to: to_res,
            }))
        }

        ToolCategory::TopN => Ok(TypedParams::TopN(TopNParams {
            tool_name: tool_name.to_string(),
            top_n: analysis.top_n,
            kind: analysis.kind_filter.clone(),
            sort_by: Some(match analysis.sort_dimension {
                aleutian_analyzer::SortDimension::In => "in".to_string(),
                aleutian_analyzer::SortDimension::Out => "out".to_string(),
                aleutian_analyzer::SortDimension::Score => "score".to_string(),
            }),
            exclude_tests: analysis.exclude_tests,
            reverse: analysis.reverse,
            resolution: if tool_name == "find-weighted-criticality" {
                Resolution::High
            } else {
                Resolution::Medium
            },
            include_bridges: tool_name == "find-articulation-points",
            show_nesting: tool_name == "find-loops",
            show_irreducible: tool_name == "find-loops",
            // `find-merge-points`'s `sources` param is parsed (from the
            // resolved candidate list) but deliberately unread downstream —
            // spec.md §9 open question, decided in DESIGN.md.
            sources: if tool_name == "find-merge-points" {
                analysis.candidates.clone()
            } else {
                Vec::new()
            },
        })),

        ToolCategory::Grep => {
            let pattern = analysis
                .search_pattern
                .clone()
                .ok_or_else(|| CoreError::Validation(format!("{tool_name}: no search pattern found in query")))?;
            Ok(TypedParams::Grep(GrepParams {
                tool_name: tool_name.to_string(),
                pattern,
                output_mode: Some(OutputMode::from_query(query)),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aleutian_core::{Result as CoreResult, Symbol, SymbolIndex, SymbolKind};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeIndex {
        by_id: Mutex<HashMap<String, Symbol>>,
        by_name: Mutex<HashMap<String, Vec<Symbol>>>,
    }

    impl FakeIndex {
        fn insert(&self, symbol: Symbol) {
            self.by_id.lock().insert(symbol.id.clone(), symbol.clone());
            self.by_name.lock().entry(symbol.name.clone()).or_default().push(symbol);
        }
    }

    #[async_trait]
    impl SymbolIndex for FakeIndex {
        fn get_by_id(&self, id: &str) -> Option<Symbol> {
            self.by_id.lock().get(id).cloned()
        }

        fn get_by_name(&self, name: &str) -> Vec<Symbol> {
            self.by_name.lock().get(name).cloned().unwrap_or_default()
        }

        async fn search(&self, _query: &str, _limit: usize, _timeout: Duration) -> CoreResult<Vec<Symbol>> {
            Ok(Vec::new())
        }

        fn add(&self, symbol: Symbol) {
            self.insert(symbol);
        }
    }

    fn sym(id: &str, name: &str) -> Symbol {
        Symbol {
            id: id.to_string(),
            name: name.to_string(),
            kind: SymbolKind::Function,
            file_path: "src/lib.rs".to_string(),
            start_line: 1,
            end_line: 2,
            language: "rust".to_string(),
            exported: true,
            receiver: None,
        }
    }

    #[tokio::test]
    async fn no_param_tool_returns_empty_variant() {
        let index = Arc::new(FakeIndex::default());
        let resolver = SymbolResolver::new(index);
        let params = extract_params("list-packages", "list all packages", &QueryAnalysis {
            candidates: vec![],
            interface_name: None,
            package_context: None,
            path_endpoints: None,
            search_pattern: None,
            top_n: 10,
            sort_dimension: aleutian_analyzer::SortDimension::Score,
            exclude_tests: true,
            reverse: false,
            kind_filter: None,
        }, &resolver, SessionId::new_v4())
            .await
            .unwrap();
        assert_eq!(params.tool_name(), "list-packages");
        assert!(matches!(params, TypedParams::Empty(_)));
    }

    #[tokio::test]
    async fn single_function_tool_resolves_first_candidate() {
        let index = Arc::new(FakeIndex::default());
        index.insert(sym("sym1", "flush"));
        let resolver = SymbolResolver::new(index);
        let analysis = aleutian_analyzer::analyze("who calls flush?");
        let params = extract_params("find-callers", "who calls flush?", &analysis, &resolver, SessionId::new_v4())
            .await
            .unwrap();
        match params {
            TypedParams::SingleFunction(p) => {
                assert_eq!(p.raw_name, "flush");
                assert_eq!(p.symbol_id.as_deref(), Some("sym1"));
            }
            other => panic!("expected SingleFunction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_function_tool_fails_fast_without_candidate() {
        let index = Arc::new(FakeIndex::default());
        let resolver = SymbolResolver::new(index);
        let analysis = aleutian_analyzer::analyze("hello there");
        let err = extract_params("find-callers", "hello there", &analysis, &resolver, SessionId::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn two_endpoint_tool_requires_both_endpoints() {
        let index = Arc::new(FakeIndex::default());
        let resolver = SymbolResolver::new(index);
        let analysis = aleutian_analyzer::analyze("hello there");
        let err = extract_params("find-path", "hello there", &analysis, &resolver, SessionId::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn top_n_tool_applies_secondary_params() {
        let index = Arc::new(FakeIndex::default());
        let resolver = SymbolResolver::new(index);
        let analysis = aleutian_analyzer::analyze("top 5 most complex functions, least complex first");
        let params = extract_params(
            "find-hotspots",
            "top 5 most complex functions, least complex first",
            &analysis,
            &resolver,
            SessionId::new_v4(),
        )
        .await
        .unwrap();
        match params {
            TypedParams::TopN(p) => {
                assert_eq!(p.top_n, 5);
                assert!(p.reverse);
            }
            other => panic!("expected TopN, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn merge_points_carries_sources_but_hotspots_does_not() {
        let index = Arc::new(FakeIndex::default());
        let resolver = SymbolResolver::new(index);

        let analysis = aleutian_analyzer::analyze("merge points from main and init");
        let params = extract_params("find-merge-points", "merge points from main and init", &analysis, &resolver, SessionId::new_v4())
            .await
            .unwrap();
        match params {
            TypedParams::TopN(p) => assert!(!p.sources.is_empty()),
            other => panic!("expected TopN, got {other:?}"),
        }

        let hotspots_analysis = aleutian_analyzer::analyze("top 5 most complex functions");
        let hotspots = extract_params("find-hotspots", "top 5 most complex functions", &hotspots_analysis, &resolver, SessionId::new_v4())
            .await
            .unwrap();
        match hotspots {
            TypedParams::TopN(p) => assert!(p.sources.is_empty()),
            other => panic!("expected TopN, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn grep_tool_requires_pattern() {
        let index = Arc::new(FakeIndex::default());
        let resolver = SymbolResolver::new(index);
        let analysis = aleutian_analyzer::analyze("hello there");
        let err = extract_params("grep", "hello there", &analysis, &resolver, SessionId::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
