// ABOUTME: Symbol Resolver (C2): maps a surface name to a canonical graph
// ABOUTME: symbol via the exact/name/substring/fuzzy/stem/conceptual cascade

pub mod concepts;
pub mod scoring;

use aleutian_core::{
    CoreError, GraphAnalytics, Result, SessionId, Symbol, SymbolIndex, SymbolKind, SymbolResolution,
    ResolutionStrategy,
};
use aleutian_llm::LLMProvider;
use concepts::ConceptDictionary;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const UNIFIED_SEARCH_LIMIT: usize = 50;
const UNIFIED_SEARCH_TIMEOUT: Duration = Duration::from_millis(500);
const CONCEPTUAL_CANDIDATES_PER_KEYWORD: usize = 25;
const MAX_SUGGESTIONS: usize = 3;
const MIN_DOMAIN_NOUN_LEN: usize = 4;

/// Session-scoped resolution cache: lookups are lock-free, stores are
/// monotonic within a refresh epoch, and the whole cache is atomically
/// reset to empty on graph-refresh notification.
#[derive(Default)]
pub struct ResolutionCache {
    entries: DashMap<(SessionId, String), SymbolResolution>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session: SessionId, surface_name: &str) -> Option<SymbolResolution> {
        self.entries
            .get(&(session, surface_name.to_string()))
            .map(|entry| entry.clone())
    }

    pub fn put(&self, session: SessionId, surface_name: &str, resolution: SymbolResolution) {
        self.entries.insert((session, surface_name.to_string()), resolution);
    }

    /// Invoked on graph-refresh notification (§4.4).
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// The Symbol Resolver. Holds the external `SymbolIndex`/`GraphAnalytics`
/// collaborators, a session-scoped cache, and an optional LLM oracle for
/// conceptual resolution.
pub struct SymbolResolver {
    index: Arc<dyn SymbolIndex>,
    graph: Option<Arc<dyn GraphAnalytics>>,
    llm: Option<Arc<dyn LLMProvider>>,
    concepts: ConceptDictionary,
    cache: ResolutionCache,
}

impl SymbolResolver {
    pub fn new(index: Arc<dyn SymbolIndex>) -> Self {
        Self {
            index,
            graph: None,
            llm: None,
            concepts: ConceptDictionary::default_dictionary(),
            cache: ResolutionCache::new(),
        }
    }

    pub fn with_graph(mut self, graph: Arc<dyn GraphAnalytics>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_concepts(mut self, concepts: ConceptDictionary) -> Self {
        self.concepts = concepts;
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    fn graph_ref(&self) -> Option<&dyn GraphAnalytics> {
        self.graph.as_deref()
    }

    /// Dot-notation passthrough: names containing `.` and no `/` bypass
    /// agent-side resolution entirely, since tool-side resolvers handle
    /// `Type.Method` via receiver filtering the agent cannot replicate.
    fn is_dot_notation_passthrough(name: &str) -> bool {
        name.contains('.') && !name.contains('/')
    }

    /// Resolves a single surface name via the full cascade, consulting and
    /// updating the session cache. Returns `symbol-not-found` with up to
    /// three suggestions, or `symbol-index-not-available`.
    #[instrument(skip(self, query), fields(surface_name = %surface_name))]
    pub async fn resolve(
        &self,
        session: SessionId,
        surface_name: &str,
        query: &str,
    ) -> Result<SymbolResolution> {
        if Self::is_dot_notation_passthrough(surface_name) {
            return Ok(SymbolResolution {
                symbol_id: surface_name.to_string(),
                confidence: 1.0,
                strategy: ResolutionStrategy::Exact,
            });
        }

        if let Some(cached) = self.cache.get(session, surface_name) {
            return Ok(cached);
        }

        let resolution = self.resolve_uncached(surface_name, query).await?;
        self.cache.put(session, surface_name, resolution.clone());
        Ok(resolution)
    }

    async fn resolve_uncached(&self, surface_name: &str, query: &str) -> Result<SymbolResolution> {
        // 1. Exact ID.
        if let Some(symbol) = self.index.get_by_id(surface_name) {
            return Ok(SymbolResolution {
                symbol_id: symbol.id,
                confidence: 1.0,
                strategy: ResolutionStrategy::Exact,
            });
        }

        // 2. Exact name, with disambiguation.
        let by_name = self.index.get_by_name(surface_name);
        if by_name.len() == 1 {
            return Ok(SymbolResolution {
                symbol_id: by_name[0].id.clone(),
                confidence: 0.95,
                strategy: ResolutionStrategy::Name,
            });
        }
        if by_name.len() > 1 {
            return Ok(self.disambiguate(&by_name, surface_name, query));
        }

        // 3. Unified bounded search.
        let hits = self
            .index
            .search(surface_name, UNIFIED_SEARCH_LIMIT, UNIFIED_SEARCH_TIMEOUT)
            .await?;
        if !hits.is_empty() {
            if let Some(resolution) = self.resolve_from_search(&hits, surface_name, query) {
                return Ok(resolution);
            }
        }

        // 4. Stem-expansion fallback.
        if let Some(resolution) = self.stem_expansion(&[surface_name.to_string()]).await? {
            return Ok(resolution);
        }

        // 5. Conceptual resolution, only when an LLM oracle is wired.
        if let Some(llm) = &self.llm {
            if let Some(resolution) = self.conceptual_resolve(surface_name, query, llm.as_ref()).await {
                return Ok(resolution);
            }
        }

        let suggestions = self.fuzzy_suggestions(surface_name).await;
        Err(CoreError::SymbolNotFound {
            surface_name: surface_name.to_string(),
            suggestions,
        })
    }

    /// Multi-candidate loop over C1's ranked candidate list: tries each in
    /// order, applying the fan-out quality gate (a zero-outgoing-edge
    /// resolution is skipped unless it's the last candidate), falling back
    /// to a single stem-expansion pass over the whole list if every
    /// candidate fails direct resolution.
    pub async fn resolve_candidates(
        &self,
        session: SessionId,
        candidates: &[String],
        query: &str,
    ) -> Result<SymbolResolution> {
        let mut last_err = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let is_last = i == candidates.len() - 1;
            match self.resolve(session, candidate, query).await {
                Ok(resolution) => {
                    let zero_outgoing = self
                        .graph_ref()
                        .and_then(|g| g.get_node(&resolution.symbol_id))
                        .map(|n| n.outgoing.is_empty())
                        .unwrap_or(false);
                    if zero_outgoing && !is_last {
                        debug!(candidate, "fan-out quality gate: skipping zero-outgoing resolution");
                        last_err = Some(Ok(resolution));
                        continue;
                    }
                    return Ok(resolution);
                }
                Err(e) => last_err = Some(Err(e)),
            }
        }

        if let Some(resolution) = self.stem_expansion(candidates).await? {
            return Ok(resolution);
        }

        match last_err {
            Some(result) => result,
            None => Err(CoreError::SymbolNotFound {
                surface_name: candidates.join(", "),
                suggestions: Vec::new(),
            }),
        }
    }

    fn disambiguate(&self, candidates: &[Symbol], surface_name: &str, query: &str) -> SymbolResolution {
        let mut scored: Vec<(i64, &Symbol)> = candidates
            .iter()
            .map(|s| (scoring::score_candidate(s, surface_name, query, self.graph_ref(), false), s))
            .collect();
        scored.sort_by_key(|(score, _)| *score);
        let (_, winner) = scored[0];

        let (confidence, strategy) = if winner.kind.is_callable() {
            (0.8, ResolutionStrategy::NameDisambiguated)
        } else {
            (0.6, ResolutionStrategy::NameAmbiguous)
        };

        SymbolResolution {
            symbol_id: winner.id.clone(),
            confidence,
            strategy,
        }
    }

    fn resolve_from_search(
        &self,
        hits: &[Symbol],
        surface_name: &str,
        query: &str,
    ) -> Option<SymbolResolution> {
        let lowered = surface_name.to_lowercase();
        let (substring, fuzzy): (Vec<&Symbol>, Vec<&Symbol>) = hits
            .iter()
            .partition(|s| s.name.to_lowercase().contains(&lowered));

        if !substring.is_empty() {
            let mut scored: Vec<(i64, &&Symbol)> = substring
                .iter()
                .map(|s| {
                    let base = scoring::score_candidate(s, surface_name, query, self.graph_ref(), true);
                    let fan_out = scoring::fan_out_bonus(s, self.graph_ref());
                    (base + fan_out, s)
                })
                .collect();
            scored.sort_by_key(|(score, _)| *score);
            let (_, winner) = scored[0];
            return Some(SymbolResolution {
                symbol_id: winner.id.clone(),
                confidence: 0.8,
                strategy: ResolutionStrategy::Substring,
            });
        }

        if fuzzy.is_empty() {
            return None;
        }

        if let Some(best_callable) = fuzzy.iter().find(|s| s.kind.is_callable()) {
            return Some(SymbolResolution {
                symbol_id: best_callable.id.clone(),
                confidence: 0.7,
                strategy: ResolutionStrategy::Fuzzy,
            });
        }

        Some(SymbolResolution {
            symbol_id: fuzzy[0].id.clone(),
            confidence: 0.5,
            strategy: ResolutionStrategy::FuzzyAmbiguous,
        })
    }

    /// Last resort for concept queries: search the index per candidate,
    /// keeping only callable results that contain the candidate as a
    /// substring and (when the graph is available) have at least one
    /// outgoing edge.
    async fn stem_expansion(&self, candidates: &[String]) -> Result<Option<SymbolResolution>> {
        let mut matches: Vec<Symbol> = Vec::new();
        for candidate in candidates {
            let hits = self
                .index
                .search(candidate, UNIFIED_SEARCH_LIMIT, UNIFIED_SEARCH_TIMEOUT)
                .await?;
            for symbol in hits {
                if !symbol.kind.is_callable() {
                    continue;
                }
                if !symbol.name.to_lowercase().contains(&candidate.to_lowercase()) {
                    continue;
                }
                let has_outgoing_edge = match self.graph_ref().and_then(|g| g.get_node(&symbol.id)) {
                    Some(node) => !node.outgoing.is_empty(),
                    None => true, // graph unavailable: don't gate on edges
                };
                if has_outgoing_edge {
                    matches.push(symbol);
                }
            }
        }

        if matches.is_empty() {
            return Ok(None);
        }

        matches.sort_by(|a, b| {
            let score = |s: &Symbol| scoring::score_candidate(s, "", "", self.graph_ref(), false);
            score(a).cmp(&score(b))
        });
        let winner = &matches[0];
        let in_graph = self.graph_ref().and_then(|g| g.get_node(&winner.id)).is_some();
        Ok(Some(SymbolResolution {
            symbol_id: winner.id.clone(),
            confidence: if in_graph { 0.6 } else { 0.5 },
            strategy: ResolutionStrategy::Stem,
        }))
    }

    /// Conceptual resolution via the LLM oracle. Failure or an empty pick
    /// returns `None`, leaving the caller to fall through to `symbol-not-found`.
    async fn conceptual_resolve(
        &self,
        hallucinated_name: &str,
        query: &str,
        llm: &dyn LLMProvider,
    ) -> Option<SymbolResolution> {
        let keywords: Vec<&str> = hallucinated_name
            .split(|c| c == '.' || c == '_')
            .filter(|k| !k.is_empty())
            .collect();

        let mut domain_nouns: Vec<&str> = Vec::new();
        let mut synonym_pool: Vec<&str> = Vec::new();
        for kw in &keywords {
            if self.concepts.is_concept_key(kw) {
                synonym_pool.extend(self.concepts.synonyms(kw));
            } else if kw.len() >= MIN_DOMAIN_NOUN_LEN {
                domain_nouns.push(kw);
            }
        }

        let mut search_terms: Vec<&str> = keywords.clone();
        search_terms.extend(synonym_pool.iter().copied());

        let mut candidates: Vec<Symbol> = Vec::new();
        for term in &search_terms {
            if let Ok(hits) = self
                .index
                .search(term, CONCEPTUAL_CANDIDATES_PER_KEYWORD, UNIFIED_SEARCH_TIMEOUT)
                .await
            {
                candidates.extend(hits.into_iter().filter(|s| !s.kind.is_non_callable()));
            }
        }

        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by(|a, b| {
            let tier = |s: &Symbol| -> u8 {
                let name_lower = s.name.to_lowercase();
                let has_domain_noun = domain_nouns.iter().any(|n| name_lower.contains(&n.to_lowercase()));
                let has_synonym = synonym_pool.iter().any(|n| name_lower.contains(&n.to_lowercase()));
                if has_domain_noun && has_synonym {
                    0
                } else if has_domain_noun {
                    1
                } else {
                    2
                }
            };
            let edges = |s: &Symbol| -> usize {
                self.graph_ref()
                    .and_then(|g| g.get_node(&s.id))
                    .map(|n| n.outgoing.len() + n.incoming.len())
                    .unwrap_or(0)
            };
            tier(a).cmp(&tier(b)).then(edges(b).cmp(&edges(a)))
        });

        let listing: String = candidates
            .iter()
            .take(CONCEPTUAL_CANDIDATES_PER_KEYWORD)
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "Query: {query}\nHallucinated name: {hallucinated_name}\nCandidates: {listing}\nPick the single best matching symbol name, or reply NONE."
        );

        let response = llm.generate(&prompt).await.ok()?;
        let picked = response.content.trim();
        if picked.is_empty() || picked.eq_ignore_ascii_case("none") {
            return None;
        }

        candidates
            .iter()
            .find(|s| s.name == picked)
            .map(|s| SymbolResolution {
                symbol_id: s.id.clone(),
                confidence: 0.6,
                strategy: ResolutionStrategy::Conceptual,
            })
    }

    async fn fuzzy_suggestions(&self, surface_name: &str) -> Vec<String> {
        self.index
            .search(surface_name, UNIFIED_SEARCH_LIMIT, UNIFIED_SEARCH_TIMEOUT)
            .await
            .unwrap_or_default()
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|s| s.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aleutian_core::GraphNode;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeIndex {
        by_id: Mutex<HashMap<String, Symbol>>,
        by_name: Mutex<HashMap<String, Vec<Symbol>>>,
    }

    impl FakeIndex {
        fn insert(&self, symbol: Symbol) {
            self.by_id.lock().insert(symbol.id.clone(), symbol.clone());
            self.by_name
                .lock()
                .entry(symbol.name.clone())
                .or_default()
                .push(symbol);
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

        async fn search(&self, query: &str, limit: usize, _timeout: Duration) -> Result<Vec<Symbol>> {
            let lowered = query.to_lowercase();
            let mut hits: Vec<Symbol> = self
                .by_id
                .lock()
                .values()
                .filter(|s| s.name.to_lowercase().contains(&lowered))
                .cloned()
                .collect();
            hits.truncate(limit);
            Ok(hits)
        }

        fn add(&self, symbol: Symbol) {
            self.insert(symbol);
        }
    }

    struct FakeGraph {
        nodes: HashMap<String, GraphNode>,
    }

    impl GraphAnalytics for FakeGraph {
        fn get_node(&self, id: &str) -> Option<GraphNode> {
            self.nodes.get(id).cloned()
        }
    }

    fn sym(id: &str, name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            file_path: format!("src/{}.rs", name),
            start_line: 1,
            end_line: 5,
            language: "rust".to_string(),
            exported: true,
            receiver: None,
        }
    }

    #[tokio::test]
    async fn exact_id_resolution() {
        let index = Arc::new(FakeIndex::default());
        index.insert(sym("sym1", "flush", SymbolKind::Function));
        let resolver = SymbolResolver::new(index);
        let resolution = resolver
            .resolve(SessionId::new_v4(), "sym1", "flush the memtable")
            .await
            .unwrap();
        assert_eq!(resolution.strategy, ResolutionStrategy::Exact);
        assert_eq!(resolution.confidence, 1.0);
    }

    #[tokio::test]
    async fn exact_name_single_hit() {
        let index = Arc::new(FakeIndex::default());
        index.insert(sym("sym1", "flush", SymbolKind::Function));
        let resolver = SymbolResolver::new(index);
        let resolution = resolver
            .resolve(SessionId::new_v4(), "flush", "flush the memtable")
            .await
            .unwrap();
        assert_eq!(resolution.strategy, ResolutionStrategy::Name);
    }

    #[tokio::test]
    async fn dot_notation_bypasses_resolution() {
        let index = Arc::new(FakeIndex::default());
        let resolver = SymbolResolver::new(index);
        let resolution = resolver
            .resolve(SessionId::new_v4(), "Writer.Flush", "anything")
            .await
            .unwrap();
        assert_eq!(resolution.symbol_id, "Writer.Flush");
        assert_eq!(resolution.strategy, ResolutionStrategy::Exact);
    }

    #[tokio::test]
    async fn disambiguates_toward_non_test_exported_symbol() {
        let index = Arc::new(FakeIndex::default());
        let mut prod = sym("1", "flush", SymbolKind::Function);
        prod.file_path = "src/memtable.rs".to_string();
        let mut test_copy = sym("2", "flush", SymbolKind::Function);
        test_copy.file_path = "tests/memtable_test.rs".to_string();
        index.insert(prod.clone());
        index.insert(test_copy);
        let resolver = SymbolResolver::new(index);
        let resolution = resolver
            .resolve(SessionId::new_v4(), "flush", "flush the memtable")
            .await
            .unwrap();
        assert_eq!(resolution.symbol_id, "1");
        assert_eq!(resolution.strategy, ResolutionStrategy::NameDisambiguated);
    }

    #[tokio::test]
    async fn session_cache_short_circuits_second_lookup() {
        let index = Arc::new(FakeIndex::default());
        index.insert(sym("1", "flush", SymbolKind::Function));
        let resolver = SymbolResolver::new(index);
        let session = SessionId::new_v4();
        let first = resolver.resolve(session, "flush", "flush").await.unwrap();
        assert!(resolver.cache().get(session, "flush").is_some());
        let second = resolver.resolve(session, "flush", "flush").await.unwrap();
        assert_eq!(first.symbol_id, second.symbol_id);
    }

    #[tokio::test]
    async fn symbol_not_found_carries_suggestions() {
        let index = Arc::new(FakeIndex::default());
        index.insert(sym("1", "flushWrite", SymbolKind::Function));
        let resolver = SymbolResolver::new(index);
        let err = resolver
            .resolve(SessionId::new_v4(), "flsh", "flsh the write buffer")
            .await
            .unwrap_err();
        match err {
            CoreError::SymbolNotFound { suggestions, .. } => assert!(suggestions.is_empty()),
            other => panic!("expected symbol-not-found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fan_out_quality_gate_skips_zero_outgoing_non_last_candidate() {
        let index = Arc::new(FakeIndex::default());
        index.insert(sym("leaf", "leafFn", SymbolKind::Function));
        index.insert(sym("hub", "hubFn", SymbolKind::Function));
        let mut nodes = HashMap::new();
        nodes.insert("leaf".to_string(), GraphNode::default());
        nodes.insert(
            "hub".to_string(),
            GraphNode {
                outgoing: vec!["somewhere".to_string()],
                incoming: vec![],
            },
        );
        let graph = Arc::new(FakeGraph { nodes });
        let resolver = SymbolResolver::new(index).with_graph(graph);
        let resolution = resolver
            .resolve_candidates(
                SessionId::new_v4(),
                &["leafFn".to_string(), "hubFn".to_string()],
                "trace",
            )
            .await
            .unwrap();
        assert_eq!(resolution.symbol_id, "hub");
    }
}
