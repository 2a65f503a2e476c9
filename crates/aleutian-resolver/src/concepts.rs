// ABOUTME: YAML-loaded concept synonym dictionary for conceptual resolution
// ABOUTME: (spec.md §4.2 step 5), e.g. `rendering -> draw, paint, render, compose`

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ConceptDictionary {
    #[serde(flatten)]
    pub concepts: HashMap<String, Vec<String>>,
}

impl ConceptDictionary {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Built-in default dictionary covering the common rendering/storage/
    /// networking concept families, used when no external YAML is wired.
    pub fn default_dictionary() -> Self {
        let yaml = r#"
rendering: [draw, paint, render, compose]
compaction: [merge, compact, gc, vacuum]
persistence: [save, flush, write, persist, store]
networking: [send, recv, dial, listen, connect]
parsing: [tokenize, lex, scan, parse]
caching: [cache, memoize, evict]
"#;
        Self::from_yaml(yaml).expect("built-in concept dictionary is valid yaml")
    }

    /// Synonym values (length ≥ 4) for a concept key, if the key exists.
    pub fn synonyms(&self, key: &str) -> Vec<&str> {
        self.concepts
            .get(&key.to_lowercase())
            .map(|values| values.iter().map(String::as_str).filter(|v| v.len() >= 4).collect())
            .unwrap_or_default()
    }

    pub fn is_concept_key(&self, word: &str) -> bool {
        self.concepts.contains_key(&word.to_lowercase())
    }
}
