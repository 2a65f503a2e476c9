// ABOUTME: Interface-name, package/module context, path-endpoint and
// ABOUTME: search-pattern extraction for the Query Analyzer (spec.md §4.1 items 2-5)

use once_cell::sync::Lazy;
use regex::Regex;

static IMPLEMENTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:extends?|implements?|subclasses?)\s+(?:of\s+)?([A-Za-z_][A-Za-z0-9_]*)\b|\b([A-Za-z_][A-Za-z0-9_]*)\s+class\b").unwrap()
});

static IN_PACKAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:in|within)\s+(?:the\s+)?([A-Za-z0-9_./-]+(?:\s+[A-Za-z0-9_./-]+)*?)\s+(?:and\s+[a-z0-9_./-]+\s+)?(?:subsystem|package|module|lib|directory|class|component|pipeline|system|code|path)\b|\b(?:in|within)\s+(?:the\s+)?([A-Za-z0-9_./-]+)\b",
    )
    .unwrap()
});

const GENERIC_CONTEXT_WORDS: &[&str] = &[
    "the", "this", "that", "main", "core", "src", "lib", "app", "code", "system",
];

/// Extract the interface/base-type name for "extends/implements/subclasses of
/// X" or "X class" implementation queries.
pub fn extract_interface_name(query: &str) -> Option<String> {
    IMPLEMENTS_RE.captures(query).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    })
}

/// Extract a package/module/subsystem hint from "in/within [the] <name>
/// [subsystem|package|...]" phrasing — the trailing context noun is
/// optional (spec.md §4.1 item 3).
///
/// Respects file-path tokens (containing `/`, returned as-is), skips a
/// generic-word block-list, and applies the project-name + domain-noun
/// combination rule: when the captured phrase is two words and the first is
/// capitalized (a likely project name) while the second is a lowercase
/// domain noun, only the domain noun is kept (e.g. "in the Pandas indexing
/// and selection code" → "indexing").
pub fn extract_package_context(query: &str) -> Option<String> {
    let caps = IN_PACKAGE_RE.captures(query)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();

    if raw.contains('/') {
        return Some(raw.to_string());
    }

    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    if words.len() >= 2 {
        let first = words[0];
        let second = words[1];
        let first_capitalized = first.chars().next().map_or(false, |c| c.is_uppercase());
        let second_lowercase = second.chars().next().map_or(false, |c| c.is_lowercase());
        if first_capitalized && second_lowercase {
            return Some(second.to_string());
        }
    }

    let candidate = words[0];
    if GENERIC_CONTEXT_WORDS.contains(&candidate.to_lowercase().as_str()) {
        return None;
    }
    // Skip bare capitalized single words: likely a project name, not a package.
    if words.len() == 1 && candidate.chars().next().map_or(false, |c| c.is_uppercase()) {
        return None;
    }

    Some(candidate.to_string())
}

/// Path endpoints for "from <X> to <Y>" queries. Returns (from, to_single,
/// to_multi) where `to_multi` is the richer up-to-four-word capture, used
/// by conceptual resolution when it carries more than one word. `LastIndex`
/// semantics: the *final* "to" in the query is used, so multi-hop queries
/// pick the final destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEndpoints {
    pub from: String,
    pub to_single: String,
    pub to_multi: Option<String>,
}

pub fn extract_path_endpoints(query: &str) -> Option<PathEndpoints> {
    static FROM_TO_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\bfrom\s+([A-Za-z_][A-Za-z0-9_]*)\s+to\s+").unwrap()
    });

    let caps = FROM_TO_RE.captures(query)?;
    let from = caps.get(1)?.as_str().to_string();

    // Find the *last* standalone "to" token to anchor the destination.
    static TO_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bto\b").unwrap());
    let last_to = TO_TOKEN_RE.find_iter(query).last()?;
    let after = &query[last_to.end()..];

    let words: Vec<&str> = after
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|w| !w.is_empty())
        .collect();

    let to_single = words.first()?.to_string();
    let multi_count = words.len().min(4);
    let to_multi = if multi_count > 1 {
        Some(words[..multi_count].join(" "))
    } else {
        None
    };

    Some(PathEndpoints {
        from,
        to_single,
        to_multi,
    })
}

/// Extract a grep-style search pattern, e.g. from a quoted phrase or the
/// remainder of a "search for X" / "grep X" query.
pub fn extract_search_pattern(query: &str) -> Option<String> {
    static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());
    if let Some(caps) = QUOTED_RE.captures(query) {
        return Some(caps[1].to_string());
    }

    static SEARCH_FOR_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\b(?:search|grep)\s+(?:for\s+)?(.+)$").unwrap());
    SEARCH_FOR_RE
        .captures(query)
        .map(|caps| caps[1].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_extends_pattern() {
        assert_eq!(
            extract_interface_name("what implements Iterator"),
            Some("Iterator".to_string())
        );
    }

    #[test]
    fn package_in_subsystem_phrase() {
        assert_eq!(
            extract_package_context("what does Build call in the hugolib package?"),
            Some("hugolib".to_string())
        );
    }

    #[test]
    fn package_in_phrase_without_trailing_noun() {
        assert_eq!(
            extract_package_context("what does Build call in hugolib?"),
            Some("hugolib".to_string())
        );
    }

    #[test]
    fn package_within_phrase_without_trailing_noun() {
        assert_eq!(
            extract_package_context("what does Build call within hugolib?"),
            Some("hugolib".to_string())
        );
    }

    #[test]
    fn package_project_plus_domain_noun_rule() {
        assert_eq!(
            extract_package_context("in the Pandas indexing and selection code"),
            Some("indexing".to_string())
        );
    }

    #[test]
    fn package_respects_file_path_tokens() {
        assert_eq!(
            extract_package_context("in src/server/handlers module"),
            Some("src/server/handlers".to_string())
        );
    }

    #[test]
    fn path_endpoints_basic() {
        let ep = extract_path_endpoints("Show the call chain from main to runRenderLoop").unwrap();
        assert_eq!(ep.from, "main");
        assert_eq!(ep.to_single, "runRenderLoop");
    }

    #[test]
    fn path_endpoints_multi_word_destination() {
        let ep = extract_path_endpoints("path from main to the render loop handler please").unwrap();
        assert_eq!(ep.from, "main");
        assert!(ep.to_multi.is_some());
    }

    #[test]
    fn path_endpoints_uses_last_to_for_multi_hop() {
        let ep =
            extract_path_endpoints("from main to parseArgs to runRenderLoop").unwrap();
        assert_eq!(ep.from, "main");
        assert_eq!(ep.to_single, "runRenderLoop");
    }

    #[test]
    fn search_pattern_from_quotes() {
        assert_eq!(
            extract_search_pattern(r#"search for "TODO: fix me""#),
            Some("TODO: fix me".to_string())
        );
    }
}
