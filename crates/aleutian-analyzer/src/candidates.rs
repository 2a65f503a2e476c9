// ABOUTME: Ranked function/type candidate extraction from free-text queries
// ABOUTME: Implements the fixed-priority pattern cascade of spec.md §4.1 rules 0-7

use once_cell::sync::Lazy;
use regex::Regex;

const KIND_KEYWORDS: &[&str] = &[
    "function",
    "method",
    "class",
    "struct",
    "interface",
    "enum",
    "type",
    "variable",
    "constant",
    "decorator",
    "module",
    "component",
    "property",
    "field",
    "parameter",
    "prototype",
    "constructor",
    "object",
];

/// Nouns that rule 6's relaxed skip-list normally treats as generic English
/// words, but which are allowed through when they're the symbol name
/// immediately followed by a kind keyword (e.g. "the component widget").
const RELAXED_PROGRAMMING_NOUNS: &[&str] = &["component", "object", "property"];

/// Generic English nouns that would otherwise be swept up by rule 6's
/// "<X> <kind-keyword>" pattern (e.g. "the object class" is not a query
/// about a symbol literally named "object"), unless they appear in
/// `RELAXED_PROGRAMMING_NOUNS`.
const GENERIC_SKIP_WORDS: &[&str] = &["component", "object", "property", "this", "that", "it"];

static TYPE_METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][A-Za-z0-9]*)\.([A-Za-z_][A-Za-z0-9_]*)\b").unwrap());

static METHOD_ON_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bthe\s+([A-Za-z_][A-Za-z0-9_]*)\s+method\s+on\s+(?:the\s+)?([A-Z][A-Za-z0-9]*)(?:\s+(?:type|class|struct))?\b").unwrap()
});

static WHAT_DOES_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:what does|do)\s+(?:the\s+|a\s+|an\s+)?([A-Za-z_][A-Za-z0-9_]*)\s+call\b")
        .unwrap()
});

static WHERE_IS_USED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwhere is\s+([A-Za-z_][A-Za-z0-9_]*)\s+(?:used|referenced|defined)\b")
        .unwrap()
});

static CALLERS_CALLEES_OF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:callers|callees)\s+of\s+([A-Za-z_][A-Za-z0-9_]*)\b").unwrap());

static CALLS_X_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcalls\s+([A-Za-z_][A-Za-z0-9_]*)\b").unwrap());

static CALLED_BY_X_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcalled by\s+([A-Za-z_][A-Za-z0-9_]*)\b").unwrap());

static FROM_X_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+([A-Za-z_][A-Za-z0-9_]*)\b").unwrap());

static FOR_OF_X_KIND_RE: Lazy<Regex> = Lazy::new(|| {
    let kinds = KIND_KEYWORDS.join("|");
    Regex::new(&format!(
        r"(?i)\b(?:for|of)\s+([A-Za-z_][A-Za-z0-9_]*)\s+(?:{})\b",
        kinds
    ))
    .unwrap()
});

static X_KIND_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    let kinds = KIND_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b([A-Za-z_][A-Za-z0-9_]*)\s+(?:{})\b", kinds)).unwrap()
});

static METHOD_FILE_EXT: &[&str] = &["js", "py", "ts", "go", "rb", "java", "rs", "c", "cpp"];

/// Byte offset of the first standalone "to" token, used to separate query
/// prefix (candidate territory) from path-endpoint territory in "from X to
/// Y" queries. Returns the full query length when no "to" token exists.
pub fn to_boundary(query: &str) -> usize {
    static TO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bto\b").unwrap());
    TO_RE
        .find(query)
        .map(|m| m.start())
        .unwrap_or_else(|| query.len())
}

fn is_valid_type_name(s: &str) -> bool {
    s.chars().next().map_or(false, |c| c.is_ascii_uppercase())
        && s.chars().all(|c| c.is_alphanumeric())
}

fn is_method_token(s: &str) -> bool {
    !METHOD_FILE_EXT.contains(&s.to_lowercase().as_str())
        && s.chars()
            .next()
            .map_or(false, |c| c.is_alphabetic() || c == '_')
}

/// "strict camel/Pascal case": has an uppercase letter at position > 0.
fn is_strict_camel_case(s: &str) -> bool {
    s.chars().skip(1).any(|c| c.is_uppercase())
}

fn valid_function_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .next()
            .map_or(false, |c| c.is_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Loose heuristic for "looks like a function/symbol name, not a stopword".
fn function_like_name(s: &str) -> bool {
    const STOPWORDS: &[&str] = &[
        "the", "a", "an", "is", "are", "what", "where", "does", "do", "call", "calls", "called",
        "by", "of", "for", "to", "from", "in", "on", "this", "that",
    ];
    !STOPWORDS.contains(&s.to_lowercase().as_str())
}

/// Extract ranked candidate function/type names from a free-text query.
/// Evaluates the fixed-priority cascade and returns a deduplicated,
/// best-first list. Pure and deterministic: same input always yields the
/// same output.
pub fn extract_candidates(query: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: String, out: &mut Vec<String>| {
        if !out.iter().any(|existing| existing == &s) {
            out.push(s);
        }
    };

    // Rule 0: "<Type>.<Method>"
    for caps in TYPE_METHOD_RE.captures_iter(query) {
        let ty = &caps[1];
        let method = &caps[2];
        if is_valid_type_name(ty) && is_method_token(method) {
            push(format!("{}.{}", ty, method), &mut out);
        }
    }

    // Rule 0a: "the <method> method on (the) <Type> (type|class|struct)?"
    if let Some(caps) = METHOD_ON_TYPE_RE.captures(query) {
        let method = &caps[1];
        let ty = &caps[2];
        push(format!("{}.{}", ty, method), &mut out);
    }

    // Rule 1: "what does <X> call" / "do <X> call"
    if let Some(caps) = WHAT_DOES_CALL_RE.captures(query) {
        push(caps[1].to_string(), &mut out);
    }

    // Rule 1b: "where is <X> used|referenced|defined"
    if let Some(caps) = WHERE_IS_USED_RE.captures(query) {
        push(caps[1].to_string(), &mut out);
    }

    let boundary = to_boundary(query);
    let prefix = &query[..boundary.min(query.len())];

    // Rule 2: "(callers|callees) of <X>" — guarded by the "to" boundary.
    if let Some(caps) = CALLERS_CALLEES_OF_RE.captures(prefix) {
        push(caps[1].to_string(), &mut out);
    }

    // Rule 3: "calls <X>"
    if let Some(caps) = CALLS_X_RE.captures(query) {
        push(caps[1].to_string(), &mut out);
    }

    // Rule 4: "called by <X>"
    if let Some(caps) = CALLED_BY_X_RE.captures(query) {
        push(caps[1].to_string(), &mut out);
    }

    // Rule 4b: "from <X>" (context-aware; permits lowercase single-word names)
    if let Some(caps) = FROM_X_RE.captures(query) {
        push(caps[1].to_string(), &mut out);
    }

    // Rule 5: "(for|of) <X> <kind>" — within the "to" boundary.
    if let Some(caps) = FOR_OF_X_KIND_RE.captures(prefix) {
        push(caps[1].to_string(), &mut out);
    }

    // Rule 6: "<X> <kind-keyword>" anywhere — within the "to" boundary, with
    // a relaxed skip-list for programming-construct nouns qualified by kind.
    if let Some(caps) = X_KIND_KEYWORD_RE.captures(prefix) {
        let candidate = &caps[1];
        let lower = candidate.to_lowercase();
        let is_generic_skip = GENERIC_SKIP_WORDS.contains(&lower.as_str())
            && !RELAXED_PROGRAMMING_NOUNS.contains(&lower.as_str());
        if !is_generic_skip {
            push(candidate.to_string(), &mut out);
        }
    }

    // Rule 7: fallback — valid-function-name ∧ function-like-name. Past the
    // boundary, only strict camel/Pascal case qualifies.
    for word in query.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '_');
        if word.is_empty() {
            continue;
        }
        if !valid_function_name(word) || !function_like_name(word) {
            continue;
        }
        let word_pos = query.find(word).unwrap_or(0);
        if word_pos >= boundary && !is_strict_camel_case(word) {
            continue;
        }
        push(word.to_string(), &mut out);
    }

    out
}
