// ABOUTME: Post-execute error normalization: not-found errors become
// ABOUTME: successful informational results, validation errors arm the CB flag

const NOT_FOUND_PATTERNS: &[&str] = &[
    "not found",
    "no results",
    "no matches",
    "no callees",
    "no callers",
    "no symbols",
    "no files",
    "does not exist",
    "could not find",
    "unable to find",
    "no such",
    "0 results",
    "zero results",
];

const VALIDATION_PATTERNS: &[&str] = &[
    "parameter validation",
    "required parameter missing",
    "validation failed",
];

/// The standardized informational message a not-found error is rewritten
/// into (spec.md §4.4 step 12, §8 scenario 4).
pub const NOT_FOUND_MESSAGE: &str =
    "## Search Result: Not Found\n\nThe symbol was not located in the code graph. The graph is exhaustive over the indexed codebase, so further searching for this exact name is unlikely to succeed.";

/// Case-insensitive substring match against the not-found pattern list.
pub fn is_not_found_error(error: &str) -> bool {
    let lower = error.to_lowercase();
    NOT_FOUND_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Case-insensitive substring match against the validation pattern list.
pub fn is_validation_error(error: &str) -> bool {
    let lower = error.to_lowercase();
    VALIDATION_PATTERNS.iter().any(|p| lower.contains(p))
}
