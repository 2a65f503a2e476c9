// ABOUTME: Secondary-parameter extraction: top-N, sort dimension, exclude-tests,
// ABOUTME: reverse flag and kind filter (spec.md §4.1 item 6)

use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_TOP_N: usize = 10;
const TOP_N_MIN: usize = 1;
const TOP_N_MAX: usize = 100;

/// Extract a top-N count, 1 ≤ N ≤ 100. An out-of-range value falls back to
/// the default rather than being clamped.
pub fn extract_top_n(query: &str) -> usize {
    static TOP_N_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:top|first|last)\s+(\d+)\b|\b(\d+)\s+(?:most|results|items)\b")
            .unwrap()
    });

    TOP_N_RE
        .captures(query)
        .and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse::<usize>().ok())
        })
        .filter(|n| (TOP_N_MIN..=TOP_N_MAX).contains(n))
        .unwrap_or(DEFAULT_TOP_N)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDimension {
    In,
    Out,
    Score,
}

/// Extract the sort dimension named by fan-in/fan-out/score keywords.
/// Defaults to `Score`.
pub fn extract_sort_dimension(query: &str) -> SortDimension {
    let lower = query.to_lowercase();
    if lower.contains("fan-in") || lower.contains("fan in") || lower.contains("incoming") {
        SortDimension::In
    } else if lower.contains("fan-out") || lower.contains("fan out") || lower.contains("outgoing") {
        SortDimension::Out
    } else {
        SortDimension::Score
    }
}

/// Whether test files should be excluded. Defaults to `true`: only an
/// explicit mention of "test" turns it off.
pub fn extract_exclude_tests(query: &str) -> bool {
    !query.to_lowercase().contains("test")
}

/// Whether the result ordering should be reversed, from "lowest",
/// "peripheral" or "least" phrasing.
pub fn extract_reverse(query: &str) -> bool {
    let lower = query.to_lowercase();
    lower.contains("lowest") || lower.contains("peripheral") || lower.contains("least")
}

/// Extract a symbol-kind filter keyword, if the query names one explicitly.
pub fn extract_kind_filter(query: &str) -> Option<String> {
    static KIND_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(functions?|methods?|classes?|structs?|interfaces?|enums?|types?|variables?|constants?)\b")
            .unwrap()
    });
    KIND_RE.captures(query).map(|caps| caps[1].to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_n_defaults_to_ten() {
        assert_eq!(extract_top_n("what are the most complex functions?"), 10);
    }

    #[test]
    fn top_n_parses_in_range() {
        assert_eq!(extract_top_n("top 5 most complex functions"), 5);
    }

    #[test]
    fn top_n_falls_back_to_default_on_overflow() {
        assert_eq!(extract_top_n("top 500 functions"), DEFAULT_TOP_N);
        assert_eq!(extract_top_n("top 0 functions"), DEFAULT_TOP_N);
    }

    #[test]
    fn sort_dimension_defaults_to_score() {
        assert_eq!(extract_sort_dimension("most complex functions"), SortDimension::Score);
    }

    #[test]
    fn sort_dimension_fan_in_and_out() {
        assert_eq!(extract_sort_dimension("highest fan-in functions"), SortDimension::In);
        assert_eq!(extract_sort_dimension("highest fan-out functions"), SortDimension::Out);
    }

    #[test]
    fn exclude_tests_default_true_unless_test_mentioned() {
        assert!(extract_exclude_tests("most complex functions"));
        assert!(!extract_exclude_tests("most complex test functions"));
    }

    #[test]
    fn reverse_flag_detects_lowest_peripheral_least() {
        assert!(extract_reverse("least complex functions"));
        assert!(extract_reverse("most peripheral functions"));
        assert!(!extract_reverse("most complex functions"));
    }

    #[test]
    fn kind_filter_singular_and_plural() {
        assert_eq!(
            extract_kind_filter("top 5 classes by complexity"),
            Some("classes".to_string())
        );
    }
}
