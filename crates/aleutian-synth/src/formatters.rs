// ABOUTME: Output formatters for the multi-result summary (spec.md §4.6):
// ABOUTME: structured JSON decoders tried in order before a text fallback

use aleutian_core::ToolResult;
use serde_json::Value as JsonValue;

const TRUNCATE_CHARS: usize = 500;

/// Tries a sequence of structured JSON decoders against `result.output`
/// before falling back to a truncated rendering of `output_text`. Order
/// matters: the more specific shapes (packages, config usage) are tried
/// before the generic array/object decoders.
pub fn format_result(result: &ToolResult) -> String {
    if let Some(rendered) = decode_packages_list(&result.output) {
        return rendered;
    }
    if let Some(rendered) = decode_config_usage(&result.output) {
        return rendered;
    }
    if let Some(rendered) = decode_generic_array(&result.output) {
        return rendered;
    }
    if let Some(rendered) = decode_generic_object(&result.output) {
        return rendered;
    }
    truncate(&result.output_text)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= TRUNCATE_CHARS {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(TRUNCATE_CHARS).collect();
        s.push('\u{2026}');
        s
    }
}

/// `{"packages": [{"name": .., "version": ..}, ...]}` — a list of package
/// dependency records.
fn decode_packages_list(output: &JsonValue) -> Option<String> {
    let packages = output.get("packages")?.as_array()?;
    if packages.is_empty() {
        return None;
    }
    let mut lines = vec!["Packages:".to_string()];
    for entry in packages {
        let name = entry.get("name").and_then(|v| v.as_str()).unwrap_or("?");
        let version = entry.get("version").and_then(|v| v.as_str());
        match version {
            Some(v) => lines.push(format!("- {name} ({v})")),
            None => lines.push(format!("- {name}")),
        }
    }
    Some(lines.join("\n"))
}

/// `{"symbol": .., "usages": [{"file": .., "line": .., "context": ..}, ...]}`
/// — config/constant usage sites.
fn decode_config_usage(output: &JsonValue) -> Option<String> {
    let symbol = output.get("symbol").and_then(|v| v.as_str())?;
    let usages = output.get("usages")?.as_array()?;
    let mut lines = vec![format!("Usages of `{symbol}`:")];
    for usage in usages {
        let file = usage.get("file").and_then(|v| v.as_str()).unwrap_or("?");
        let line = usage.get("line").and_then(|v| v.as_u64()).unwrap_or(0);
        lines.push(format!("- {file}:{line}"));
    }
    Some(lines.join("\n"))
}

fn decode_generic_array(output: &JsonValue) -> Option<String> {
    let items = output.as_array()?;
    if items.is_empty() {
        return None;
    }
    let rendered: Vec<String> = items.iter().map(render_scalar_or_compact).collect();
    Some(format!("- {}", rendered.join("\n- ")))
}

fn decode_generic_object(output: &JsonValue) -> Option<String> {
    let map = output.as_object()?;
    if map.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(map.len());
    for (key, value) in map {
        lines.push(format!("{key}: {}", render_scalar_or_compact(value)));
    }
    Some(lines.join("\n"))
}

fn render_scalar_or_compact(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "null".to_string(),
        _ => value.to_string(),
    }
}
