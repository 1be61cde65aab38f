//! Best-effort static scanner: pulls referenced top-level paths out of
//! raw template text without parsing or executing it. Intended for
//! cache keys and dependency analysis, not correctness; it only sees
//! interpolation heads and `for ... in` iterables that are plain paths.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\{\{\s*([\w.\[\]]+)\s*(?:\|[^}]*)?\}\}|\{%\s*for\s+\w+\s+in\s+([\w.\[\]]+)\s*%\}",
    )
    .expect("scanner regex is valid")
});

/// Distinct path strings referenced by the template, in first-appearance
/// order.
pub fn extract_paths(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for captures in PATH_RE.captures_iter(template) {
        let path = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str());
        if let Some(path) = path {
            if seen.insert(path.to_string()) {
                paths.push(path.to_string());
            }
        }
    }

    paths
}
