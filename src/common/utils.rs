//! Utility functions for topokit

use std::time::Duration;

/// Separator between path segments
pub const PATH_SEPARATOR: char = '/';

/// Join path segments, skipping empty ones and collapsing separators at the seams.
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches(PATH_SEPARATOR))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Prefix that every descendant of `dir_path` starts with.
///
/// The root (`""` or `"/"`) matches every path.
pub fn child_prefix(dir_path: &str) -> String {
    let trimmed = dir_path.trim_end_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}{}", trimmed, PATH_SEPARATOR)
    }
}

/// Seconds as a float with at most microsecond precision, trailing zeros dropped.
pub fn format_seconds(d: Duration) -> String {
    let micros = d.as_micros() as f64;
    format!("{}", micros / 1_000_000.0)
}
