//! HTML rendering of finished operations
//!
//! Every free-form field is escaped before it reaches the page. Query text
//! additionally gets zero-width break hints so long statements wrap.

use crate::common::{format_seconds, QueryLogConfig};
use crate::querylog::stats::LogStats;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

const TIME_FORMAT: &str = "%b %d %H:%M:%S%.6f";
const TRUNCATED_MARKER: &str = " [TRUNCATED]";
const ZERO_WIDTH_SPACE: char = '\u{200b}';

const HEADER: &str = r#"<!DOCTYPE html>
<html>
<head>
<style>
  table { border-collapse: collapse; font-family: monospace; }
  td, th { border: 1px solid #ccc; padding: 2px 6px; vertical-align: top; }
  tr.low { background-color: #ffffff; }
  tr.medium { background-color: #fff3cd; }
  tr.high { background-color: #f8d7da; }
</style>
</head>
<body>
<table>
<thead>
  <tr>
    <th>Method</th>
    <th>Effective Caller</th>
    <th>Immediate Caller</th>
    <th>Session</th>
    <th>Start</th>
    <th>End</th>
    <th>Duration</th>
    <th>Plan Time</th>
    <th>Execute Time</th>
    <th>Commit Time</th>
    <th>Stmt Type</th>
    <th>Text</th>
    <th>Shard Queries</th>
    <th>Rows Affected</th>
    <th>Error</th>
  </tr>
</thead>
<tbody>
"#;

const FOOTER: &str = "</tbody>\n</table>\n</body>\n</html>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyLevel {
    Low,
    Medium,
    High,
}

impl LatencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LatencyLevel::Low => "low",
            LatencyLevel::Medium => "medium",
            LatencyLevel::High => "high",
        }
    }
}

impl std::fmt::Display for LatencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket an elapsed time: below `medium` is low, below `high` is medium.
pub fn classify(elapsed: Duration, medium: Duration, high: Duration) -> LatencyLevel {
    if elapsed >= high {
        LatencyLevel::High
    } else if elapsed >= medium {
        LatencyLevel::Medium
    } else {
        LatencyLevel::Low
    }
}

/// Neutralise markup characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Insert break hints after `,` and `)` so long statements can wrap.
///
/// Works on escaped text: entities end in `;`, which is left alone.
pub fn wrappable(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        out.push(c);
        if c == ',' || c == ')' {
            out.push(ZERO_WIDTH_SPACE);
        }
    }
    out
}

/// Cut `s` to at most `max_chars` characters, marking the cut.
pub fn truncate_for_display(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &s[..idx], TRUNCATED_MARKER),
        None => s.to_string(),
    }
}

fn render_row(out: &mut String, stats: &LogStats, config: &QueryLogConfig) {
    let total = stats.total_time();
    let level = classify(total, config.medium_threshold(), config.high_threshold());
    let text = wrappable(&escape_html(&truncate_for_display(
        &stats.text,
        config.max_sql_display_len,
    )));

    let cells = [
        escape_html(&stats.method),
        escape_html(&stats.effective_caller),
        escape_html(&stats.immediate_caller),
        escape_html(&stats.session_id),
        stats.start_time.format(TIME_FORMAT).to_string(),
        stats.end_time.format(TIME_FORMAT).to_string(),
        format_seconds(total),
        format_seconds(stats.plan_time),
        format_seconds(stats.execute_time),
        format_seconds(stats.commit_time),
        escape_html(&stats.stmt_type),
        text,
        stats.shard_queries.to_string(),
        stats.rows_affected.to_string(),
        escape_html(stats.error.as_deref().unwrap_or("")),
    ];

    let _ = writeln!(out, "  <tr class=\"{}\">", level);
    for cell in cells {
        let _ = writeln!(out, "    <td>{}</td>", cell);
    }
    out.push_str("  </tr>\n");
}

/// Full page for `records`. With no records the table is simply empty.
pub fn render_querylogz(records: &[Arc<LogStats>], config: &QueryLogConfig) -> String {
    let mut out = String::from(HEADER);
    for stats in records {
        render_row(&mut out, stats, config);
    }
    out.push_str(FOOTER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_elapsed(ms: i64) -> Arc<LogStats> {
        let mut stats = LogStats::new(
            "Execute",
            "select name, 'inject <script>alert();</script>' from test_table limit 1000",
        )
        .with_stmt_type("select")
        .with_callers("effective-caller", "immediate-caller");
        stats.end_time = stats.start_time + chrono::Duration::milliseconds(ms);
        stats.rows_affected = 1000;
        stats.shard_queries = 1;
        Arc::new(stats)
    }

    #[test]
    fn test_classify_buckets() {
        let medium = Duration::from_millis(10);
        let high = Duration::from_millis(100);
        assert_eq!(classify(Duration::from_millis(1), medium, high), LatencyLevel::Low);
        assert_eq!(classify(Duration::from_millis(20), medium, high), LatencyLevel::Medium);
        assert_eq!(classify(Duration::from_millis(500), medium, high), LatencyLevel::High);
        assert_eq!(classify(medium, medium, high), LatencyLevel::Medium);
    }

    #[test]
    fn test_escape_and_wrap() {
        let escaped = escape_html("'inject <script>alert();</script>' & \"x\"");
        assert_eq!(
            escaped,
            "&#39;inject &lt;script&gt;alert();&lt;/script&gt;&#39; &amp; &#34;x&#34;"
        );
        assert_eq!(
            wrappable(&escape_html("select a, b from t where f(x);")),
            "select a,\u{200b} b from t where f(x)\u{200b};"
        );
    }

    #[test]
    fn test_truncate_for_display() {
        assert_eq!(truncate_for_display("select 1", 100), "select 1");
        assert_eq!(truncate_for_display("select 1", 6), "select [TRUNCATED]");
        assert_eq!(truncate_for_display("héllo", 2), "hé [TRUNCATED]");
    }

    #[test]
    fn test_render_rows_by_latency() {
        let config = QueryLogConfig::default();
        let records = vec![
            record_with_elapsed(1),
            record_with_elapsed(20),
            record_with_elapsed(500),
        ];
        let page = render_querylogz(&records, &config);

        let low = page.find("<tr class=\"low\">").unwrap();
        let medium = page.find("<tr class=\"medium\">").unwrap();
        let high = page.find("<tr class=\"high\">").unwrap();
        assert!(low < medium && medium < high);

        assert!(page.contains("<td>0.001</td>"));
        assert!(page.contains("<td>0.02</td>"));
        assert!(page.contains("<td>0.5</td>"));
        assert!(page.contains(
            "<td>select name,\u{200b} &#39;inject &lt;script&gt;alert()\u{200b};&lt;/script&gt;&#39; from test_table limit 1000</td>"
        ));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_render_empty() {
        let page = render_querylogz(&[], &QueryLogConfig::default());
        assert!(page.contains("<tbody>"));
        assert!(page.contains("</table>"));
        assert!(!page.contains("<tr class="));
    }
}
