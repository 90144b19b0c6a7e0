//! Cleanup for model output that ignores the "no markdown" instruction.
//!
//! Providers hand back the text verbatim; the pipeline runs it through
//! [`strip_markdown`] when `llm.strip_markdown` is enabled.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// The info string (`sql`, `sqlite`, `SQL`, ...) only counts as a tag when it
// is alone on the opening line.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[ \t]*[A-Za-z][\w+-]*[ \t]*\r?\n)?(.*?)```").expect("fence pattern is valid")
});

static OPENING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*[A-Za-z][\w+-]*[ \t]*\r?\n").expect("tag pattern is valid")
});

/// Extracts the statement from a fenced block and drops a leading `sql` tag line.
pub fn strip_markdown(text: &str) -> String {
    let mut body = text.trim();

    if let Some(inner) = FENCED_BLOCK.captures(body).and_then(|c| c.get(1)) {
        debug!("Stripped markdown code fence from model output");
        body = inner.as_str();
    } else {
        // Unterminated fence on either end
        if let Some(rest) = body.strip_prefix("```") {
            body = match OPENING_TAG.find(rest) {
                Some(tag) => &rest[tag.end()..],
                None => rest,
            };
        }
        body = body.trim_end_matches("```");
    }

    let body = body.trim();
    match body.split_once('\n') {
        Some((first, rest)) if first.trim().eq_ignore_ascii_case("sql") => rest.trim().to_string(),
        None if body.eq_ignore_ascii_case("sql") => String::new(),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_statement_is_untouched() {
        let sql = "SELECT Goals FROM top_scorers WHERE Year = 2023;";
        assert_eq!(strip_markdown(sql), sql);
    }

    #[test]
    fn test_tagged_fence() {
        let text = "```sql\nSELECT \"Player Names\", Goals FROM top_scorers\nORDER BY Goals DESC LIMIT 1;\n```";
        assert_eq!(
            strip_markdown(text),
            "SELECT \"Player Names\", Goals FROM top_scorers\nORDER BY Goals DESC LIMIT 1;"
        );
    }

    #[test]
    fn test_untagged_fence_with_commentary() {
        let text = "Here is your query:\n```\nSELECT Club FROM top_scorers\n```\nHope it helps.";
        assert_eq!(strip_markdown(text), "SELECT Club FROM top_scorers");
    }

    #[test]
    fn test_uppercase_tag() {
        assert_eq!(strip_markdown("```SQL\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_other_language_tags_do_not_leak() {
        assert_eq!(strip_markdown("```sqlite\nSELECT Club FROM top_scorers\n```"), "SELECT Club FROM top_scorers");
        assert_eq!(strip_markdown("```duckdb-sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_markdown("```sqlite\nSELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_inline_fence() {
        assert_eq!(strip_markdown("```SELECT 1```"), "SELECT 1");
    }

    #[test]
    fn test_unterminated_fence() {
        assert_eq!(strip_markdown("```sql\nSELECT 1"), "SELECT 1");
        assert_eq!(strip_markdown("SELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_leading_sql_word_line() {
        assert_eq!(strip_markdown("sql\nSELECT League FROM top_scorers"), "SELECT League FROM top_scorers");
        assert_eq!(strip_markdown("sql"), "");
    }

    #[test]
    fn test_does_not_touch_sql_inside_identifiers() {
        let sql = "SELECT sql_mode FROM top_scorers";
        assert_eq!(strip_markdown(sql), sql);
    }

    #[test]
    fn test_uncertainty_reply_passes_through() {
        assert_eq!(strip_markdown("  I don't know.  "), "I don't know.");
    }
}
