use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::SuggestionResult;

// Markers match ASCII case-insensitively only; the captured text may be any Unicode.
static SUGGESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?i-u:suggestion:)\s*(.*?)(?:(?i-u:reasoning:)|$)").expect("valid regex")
});
static REASONING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(?i-u:reasoning:)\s*(.*)").expect("valid regex"));

/// Split a completion into a suggestion and its reasoning.
///
/// Text after the first `Suggestion:` marker (up to `Reasoning:`) becomes the
/// suggestion; text after the first `Reasoning:` marker becomes the reasoning.
/// A completion without a usable `Suggestion:` section is taken whole as the
/// suggestion.
pub fn parse_suggestion(raw: &str) -> SuggestionResult {
    let text = raw.trim();
    if text.is_empty() {
        return SuggestionResult::empty();
    }

    let suggestion = capture(&SUGGESTION_RE, text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            debug!("no suggestion section found, using whole completion");
            text
        });
    let reasoning = capture(&REASONING_RE, text).unwrap_or_default();

    SuggestionResult {
        suggestion: suggestion.to_string(),
        reasoning: reasoning.to_string(),
    }
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}
