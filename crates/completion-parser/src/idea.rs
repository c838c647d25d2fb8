//! Idea-list parsing.
//!
//! Expected completion shape, one idea per block, blocks separated by blank lines:
//!
//! ```text
//! Title: Meal Planner
//! Summary: Helps busy professionals plan healthy lunches.
//! Score: 8
//! ```
//!
//! Blocks that drift from this shape are recovered heuristically; when nothing
//! can be recovered the whole completion collapses into a single fallback idea.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{StartupIdea, DEFAULT_SCORE, MAX_SCORE, MIN_SCORE};

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s*").expect("valid regex"));

const TITLE_LABEL: &str = "title:";
const SUMMARY_LABEL: &str = "summary:";
const SCORE_LABEL: &str = "score:";

/// Minimum trimmed length (in chars) for a piece of raw text to count as a
/// sentence in the fallback summary.
const MIN_SENTENCE_CHARS: usize = 10;
const FALLBACK_SENTENCES: usize = 2;

/// Parse a multi-idea completion. Never returns an empty list.
pub fn parse_idea_list(raw: &str) -> Vec<StartupIdea> {
    let blocks = split_blocks(raw);

    let ideas: Vec<StartupIdea> = blocks
        .iter()
        .enumerate()
        .filter_map(|(index, lines)| {
            let idea = parse_block(lines);
            if idea.is_none() {
                debug!(block = index + 1, lines = lines.len(), "discarding block without title and summary");
            }
            idea
        })
        .collect();

    if ideas.is_empty() {
        debug!(blocks = blocks.len(), "no ideas recognised, using fallback idea");
        return vec![StartupIdea::fallback(fallback_summary(raw))];
    }

    debug!(blocks = blocks.len(), ideas = ideas.len(), "parsed idea list");
    ideas
}

/// Group trimmed lines into blocks. Any line that is empty after trimming ends
/// the current block.
fn split_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_block(lines: &[&str]) -> Option<StartupIdea> {
    let mut title = String::new();
    let mut summary = String::new();
    let mut score = DEFAULT_SCORE;

    for line in lines {
        if let Some(value) = strip_label(line, TITLE_LABEL) {
            title = value.to_string();
        } else if let Some(value) = strip_label(line, SUMMARY_LABEL) {
            summary = value.to_string();
        } else if let Some(value) = strip_label(line, SCORE_LABEL) {
            score = parse_score(value);
        }
    }

    if title.is_empty() {
        if let Some(first) = lines.first() {
            let unnumbered = ORDINAL_RE.replace(first, "");
            title = without_label(&unnumbered, TITLE_LABEL).to_string();
        }
    }

    // Heuristic: the first line is usually the title and the last the score,
    // so whatever sits between them is taken as the summary.
    if summary.is_empty() && lines.len() > 1 {
        let middle = lines[1..lines.len() - 1].join(" ");
        summary = without_label(&middle, SUMMARY_LABEL).to_string();
    }

    if title.is_empty() || summary.is_empty() {
        return None;
    }
    Some(StartupIdea::new(title, summary, score))
}

/// Returns the trimmed remainder of `line` if it starts with `label`,
/// compared ASCII case-insensitively.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    head.eq_ignore_ascii_case(label)
        .then(|| line[label.len()..].trim())
}

fn without_label<'a>(line: &'a str, label: &str) -> &'a str {
    strip_label(line, label).unwrap_or(line).trim()
}

fn parse_score(value: &str) -> u8 {
    match leading_integer(value) {
        Some(n) => n.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8,
        None => DEFAULT_SCORE,
    }
}

/// Reads an optionally signed run of ASCII digits from the start of `s`,
/// ignoring whatever follows ("8/10" reads as 8). Saturates instead of
/// overflowing.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end].bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

fn fallback_summary(raw: &str) -> String {
    let sentences: Vec<&str> = raw
        .split('.')
        .filter(|piece| piece.trim().chars().count() > MIN_SENTENCE_CHARS)
        .take(FALLBACK_SENTENCES)
        .collect();
    format!("{}.", sentences.join(".")).trim().to_string()
}
