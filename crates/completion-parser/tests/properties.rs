use completion_parser::model::{FALLBACK_IDEA_SCORE, FALLBACK_IDEA_TITLE, MAX_SCORE, MIN_SCORE};
use completion_parser::{parse_idea_list, parse_suggestion};
use proptest::prelude::*;

fn has_marker(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("suggestion:") || lower.contains("reasoning:")
}

/// Completions that look roughly like what a model sends back: labels, numbers,
/// punctuation and line breaks mixed together.
fn completion_like() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("Title: ".to_string()),
        Just("Summary: ".to_string()),
        Just("Score: ".to_string()),
        Just("Suggestion:".to_string()),
        Just("Reasoning:".to_string()),
        Just("\n".to_string()),
        Just("\n\n".to_string()),
        Just(". ".to_string()),
        "-?[0-9]{1,4}",
        "[a-zA-Z ]{1,20}",
    ];
    prop::collection::vec(piece, 0..40).prop_map(|pieces| pieces.concat())
}

proptest! {
    #[test]
    fn idea_list_is_never_empty(raw in any::<String>()) {
        prop_assert!(!parse_idea_list(&raw).is_empty());
    }

    #[test]
    fn idea_scores_stay_in_range(raw in completion_like()) {
        for idea in parse_idea_list(&raw) {
            prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&idea.score));
        }
    }

    #[test]
    fn recognised_ideas_have_title_and_summary(raw in completion_like()) {
        for idea in parse_idea_list(&raw) {
            prop_assert!(!idea.title.is_empty());
            prop_assert!(!idea.summary.is_empty());
        }
    }

    #[test]
    fn canonical_blocks_parse_in_order(
        entries in prop::collection::vec(("[A-Z][a-z]{2,12}", "[a-z]{3,10}( [a-z]{3,10}){0,5}", 1u8..=10), 1..5)
    ) {
        let raw = entries
            .iter()
            .map(|(title, summary, score)| format!("Title: {title}\nSummary: {summary}\nScore: {score}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let ideas = parse_idea_list(&raw);
        prop_assert_eq!(ideas.len(), entries.len());
        for (idea, (title, summary, score)) in ideas.iter().zip(&entries) {
            prop_assert_eq!(&idea.title, title);
            prop_assert_eq!(&idea.summary, summary);
            prop_assert_eq!(idea.score, *score);
        }
    }

    #[test]
    fn single_line_prose_falls_back(text in "[a-z]{11,30}( [a-z]{2,10}){0,8}") {
        let ideas = parse_idea_list(&text);
        prop_assert_eq!(ideas.len(), 1);
        prop_assert_eq!(ideas[0].title.as_str(), FALLBACK_IDEA_TITLE);
        prop_assert_eq!(ideas[0].score, FALLBACK_IDEA_SCORE);
    }

    #[test]
    fn suggestion_parse_never_panics(raw in any::<String>()) {
        let result = parse_suggestion(&raw);
        if raw.trim().is_empty() {
            prop_assert!(result.suggestion.is_empty());
            prop_assert!(result.reasoning.is_empty());
        }
    }

    #[test]
    fn reparsing_suggestion_is_stable(raw in completion_like()) {
        let first = parse_suggestion(&raw);
        if has_marker(&first.suggestion) {
            return Ok(());
        }
        let second = parse_suggestion(&first.suggestion);
        prop_assert_eq!(second.suggestion, first.suggestion);
        prop_assert_eq!(second.reasoning, "");
    }

    #[test]
    fn unmarked_text_is_returned_trimmed(raw in "[a-zA-Z0-9 .,!\n]{0,200}") {
        let result = parse_suggestion(&raw);
        prop_assert_eq!(result.suggestion.as_str(), raw.trim());
        prop_assert_eq!(result.reasoning, "");
    }
}
