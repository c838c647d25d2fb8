use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const FALLBACK_IDEA_TITLE: &str = "AI-Generated Startup Idea";
pub const FALLBACK_IDEA_SCORE: u8 = 7;
pub const DEFAULT_SCORE: u8 = 5;
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// A single startup idea extracted from a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StartupIdea {
    /// Short name of the idea.
    pub title: String,
    /// One or two sentences describing the idea.
    pub summary: String,
    /// Market potential, always within 1..=10.
    pub score: u8,
}

impl StartupIdea {
    pub(crate) fn new(title: String, summary: String, score: u8) -> Self {
        Self {
            title,
            summary,
            score: score.clamp(MIN_SCORE, MAX_SCORE),
        }
    }

    pub fn fallback(summary: String) -> Self {
        Self::new(FALLBACK_IDEA_TITLE.to_string(), summary, FALLBACK_IDEA_SCORE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuggestionResult {
    /// The suggested content.
    pub suggestion: String,
    /// Why the suggestion fits. Empty when the completion gave no reasoning.
    pub reasoning: String,
}

impl SuggestionResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
