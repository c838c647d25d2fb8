use completion_parser::{StartupIdea, SuggestionResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::canvas::LeanCanvasBlock;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateIdeasParams {
    /// The problem the startup should solve.
    pub problem: String,
    /// Market category such as "SaaS", "Health", "Finance", "E-commerce" or "Education".
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StartupIdeasResponse {
    pub ideas: Vec<StartupIdea>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SuggestCanvasBlockParams {
    /// Lean Canvas block, by key ("customerSegments") or name ("Customer Segments").
    pub block: String,
    /// What the founder has written in this block so far.
    #[serde(default)]
    pub current_content: String,
    /// Earlier suggestions for this block the founder rejected, oldest first.
    #[serde(default)]
    pub previous_attempts: Vec<String>,
    pub startup_name: Option<String>,
    pub startup_description: Option<String>,
    /// Free-form context with "Startup Name:" / "Description:" lines, used when
    /// the explicit fields are absent.
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CanvasSuggestionResponse {
    /// Canonical block key, or the label as given when it is not a known block.
    pub block: String,
    #[serde(flatten)]
    pub result: SuggestionResult,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PitchDeckSlideParams {
    /// Slide topic, e.g. "Problem", "Market Size", "Business Model".
    pub topic: String,
    /// Existing slide content to improve upon.
    pub existing_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProblemStatementParams {
    /// Who experiences the problems, e.g. "freelance designers".
    pub target_customer: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ParseTextParams {
    /// Raw model output to parse.
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CanvasBlockInfo {
    pub key: String,
    pub name: String,
    pub description: String,
}

impl From<LeanCanvasBlock> for CanvasBlockInfo {
    fn from(block: LeanCanvasBlock) -> Self {
        Self {
            key: block.key().to_string(),
            name: block.name().to_string(),
            description: block.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CanvasBlocksResponse {
    pub blocks: Vec<CanvasBlockInfo>,
}
