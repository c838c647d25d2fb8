use std::sync::Arc;

use completion_parser::{parse_idea_list, parse_suggestion, SuggestionResult};
use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use venture_common::canvas::LeanCanvasBlock;
use venture_common::mcp_api::{
    CanvasBlockInfo, CanvasBlocksResponse, CanvasSuggestionResponse, GenerateIdeasParams,
    ParseTextParams, PitchDeckSlideParams, ProblemStatementParams, StartupIdeasResponse,
    SuggestCanvasBlockParams, TextResponse,
};
use venture_common::openai::{ModelListResponse, OpenAiClient};

use crate::flows::Assistant;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct VentureAssistantServer {
    assistant: Arc<Assistant<OpenAiClient>>,
    limiter: Option<RateLimiter>,
    tool_router: ToolRouter<VentureAssistantServer>,
}

impl VentureAssistantServer {
    pub fn new(assistant: Arc<Assistant<OpenAiClient>>, limiter: Option<RateLimiter>) -> Self {
        Self {
            assistant,
            limiter,
            tool_router: Self::tool_router(),
        }
    }

    async fn gate(&self) -> Result<(), String> {
        if let Some(limiter) = &self.limiter {
            limiter.check().await.map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

#[tool_router]
impl VentureAssistantServer {
    #[tool(description = "Generate startup ideas for a problem in a market category. Returns a list of ideas, each with a title, a short summary and a market potential score from 1 to 10.")]
    async fn generate_startup_ideas(
        &self,
        Parameters(params): Parameters<GenerateIdeasParams>,
    ) -> Result<Json<StartupIdeasResponse>, String> {
        self.gate().await?;
        let ideas = self
            .assistant
            .generate_startup_ideas(&params.problem, &params.category)
            .await
            .map_err(|e| format!("generate_startup_ideas failed: {e}"))?;
        Ok(Json(StartupIdeasResponse { ideas }))
    }

    #[tool(description = "Suggest content for one Lean Canvas block (e.g. 'problem', 'customerSegments', 'Unfair Advantage'). Pass earlier rejected suggestions in previous_attempts to get something different. Returns the suggestion and the reasoning behind it.")]
    async fn suggest_lean_canvas_block(
        &self,
        Parameters(params): Parameters<SuggestCanvasBlockParams>,
    ) -> Result<Json<CanvasSuggestionResponse>, String> {
        self.gate().await?;
        let response = self
            .assistant
            .suggest_canvas_block(&params)
            .await
            .map_err(|e| format!("suggest_lean_canvas_block failed: {e}"))?;
        Ok(Json(response))
    }

    #[tool(description = "Write concise, persuasive content for a pitch deck slide on the given topic, optionally improving existing slide content.")]
    async fn generate_pitch_deck_slide(
        &self,
        Parameters(params): Parameters<PitchDeckSlideParams>,
    ) -> Result<Json<TextResponse>, String> {
        self.gate().await?;
        let text = self
            .assistant
            .generate_pitch_deck_slide(&params.topic, params.existing_content.as_deref())
            .await
            .map_err(|e| format!("generate_pitch_deck_slide failed: {e}"))?;
        Ok(Json(TextResponse { text }))
    }

    #[tool(description = "List the top 3 recurring problems a target customer faces, as bullet points.")]
    async fn generate_problem_statement(
        &self,
        Parameters(params): Parameters<ProblemStatementParams>,
    ) -> Result<Json<TextResponse>, String> {
        self.gate().await?;
        let text = self
            .assistant
            .generate_problem_statement(&params.target_customer)
            .await
            .map_err(|e| format!("generate_problem_statement failed: {e}"))?;
        Ok(Json(TextResponse { text }))
    }

    #[tool(description = "Parse raw model output in 'Title: / Summary: / Score:' blocks into structured startup ideas without calling a model. Never fails; unrecognised text becomes a single fallback idea.")]
    async fn parse_idea_list(
        &self,
        Parameters(params): Parameters<ParseTextParams>,
    ) -> Result<Json<StartupIdeasResponse>, String> {
        let ideas = parse_idea_list(&params.text);
        Ok(Json(StartupIdeasResponse { ideas }))
    }

    #[tool(description = "Parse raw model output with 'Suggestion:' and 'Reasoning:' sections into a suggestion/reasoning pair without calling a model. Unlabelled text is returned whole as the suggestion.")]
    async fn parse_suggestion(
        &self,
        Parameters(params): Parameters<ParseTextParams>,
    ) -> Result<Json<SuggestionResult>, String> {
        Ok(Json(parse_suggestion(&params.text)))
    }

    #[tool(description = "List the Lean Canvas blocks with their keys, names and descriptions.")]
    async fn list_canvas_blocks(&self) -> Result<Json<CanvasBlocksResponse>, String> {
        let blocks = LeanCanvasBlock::ALL
            .into_iter()
            .map(CanvasBlockInfo::from)
            .collect();
        Ok(Json(CanvasBlocksResponse { blocks }))
    }

    #[tool(description = "List models available from the configured chat-completions provider (GET /models).")]
    async fn list_models(&self) -> Result<Json<ModelListResponse>, String> {
        self.gate().await?;
        info!("list_models tool invoked");
        let models = self
            .assistant
            .backend()
            .list_models()
            .await
            .map_err(|e| format!("list_models failed: {e}"))?;
        Ok(Json(models))
    }
}

#[tool_handler]
impl ServerHandler for VentureAssistantServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "venture-assistant".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Startup planning assistant. Use generate_startup_ideas to brainstorm ideas for a \
problem, suggest_lean_canvas_block to draft Lean Canvas content (list_canvas_blocks shows the \
blocks), and generate_pitch_deck_slide / generate_problem_statement for free-text drafting. \
parse_idea_list and parse_suggestion structure model output you already have."
                    .to_string(),
            ),
        }
    }
}
