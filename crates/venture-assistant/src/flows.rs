use std::sync::Arc;

use completion_parser::{parse_idea_list, parse_startup_context, parse_suggestion, StartupIdea};
use tracing::{info, warn};
use venture_common::canvas::LeanCanvasBlock;
use venture_common::mcp_api::{CanvasSuggestionResponse, SuggestCanvasBlockParams};
use venture_common::openai::{ChatCompletionRequest, CompletionBackend, Message};
use venture_common::prompts::{
    canvas_block_prompt, pitch_deck_slide_prompt, problem_statement_prompt, startup_ideas_prompt,
    CanvasPromptInput,
};

use crate::config::Config;
use crate::error::AppError;

/// Request knobs shared by every flow.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub idea_count: u32,
    pub stream: bool,
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            idea_count: config.idea_count,
            stream: config.stream,
        }
    }
}

/// Runs each AI flow: build the prompt, fetch a completion, parse it.
pub struct Assistant<B> {
    backend: Arc<B>,
    settings: GenerationSettings,
}

impl<B: CompletionBackend> Assistant<B> {
    pub fn new(backend: Arc<B>, settings: GenerationSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn generate_startup_ideas(
        &self,
        problem: &str,
        category: &str,
    ) -> Result<Vec<StartupIdea>, AppError> {
        let problem = required("problem", problem)?;
        let category = required("category", category)?;

        let prompt = startup_ideas_prompt(problem, category, self.settings.idea_count);
        let text = self.complete("generate_startup_ideas", prompt).await?;

        let ideas = parse_idea_list(&text);
        info!(category, ideas = ideas.len(), "startup ideas parsed");
        Ok(ideas)
    }

    pub async fn suggest_canvas_block(
        &self,
        params: &SuggestCanvasBlockParams,
    ) -> Result<CanvasSuggestionResponse, AppError> {
        let label = required("block", &params.block)?;
        let block = LeanCanvasBlock::resolve(label);
        if block.is_none() {
            warn!(block = label, "unknown canvas block, using label as given");
        }

        let context = params
            .context
            .as_deref()
            .map(parse_startup_context)
            .unwrap_or_default();
        let startup_name = non_blank(params.startup_name.as_deref()).unwrap_or(context.name.as_str());
        let startup_description =
            non_blank(params.startup_description.as_deref()).unwrap_or(context.description.as_str());

        let prompt = canvas_block_prompt(&CanvasPromptInput {
            block_name: block.map_or(label, |b| b.name()),
            coaching_hint: block.map(LeanCanvasBlock::coaching_hint),
            current_content: &params.current_content,
            previous_attempts: &params.previous_attempts,
            startup_name,
            startup_description,
        });
        let text = self.complete("suggest_canvas_block", prompt).await?;

        let result = parse_suggestion(&text);
        if result.reasoning.is_empty() {
            info!(block = label, "suggestion arrived without reasoning");
        }
        Ok(CanvasSuggestionResponse {
            block: block.map_or_else(|| label.to_string(), |b| b.key().to_string()),
            result,
        })
    }

    pub async fn generate_pitch_deck_slide(
        &self,
        topic: &str,
        existing_content: Option<&str>,
    ) -> Result<String, AppError> {
        let topic = required("topic", topic)?;
        let prompt = pitch_deck_slide_prompt(topic, existing_content);
        let text = self.complete("generate_pitch_deck_slide", prompt).await?;
        Ok(text.trim().to_string())
    }

    pub async fn generate_problem_statement(&self, target_customer: &str) -> Result<String, AppError> {
        let target_customer = required("target_customer", target_customer)?;
        let prompt = problem_statement_prompt(target_customer);
        let text = self.complete("generate_problem_statement", prompt).await?;
        Ok(text.trim().to_string())
    }

    async fn complete(&self, flow: &'static str, prompt: String) -> Result<String, AppError> {
        let request = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            stream: self.settings.stream.then_some(true),
        };

        let completion = self
            .backend
            .complete(request)
            .await
            .inspect_err(|e| warn!(flow, error = %e, "completion failed"))?;

        info!(
            flow,
            model = %self.settings.model,
            chars = completion.text.len(),
            total_tokens = completion.usage.as_ref().and_then(|u| u.total_tokens),
            "completion received"
        );
        Ok(completion.text)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use venture_common::openai::{Completion, OpenAiClientError};

    use super::*;

    /// Replays a canned completion and records every request it receives.
    struct StubBackend {
        reply: Option<String>,
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl StubBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> String {
            let requests = self.requests.lock().unwrap();
            requests.last().unwrap().messages[0].content.clone()
        }
    }

    impl CompletionBackend for StubBackend {
        async fn complete(
            &self,
            request: ChatCompletionRequest,
        ) -> Result<Completion, OpenAiClientError> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Some(text) => Ok(Completion {
                    text: text.clone(),
                    usage: None,
                }),
                None => Err(OpenAiClientError::EmptyCompletion),
            }
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            model: "test/model".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            idea_count: 3,
            stream: false,
        }
    }

    fn assistant(backend: StubBackend) -> Assistant<StubBackend> {
        Assistant::new(Arc::new(backend), settings())
    }

    #[tokio::test]
    async fn ideas_flow_parses_completion() {
        let assistant = assistant(StubBackend::replying(
            "Title: Meal Planner\nSummary: Plans lunches.\nScore: 8\n\nTitle: Gym Buddy\nSummary: Finds partners.\nScore: 6",
        ));

        let ideas = assistant
            .generate_startup_ideas(" busy people skip lunch ", "Health")
            .await
            .unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[1].title, "Gym Buddy");

        let requests = assistant.backend().requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "test/model");
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.stream, None);
        assert!(request.messages[0]
            .content
            .contains("\"busy people skip lunch\" in the Health category"));
    }

    #[tokio::test]
    async fn blank_problem_is_rejected_before_calling_upstream() {
        let assistant = assistant(StubBackend::replying("unused"));
        let err = assistant.generate_startup_ideas("   ", "SaaS").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(assistant.backend().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_as_llm_error() {
        let assistant = assistant(StubBackend::failing());
        let err = assistant.generate_startup_ideas("x", "SaaS").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(OpenAiClientError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn streaming_setting_is_forwarded() {
        let mut settings = settings();
        settings.stream = true;
        let assistant = Assistant::new(Arc::new(StubBackend::replying("slide text")), settings);
        assistant.generate_pitch_deck_slide("Traction", None).await.unwrap();
        assert_eq!(assistant.backend().requests.lock().unwrap()[0].stream, Some(true));
    }

    #[tokio::test]
    async fn canvas_flow_uses_context_and_parses_sections() {
        let assistant = assistant(StubBackend::replying(
            "Suggestion:\nFreelancers juggling 5+ clients.\n\nReasoning:\nThey feel the invoicing pain most.",
        ));
        let params = SuggestCanvasBlockParams {
            block: "customer_segments".to_string(),
            current_content: "Freelancers".to_string(),
            previous_attempts: vec!["Everyone".to_string()],
            startup_name: None,
            startup_description: None,
            context: Some("Startup Name: InvoiceBot\nDescription: Automated invoicing\nFounder: Sam".to_string()),
        };

        let response = assistant.suggest_canvas_block(&params).await.unwrap();
        assert_eq!(response.block, "customerSegments");
        assert_eq!(response.result.suggestion, "Freelancers juggling 5+ clients.");
        assert_eq!(response.result.reasoning, "They feel the invoicing pain most.");

        let prompt = assistant.backend().last_prompt();
        assert!(prompt.contains("called \"InvoiceBot\""));
        assert!(prompt.contains("\"Customer Segments\" block"));
        assert!(prompt.contains("- Everyone\n"));
    }

    #[tokio::test]
    async fn explicit_startup_fields_win_over_context() {
        let assistant = assistant(StubBackend::replying("Just sell it."));
        let params = SuggestCanvasBlockParams {
            block: "Pricing Experiments".to_string(),
            current_content: String::new(),
            previous_attempts: Vec::new(),
            startup_name: Some("Explicit Co".to_string()),
            startup_description: Some("Does things".to_string()),
            context: Some("Startup Name: Context Co\nDescription: Other".to_string()),
        };

        let response = assistant.suggest_canvas_block(&params).await.unwrap();
        assert_eq!(response.block, "Pricing Experiments");
        assert_eq!(response.result.suggestion, "Just sell it.");
        assert_eq!(response.result.reasoning, "");

        let prompt = assistant.backend().last_prompt();
        assert!(prompt.contains("called \"Explicit Co\""));
        assert!(!prompt.contains("Context Co"));
    }

    #[tokio::test]
    async fn free_text_flows_trim_output() {
        let assistant = assistant(StubBackend::replying("\n- Chasing invoices\n- Scope creep\n"));
        let text = assistant
            .generate_problem_statement("freelance designers")
            .await
            .unwrap();
        assert_eq!(text, "- Chasing invoices\n- Scope creep");
        assert!(assistant.backend().last_prompt().contains("faced by freelance designers"));
    }
}
