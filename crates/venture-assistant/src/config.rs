use crate::error::AppError;

const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";

/// Application configuration loaded from environment variables.
///
/// The LLM endpoint itself is configured separately by
/// `venture_common::openai::OpenAiClientConfig::from_env`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Model ID passed to the chat-completions endpoint.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// How many ideas to ask for per generation request (1-5).
    pub idea_count: u32,
    /// Aggregate SSE streams instead of waiting for a single JSON response.
    pub stream: bool,
    /// Serve MCP over TCP on this address instead of stdio.
    pub tcp_listen_addr: Option<String>,
}

impl Config {
    /// Optional (all have defaults):
    /// - `VENTURE_AI_MODEL` (default: "deepseek/deepseek-chat")
    /// - `VENTURE_AI_TEMPERATURE` (default: 0.7, range 0-2)
    /// - `VENTURE_AI_MAX_TOKENS` (default: 1000)
    /// - `VENTURE_AI_IDEA_COUNT` (default: 3, range 1-5)
    /// - `VENTURE_AI_STREAM` ("1"/"true" to enable)
    /// - `MCP_TCP_LISTEN_ADDR`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let model = lookup("VENTURE_AI_MODEL")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature: f32 = parse_var(&lookup, "VENTURE_AI_TEMPERATURE", 0.7)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Config(format!(
                "VENTURE_AI_TEMPERATURE must be between 0 and 2, got {temperature}"
            )));
        }

        let max_tokens: u32 = parse_var(&lookup, "VENTURE_AI_MAX_TOKENS", 1000)?;
        if max_tokens == 0 {
            return Err(AppError::Config(
                "VENTURE_AI_MAX_TOKENS must be greater than 0".to_string(),
            ));
        }

        let idea_count: u32 = parse_var(&lookup, "VENTURE_AI_IDEA_COUNT", 3)?;
        if !(1..=5).contains(&idea_count) {
            return Err(AppError::Config(format!(
                "VENTURE_AI_IDEA_COUNT must be between 1 and 5, got {idea_count}"
            )));
        }

        let stream = lookup("VENTURE_AI_STREAM")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            model,
            temperature,
            max_tokens,
            idea_count,
            stream,
            tcp_listen_addr: lookup("MCP_TCP_LISTEN_ADDR").filter(|a| !a.trim().is_empty()),
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("invalid {key}={raw:?}: {e}"))),
    }
}
