use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_APP_TITLE: &str = "Venture Assistant";

#[derive(Clone)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer`; OpenRouter uses it to attribute traffic.
    pub site_url: Option<String>,
    /// Sent as `X-Title`.
    pub app_title: String,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl std::fmt::Debug for OpenAiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("site_url", &self.site_url)
            .field("app_title", &self.app_title)
            .field("default_timeout", &self.default_timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl OpenAiClientConfig {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let api_key = std::env::var("OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        let site_url = std::env::var("VENTURE_SITE_URL").ok().filter(|s| !s.is_empty());
        let app_title =
            std::env::var("VENTURE_APP_TITLE").unwrap_or_else(|_| DEFAULT_APP_TITLE.to_string());

        let default_timeout = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));

        let max_retries = std::env::var("OPENAI_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(3);

        let initial_backoff = std::env::var("OPENAI_RETRY_INITIAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(200));

        let max_backoff = std::env::var("OPENAI_RETRY_MAX_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(5_000));

        let max_error_body_bytes = std::env::var("OPENAI_MAX_ERROR_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8 * 1024);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            site_url,
            app_title,
            default_timeout,
            max_retries,
            initial_backoff,
            max_backoff,
            max_error_body_bytes,
        }
    }

    fn default_headers(&self) -> Result<HeaderMap, OpenAiClientError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(site_url) = &self.site_url {
            headers.insert(
                HeaderName::from_static("http-referer"),
                HeaderValue::from_str(site_url)?,
            );
        }
        headers.insert(
            HeaderName::from_static("x-title"),
            HeaderValue::from_str(&self.app_title)?,
        );
        Ok(headers)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAiClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("streaming response ended without a completion")]
    StreamEnded,

    #[error("upstream returned an empty completion")]
    EmptyCompletion,
}

/// Text of a finished chat completion plus whatever usage the upstream reported.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<ChatCompletionUsage>,
}

/// Anything that can turn a chat request into completion text.
///
/// Implementations must never return an `Ok` completion whose text is blank.
pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> impl Future<Output = Result<Completion, OpenAiClientError>> + Send;
}

#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiClientConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, OpenAiClientError> {
        let http = reqwest::Client::builder()
            .user_agent("venture-assistant")
            .default_headers(config.default_headers()?)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OpenAiClientConfig {
        &self.config
    }

    pub async fn list_models(&self) -> Result<ModelListResponse, OpenAiClientError> {
        let url = format!("{}/models", self.config.base_url);
        self.request_with_retry(|| async {
            let resp = self.http.get(&url).timeout(self.config.default_timeout).send().await?;
            Self::parse_json_response(resp, self.config.max_error_body_bytes).await
        })
        .await
    }

    pub async fn chat_completions(
        &self,
        request: ChatCompletionRequest,
        timeout_override: Option<Duration>,
    ) -> Result<ChatCompletionResponse, OpenAiClientError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let timeout = timeout_override.unwrap_or(self.config.default_timeout);
        self.request_with_retry(|| {
            let req = request.clone();
            let url = url.clone();
            async move {
                let resp = self
                    .http
                    .post(&url)
                    .timeout(timeout)
                    .json(&req)
                    .send()
                    .await?;
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await
            }
        })
        .await
    }

    pub async fn chat_completions_streaming_aggregate(
        &self,
        request: ChatCompletionRequest,
        timeout_override: Option<Duration>,
    ) -> Result<String, OpenAiClientError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let timeout = timeout_override.unwrap_or(self.config.default_timeout);
        self.request_with_retry(|| {
            let mut req = request.clone();
            req.stream = Some(true);
            let url = url.clone();
            async move {
                let resp = self
                    .http
                    .post(&url)
                    .timeout(timeout)
                    .json(&req)
                    .send()
                    .await?;

                if !resp.status().is_success() {
                    return Err(Self::to_upstream_error(resp, self.config.max_error_body_bytes).await);
                }

                let mut stream = resp.bytes_stream();
                let mut events = SseAggregator::default();
                while let Some(next) = stream.next().await {
                    let chunk = next?;
                    if let Some(text) = events.push(&String::from_utf8_lossy(&chunk)) {
                        return Ok(text);
                    }
                }
                Err(OpenAiClientError::StreamEnded)
            }
        })
        .await
    }

    async fn parse_json_response<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, OpenAiClientError> {
        if resp.status().is_success() {
            let json = resp.json::<T>().await?;
            return Ok(json);
        }
        Err(Self::to_upstream_error(resp, max_error_body_bytes).await)
    }

    async fn to_upstream_error(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> OpenAiClientError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        upstream_error(status, body)
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, OpenAiClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OpenAiClientError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = f().await;
            match result {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "llm request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl CompletionBackend for OpenAiClient {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<Completion, OpenAiClientError> {
        let model = request.model.clone();
        let completion = if request.stream == Some(true) {
            let text = self.chat_completions_streaming_aggregate(request, None).await?;
            Completion { text, usage: None }
        } else {
            let response = self.chat_completions(request, None).await?;
            let text = first_choice_text(&response)
                .ok_or(OpenAiClientError::EmptyCompletion)?
                .to_string();
            Completion {
                text,
                usage: response.usage,
            }
        };

        if completion.text.trim().is_empty() {
            return Err(OpenAiClientError::EmptyCompletion);
        }
        debug!(
            model = %model,
            chars = completion.text.len(),
            total_tokens = completion.usage.as_ref().and_then(|u| u.total_tokens),
            "completion received"
        );
        Ok(completion)
    }
}

fn first_choice_text(response: &ChatCompletionResponse) -> Option<&str> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
}

fn upstream_error(status: StatusCode, body: String) -> OpenAiClientError {
    if let Ok(parsed) = serde_json::from_str::<OpenAiErrorEnvelope>(&body) {
        let message = parsed
            .error
            .message
            .unwrap_or_else(|| "unknown upstream error".to_string());
        return OpenAiClientError::Upstream { status, message };
    }
    OpenAiClientError::UpstreamBody { status, body }
}

/// Accumulates server-sent-event chunks of a streamed chat completion.
#[derive(Debug, Default)]
struct SseAggregator {
    buffer: String,
    out: String,
}

impl SseAggregator {
    /// Feeds one network chunk. Returns the full text once `[DONE]` arrives.
    fn push(&mut self, chunk: &str) -> Option<String> {
        self.buffer.push_str(chunk);
        while let Some(idx) = self.buffer.find("\n\n") {
            let event: String = self.buffer.drain(..idx + 2).collect();
            for line in event.lines() {
                let Some(data) = line.trim().strip_prefix("data:").map(str::trim) else {
                    continue;
                };
                if data == "[DONE]" {
                    return Some(std::mem::take(&mut self.out));
                }
                if data.is_empty() {
                    continue;
                }
                if let Ok(delta) = serde_json::from_str::<ChatCompletionStreamChunk>(data) {
                    if let Some(piece) = delta
                        .choices
                        .first()
                        .and_then(|c| c.delta.content.as_deref())
                    {
                        self.out.push_str(piece);
                    }
                }
            }
        }
        None
    }
}

fn should_retry(err: &OpenAiClientError) -> bool {
    match err {
        OpenAiClientError::Request(e) => {
            e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
        }
        OpenAiClientError::Upstream { status, .. }
        | OpenAiClientError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        OpenAiClientError::InvalidJson(_)
        | OpenAiClientError::InvalidHeader(_)
        | OpenAiClientError::StreamEnded
        | OpenAiClientError::EmptyCompletion => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    let jitter_ms = pseudo_jitter_ms(jitter_cap);
    Duration::from_millis(capped_ms.saturating_add(jitter_ms))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0));
    let nanos = now.subsec_nanos() as u64;
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorObject,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorObject {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelListResponse {
    pub object: Option<String>,
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    pub id: String,
    pub object: Option<String>,
    pub created: Option<i64>,
    pub owned_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    pub object: Option<String>,
    pub choices: Vec<ChatCompletionChoice>,
    pub usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChatCompletionChoice {
    pub index: Option<u32>,
    pub message: ChatCompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChatCompletionMessage {
    pub role: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionStreamChunk {
    choices: Vec<ChatCompletionStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionStreamChoice {
    delta: ChatCompletionStreamDelta,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionStreamDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OpenAiClientConfig {
        OpenAiClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: Some("sk-test".to_string()),
            site_url: Some("http://localhost:3000".to_string()),
            app_title: "Startup Ideas Generator".to_string(),
            default_timeout: Duration::from_secs(1),
            max_retries: 0,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            max_error_body_bytes: 64,
        }
    }

    #[test]
    fn default_headers_carry_auth_and_attribution() {
        let headers = test_config().default_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers["http-referer"], "http://localhost:3000");
        assert_eq!(headers["x-title"], "Startup Ideas Generator");
    }

    #[test]
    fn headers_without_key_skip_authorization() {
        let mut config = test_config();
        config.api_key = None;
        config.site_url = None;
        let headers = config.default_headers().unwrap();
        assert!(!headers.contains_key(AUTHORIZATION));
        assert!(!headers.contains_key("http-referer"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("sk-test"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn sse_aggregator_joins_deltas_until_done() {
        let mut sse = SseAggregator::default();
        let first = "data: {\"choices\":[{\"delta\":{\"content\":\"Suggestion: \"}}]}\n\ndata: {\"choi";
        assert_eq!(sse.push(first), None);
        let second = "ces\":[{\"delta\":{\"content\":\"Do X.\"}}]}\n\ndata: [DONE]\n\n";
        assert_eq!(sse.push(second).as_deref(), Some("Suggestion: Do X."));
    }

    #[test]
    fn upstream_error_prefers_json_message() {
        let err = upstream_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down","code":429}}"#.to_string(),
        );
        assert!(matches!(err, OpenAiClientError::Upstream { ref message, .. } if message == "slow down"));
        assert!(should_retry(&err));

        let err = upstream_error(StatusCode::BAD_REQUEST, "nope".to_string());
        assert!(matches!(err, OpenAiClientError::UpstreamBody { .. }));
        assert!(!should_retry(&err));
    }

    #[test]
    fn backoff_is_capped() {
        let delay = backoff_delay(Duration::from_millis(200), Duration::from_millis(1_000), 10);
        assert!(delay >= Duration::from_millis(1_000));
        assert!(delay <= Duration::from_millis(1_250));
    }

    #[test]
    fn first_choice_text_reads_message_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","object":"chat.completion","choices":[{"index":0,"message":{"role":"assistant","content":"Title: A"},"finish_reason":"stop"}],"usage":{"total_tokens":12}}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(&response), Some("Title: A"));

        let empty: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[],"usage":null}"#).unwrap();
        assert_eq!(first_choice_text(&empty), None);
    }
}
