/*!
 * Provider adapters for AI translation backends.
 *
 * This module contains client implementations for the supported LLM
 * providers:
 * - OpenAI: OpenAI API (and OpenAI-compatible servers)
 * - Anthropic: Anthropic API
 * - Ollama: Local LLM server
 *
 * Each adapter is an independent variant of the [`AiProvider`] capability
 * trait; the only shared machinery is the error normalization below.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

use crate::app_config::ProviderKind;
use crate::errors::ProviderError;

pub mod anthropic;
pub mod factory;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use factory::AdapterFactory;

/// One message of a chat completion conversation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletionRequest {
    /// The conversation so far; the first message may be a system prompt
    pub messages: Vec<ChatMessage>,
    /// Model override; the adapter's configured model when `None`
    pub model: Option<String>,
    /// Temperature override
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    /// Create a request from a system prompt and one user message.
    pub fn new(system_prompt: impl Into<String>, user_content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_content)],
            ..Default::default()
        }
    }

    /// Add a message to the conversation.
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage { role: role.into(), content: content.into() });
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max token count.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage reported by a provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
    /// Total number of tokens
    pub total_tokens: u64,
}

/// Normalized chat completion response.
#[derive(Debug, Clone)]
pub struct ChatCompletionResponse {
    /// The generated text
    pub content: String,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
    /// The model that produced the response
    pub model: String,
}

/// Normalized result of a single-segment translation call.
#[derive(Debug, Clone)]
pub struct SingleTranslation {
    /// The translated text
    pub translated_text: String,
    /// Total tokens consumed, when reported
    pub token_count: Option<u64>,
    /// Wall-clock duration of the call
    pub processing_time: Duration,
    /// The model that produced the translation
    pub model_info: String,
}

/// Common capability interface for all AI providers.
///
/// Implementations are independent per backend; they can be used
/// interchangeably by the orchestrator and the sequential runner.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug {
    /// Which provider this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// The model this adapter is configured for.
    fn model(&self) -> &str;

    /// Execute one chat completion call.
    async fn execute_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError>;

    /// Translate a single text between two languages.
    async fn translate_single(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<SingleTranslation, ProviderError>;

    /// Verify that the configured credentials are accepted by the backend.
    async fn validate_api_key(&self) -> Result<(), ProviderError>;

    /// List the models the backend currently offers.
    async fn list_available_models(&self) -> Result<Vec<String>, ProviderError>;
}

/// Normalize a reqwest transport failure into a [`ProviderError`].
///
/// Shared by all adapters so that timeouts and connection failures carry
/// the same code regardless of backend.
pub(crate) fn normalize_transport_error(error: reqwest::Error, timeout: Duration) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout)
    } else if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::Unknown(error.to_string())
    }
}

/// Normalize a non-success HTTP status into a [`ProviderError`].
pub(crate) fn normalize_status_error(status: u16, body: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::AuthenticationError(body),
        _ => ProviderError::ApiError { status_code: status, message: body },
    }
}
