use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::{AdapterConfig, ProviderKind};
use crate::errors::ProviderError;
use crate::translation::prompt::build_system_prompt;

use super::{
    normalize_status_error, normalize_transport_error, AiProvider, ChatCompletionRequest,
    ChatCompletionResponse, ChatMessage, SingleTranslation, TokenUsage,
};

/// OpenAI client for the chat completions API.
///
/// Also speaks to OpenAI-compatible servers via a `base_url` override.
#[derive(Debug)]
pub struct OpenAiAdapter {
    /// HTTP client for API requests
    client: Client,
    /// Adapter configuration
    config: AdapterConfig,
    /// Request timeout, kept for error reporting
    timeout: Duration,
}

/// OpenAI chat completion request body
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    /// The model to use
    model: &'a str,
    /// The messages for the conversation
    messages: &'a [ChatMessage],
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// Streaming is never used by this pipeline
    stream: bool,
}

/// One choice in an OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    /// The generated message
    message: ChatMessage,
}

/// Token usage block in an OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Body-level error payload (can arrive with a 200 status)
#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    error: Option<OpenAiErrorBody>,
}

/// Model listing response
#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    #[serde(default)]
    data: Vec<OpenAiModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelEntry {
    id: String,
}

impl OpenAiAdapter {
    /// Create a new adapter from a validated configuration.
    pub fn new(config: AdapterConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            config,
            timeout,
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn execute_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.config.endpoint());
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = OpenAiRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature.or(Some(self.config.temperature)),
            max_tokens: request.max_tokens.or(Some(self.config.max_tokens)),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| normalize_transport_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(normalize_status_error(status.as_u16(), error_text));
        }

        let parsed = response
            .json::<OpenAiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        // A 200 can still carry an error payload instead of choices
        if let Some(error_body) = parsed.error {
            error!("OpenAI returned an error payload: {}", error_body.message);
            return Err(ProviderError::ResponseError(error_body.message));
        }

        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("response contained no choices".to_string()))?;

        Ok(ChatCompletionResponse {
            content,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model: parsed.model.unwrap_or_else(|| model.to_string()),
        })
    }

    async fn translate_single(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<SingleTranslation, ProviderError> {
        let start_time = Instant::now();
        let system_prompt = build_system_prompt(source_language, target_language);
        let response = self
            .execute_chat_completion(ChatCompletionRequest::new(system_prompt, text))
            .await?;

        Ok(SingleTranslation {
            translated_text: response.content,
            token_count: response.usage.map(|u| u.total_tokens),
            processing_time: start_time.elapsed(),
            model_info: response.model,
        })
    }

    async fn validate_api_key(&self) -> Result<(), ProviderError> {
        self.list_available_models().await.map(|_| ())
    }

    async fn list_available_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.config.endpoint());
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| normalize_transport_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(normalize_status_error(status.as_u16(), error_text));
        }

        let list = response
            .json::<OpenAiModelList>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(list.data.into_iter().map(|entry| entry.id).collect())
    }
}
