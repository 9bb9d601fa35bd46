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
    ChatCompletionResponse, SingleTranslation, TokenUsage,
};

/// Anthropic client for interacting with the Anthropic messages API.
#[derive(Debug)]
pub struct AnthropicAdapter {
    /// HTTP client for API requests
    client: Client,
    /// Adapter configuration
    config: AdapterConfig,
    /// Request timeout, kept for error reporting
    timeout: Duration,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    role: String,

    /// Content of the message
    content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    /// Number of input tokens
    input_tokens: u64,
    /// Number of output tokens
    output_tokens: u64,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    content_type: String,

    /// The actual text content
    #[serde(default)]
    text: String,
}

/// Body-level error payload
#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    /// The content of the response
    #[serde(default)]
    content: Vec<AnthropicContent>,
    /// Token usage information
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    /// The model that produced the response
    #[serde(default)]
    model: Option<String>,
    /// Error payload, if the body carries one
    #[serde(default)]
    error: Option<AnthropicErrorBody>,
}

/// Model listing response
#[derive(Debug, Deserialize)]
struct AnthropicModelList {
    #[serde(default)]
    data: Vec<AnthropicModelEntry>,
}

#[derive(Debug, Deserialize)]
struct AnthropicModelEntry {
    id: String,
}

impl AnthropicAdapter {
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

    /// Split a provider-agnostic request into Anthropic's shape: the
    /// system prompt is a dedicated field, not a message role.
    fn to_wire_request(&self, request: &ChatCompletionRequest) -> AnthropicRequest {
        let mut system = None;
        let mut messages = Vec::new();
        for message in &request.messages {
            if message.role == "system" {
                system = Some(message.content.clone());
            } else {
                messages.push(AnthropicMessage {
                    role: message.role.clone(),
                    content: message.content.clone(),
                });
            }
        }
        AnthropicRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages,
            system,
            temperature: request.temperature.or(Some(self.config.temperature)),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
        }
    }
}

#[async_trait]
impl AiProvider for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn execute_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.config.endpoint());
        let body = self.to_wire_request(&request);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
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
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(normalize_status_error(status.as_u16(), error_text));
        }

        let parsed = response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(error_body) = parsed.error {
            error!("Anthropic returned an error payload: {}", error_body.message);
            return Err(ProviderError::ResponseError(error_body.message));
        }

        let content: String = parsed
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text.as_str())
            .collect();
        if content.is_empty() {
            return Err(ProviderError::ParseError(
                "response contained no text content".to_string(),
            ));
        }

        Ok(ChatCompletionResponse {
            content,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
            model: parsed.model.unwrap_or_else(|| body.model.clone()),
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
        // The cheapest authenticated call: a one-token completion
        let request = ChatCompletionRequest::default()
            .add_message("user", "Hello")
            .max_tokens(1);
        self.execute_chat_completion(request).await.map(|_| ())
    }

    async fn list_available_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/v1/models", self.config.endpoint());
        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
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
            .json::<AnthropicModelList>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(list.data.into_iter().map(|entry| entry.id).collect())
    }
}
