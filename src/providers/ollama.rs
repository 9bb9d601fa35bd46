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

/// Ollama client for a local LLM server.
#[derive(Debug)]
pub struct OllamaAdapter {
    /// HTTP client for making requests
    client: Client,
    /// Adapter configuration
    config: AdapterConfig,
    /// Request timeout, kept for error reporting
    timeout: Duration,
}

/// Chat message object
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    /// Role of the message sender (system, user, assistant)
    role: String,
    /// Content of the message
    content: String,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
struct OllamaOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<OllamaMessage>,
    /// Additional model parameters
    options: OllamaOptions,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    /// Model name
    #[serde(default)]
    model: Option<String>,
    /// Response message
    message: Option<OllamaMessage>,
    /// Error string, for body-level failures
    #[serde(default)]
    error: Option<String>,
    /// Number of prompt tokens
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Tag listing response
#[derive(Debug, Deserialize)]
struct OllamaTagList {
    #[serde(default)]
    models: Vec<OllamaTagEntry>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagEntry {
    name: String,
}

impl OllamaAdapter {
    /// Create a new adapter from a configuration.
    pub fn new(config: AdapterConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            client: Client::builder()
                .timeout(timeout)
                // Ollama serves HTTP/1.1; keep connections alive for
                // consecutive segment calls
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            config,
            timeout,
        }
    }
}

#[async_trait]
impl AiProvider for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn execute_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let url = format!("{}/api/chat", self.config.endpoint());
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let body = OllamaChatRequest {
            model: model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage { role: m.role.clone(), content: m.content.clone() })
                .collect(),
            options: OllamaOptions {
                temperature: request.temperature.or(Some(self.config.temperature)),
                num_predict: request.max_tokens.or(Some(self.config.max_tokens)),
            },
            stream: false,
        };

        let response = self
            .client
            .post(&url)
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
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(normalize_status_error(status.as_u16(), error_text));
        }

        let parsed = response
            .json::<OllamaChatResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(message) = parsed.error {
            error!("Ollama returned an error payload: {}", message);
            return Err(ProviderError::ResponseError(message));
        }

        let content = parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| ProviderError::ParseError("response contained no message".to_string()))?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        Ok(ChatCompletionResponse {
            content,
            usage,
            model: parsed.model.unwrap_or(model),
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
        // Ollama has no API keys; reachability of the server is the check
        let url = format!("{}/api/version", self.config.endpoint());
        let response = self
            .client
            .get(&url)
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
        Ok(())
    }

    async fn list_available_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.config.endpoint());
        let response = self
            .client
            .get(&url)
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
            .json::<OllamaTagList>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(list.models.into_iter().map(|entry| entry.name).collect())
    }
}
