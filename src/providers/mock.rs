/*!
 * Mock provider for testing.
 *
 * Simulates the provider behaviors the pipeline has to survive:
 * - `MockProvider::working()` - always succeeds, markers intact
 * - `MockProvider::missing_markers(..)` - drops chosen segments from the response
 * - `MockProvider::failing()` - always fails with an API error
 * - `MockProvider::fail_when_contains(..)` - fails calls whose input contains a needle
 *
 * No network is involved; responses are derived from the request text.
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::ProviderKind;
use crate::errors::ProviderError;
use crate::translation::prompt::PromptCodec;

use super::{
    AiProvider, ChatCompletionRequest, ChatCompletionResponse, SingleTranslation, TokenUsage,
};

/// Behavior mode for the mock provider
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeeds; every marker in the prompt is answered
    Working,
    /// Succeeds but omits the given segment indices from the response
    MissingMarkers(Vec<usize>),
    /// Always fails with an API error
    Failing,
    /// Fails any call whose user content contains this needle
    FailWhenContains(String),
}

/// Hook invoked with the 1-based call number before each call completes.
pub type CallHook = Arc<dyn Fn(usize) + Send + Sync>;

/// Mock implementation of [`AiProvider`].
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Provider identity to report
    kind: ProviderKind,
    /// Number of calls made so far
    call_count: Arc<AtomicUsize>,
    /// Optional per-call hook (used by cancellation tests)
    call_hook: Option<CallHook>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("behavior", &self.behavior)
            .field("kind", &self.kind)
            .field("call_count", &self.call_count.load(Ordering::SeqCst))
            .finish()
    }
}

impl MockProvider {
    /// Create a mock with the specified behavior.
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            kind: ProviderKind::OpenAI,
            call_count: Arc::new(AtomicUsize::new(0)),
            call_hook: None,
        }
    }

    /// Create a working mock that always succeeds.
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that drops the given segment indices from responses.
    pub fn missing_markers(indices: Vec<usize>) -> Self {
        Self::new(MockBehavior::MissingMarkers(indices))
    }

    /// Create a failing mock that always errors.
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that fails calls containing the given needle.
    pub fn fail_when_contains(needle: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailWhenContains(needle.into()))
    }

    /// Report a different provider identity.
    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach a per-call hook.
    pub fn with_call_hook(mut self, hook: CallHook) -> Self {
        self.call_hook = Some(hook);
        self
    }

    /// Number of calls made against this mock.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The canonical mock translation of a source text.
    pub fn translate_text(text: &str) -> String {
        format!("[TRANSLATED] {}", text)
    }

    fn record_call(&self, user_content: &str) -> Result<(), ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = &self.call_hook {
            hook(call);
        }
        match &self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "mock provider failure".to_string(),
            }),
            MockBehavior::FailWhenContains(needle) if user_content.contains(needle.as_str()) => {
                Err(ProviderError::ApiError {
                    status_code: 500,
                    message: format!("mock provider failure on '{}'", needle),
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn execute_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let user_content = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.record_call(&user_content)?;

        let decoded = PromptCodec::decode(&user_content);
        let skipped: &[usize] = match &self.behavior {
            MockBehavior::MissingMarkers(indices) => indices,
            _ => &[],
        };

        let mut indices: Vec<usize> = decoded.keys().copied().collect();
        indices.sort_unstable();
        let blocks: Vec<String> = indices
            .into_iter()
            .filter(|index| !skipped.contains(index))
            .map(|index| format!("[SEG{}]\n{}", index, Self::translate_text(&decoded[&index])))
            .collect();

        let content = if blocks.is_empty() {
            // Not a tagged prompt; behave like a single-text translation
            Self::translate_text(&user_content)
        } else {
            blocks.join("\n\n")
        };

        Ok(ChatCompletionResponse {
            content,
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
            model: "mock-model".to_string(),
        })
    }

    async fn translate_single(
        &self,
        text: &str,
        _source_language: &str,
        _target_language: &str,
    ) -> Result<SingleTranslation, ProviderError> {
        let start_time = Instant::now();
        self.record_call(text)?;
        Ok(SingleTranslation {
            translated_text: Self::translate_text(text),
            token_count: Some(30),
            processing_time: start_time.elapsed().max(Duration::from_micros(1)),
            model_info: "mock-model".to_string(),
        })
    }

    async fn validate_api_key(&self) -> Result<(), ProviderError> {
        match &self.behavior {
            MockBehavior::Failing => Err(ProviderError::AuthenticationError(
                "mock credentials rejected".to_string(),
            )),
            _ => Ok(()),
        }
    }

    async fn list_available_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["mock-model".to_string()])
    }
}
