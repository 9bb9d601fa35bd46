/*!
 * Batched translation orchestration.
 *
 * Translates all pending segments of a file by planning token-bounded
 * batches and running them concurrently against one provider adapter.
 * Failure isolation is per segment: a failed batch, a marker missing from
 * a response, or a failed upsert each demote only the segments concerned,
 * never the siblings, so the file's aggregate state stays derivable from
 * segment statuses alone.
 */

use chrono::Utc;
use futures::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;

use crate::app_config::{AdapterConfig, ProviderKind};
use crate::errors::AppError;
use crate::language_utils;
use crate::providers::{AdapterFactory, AiProvider, ChatCompletionRequest};
use crate::segment::{Segment, SegmentStatus, TranslationMeta};
use crate::store::{SegmentFilter, SegmentStore, SegmentUpdate, SortOrder};

use super::planner::{BatchPlanner, SegmentBatch};
use super::prompt::{build_system_prompt, PromptCodec};
use super::tokens::TokenEstimator;

/// Default input token budget per AI call.
const DEFAULT_MAX_INPUT_TOKENS: usize = 4000;

/// Options for one batched translation run.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Which provider to use
    pub provider: ProviderKind,
    /// Explicit adapter configuration; when present the factory builds a
    /// fresh, uncached adapter for this run
    pub config: Option<AdapterConfig>,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Input token budget per AI call
    pub max_input_tokens: usize,
}

impl TranslateOptions {
    /// Create options for a provider and language pair.
    pub fn new(
        provider: ProviderKind,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            config: None,
            source_language: source_language.into(),
            target_language: target_language.into(),
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
        }
    }

    /// Use an explicit adapter configuration.
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the per-call input token budget.
    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.max_input_tokens = max_input_tokens;
        self
    }
}

/// One segment that did not reach `Translated` in this run.
#[derive(Debug, Clone)]
pub struct FailedSegment {
    /// Segment id
    pub segment_id: String,
    /// Document position
    pub index: usize,
    /// Why it failed
    pub error: String,
}

/// Result of a batched translation run.
#[derive(Debug, Clone, Default)]
pub struct TranslationOutcome {
    /// True only if no segment failed
    pub success: bool,
    /// Number of segments that reached `Translated`
    pub updated_count: usize,
    /// Segments that ended `TranslationFailed`, with reasons
    pub failed_segments: Vec<FailedSegment>,
}

/// Orchestrator for the batched translation path.
pub struct TranslationOrchestrator {
    store: Arc<dyn SegmentStore>,
    factory: Arc<AdapterFactory>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator over a store, using the process-wide
    /// adapter registry.
    pub fn new(store: Arc<dyn SegmentStore>) -> Self {
        Self {
            store,
            factory: AdapterFactory::global(),
        }
    }

    /// Create an orchestrator with its own factory (tests, per-tenant
    /// registries).
    pub fn with_factory(store: Arc<dyn SegmentStore>, factory: Arc<AdapterFactory>) -> Self {
        Self { store, factory }
    }

    /// Translate all pending segments of a file in token-bounded batches.
    ///
    /// Only configuration problems (unresolvable adapter, invalid
    /// languages) are returned as errors; everything that goes wrong
    /// past that point is absorbed into per-segment statuses and
    /// reported through the outcome.
    pub async fn translate_multiple_segments(
        &self,
        file_id: &str,
        options: &TranslateOptions,
    ) -> Result<TranslationOutcome, AppError> {
        language_utils::validate_language_code(&options.source_language)?;
        language_utils::validate_language_code(&options.target_language)?;

        let adapter = self
            .factory
            .adapter(options.provider, options.config.clone())?;

        // A fixed snapshot of eligible segments, taken once: segments are
        // never re-fetched mid-run, so a segment cannot land in two
        // batches of the same run.
        let filter = SegmentFilter::for_file(file_id).with_statuses(vec![
            SegmentStatus::Pending,
            SegmentStatus::TranslationFailed,
        ]);
        let snapshot = self.store.find_many(&filter, SortOrder::ByIndex).await?;
        if snapshot.is_empty() {
            info!("No pending segments for file {}", file_id);
            return Ok(TranslationOutcome { success: true, ..Default::default() });
        }

        let system_prompt =
            build_system_prompt(&options.source_language, &options.target_language);
        let planner = BatchPlanner::new(TokenEstimator::for_model(adapter.model()));
        let plan = planner.plan(&snapshot, &system_prompt, options.max_input_tokens);

        let mut outcome = TranslationOutcome::default();

        // Oversized segments never reach a batch; record the failure on
        // the segment so the file's aggregate state reflects it.
        for segment in &plan.oversized {
            let reason = "segment exceeds the input token budget".to_string();
            self.mark_failed(segment, &reason, &mut outcome).await;
        }

        info!(
            "Translating {} segments of file {} in {} batches via {}",
            plan.planned_count(),
            file_id,
            plan.batches.len(),
            adapter.kind()
        );

        // All batches run concurrently; one batch failing never cancels
        // or blocks the others.
        let batch_results = join_all(plan.batches.into_iter().map(|batch| {
            let adapter = adapter.clone();
            let system_prompt = system_prompt.clone();
            self.run_batch(batch, adapter, system_prompt)
        }))
        .await;

        for batch_outcome in batch_results {
            outcome.updated_count += batch_outcome.updated_count;
            outcome.failed_segments.extend(batch_outcome.failed_segments);
        }

        outcome.success = outcome.failed_segments.is_empty();
        Ok(outcome)
    }

    /// Run one batch: encode, call the adapter, decode, persist.
    async fn run_batch(
        &self,
        batch: SegmentBatch,
        adapter: Arc<dyn AiProvider>,
        system_prompt: String,
    ) -> TranslationOutcome {
        let mut outcome = TranslationOutcome::default();
        let prompt_body = PromptCodec::encode(&batch.segments);
        let request = ChatCompletionRequest::new(system_prompt, prompt_body);

        let response = match adapter.execute_chat_completion(request).await {
            Ok(response) => response,
            Err(e) => {
                // Adapter-level failure: the whole batch fails, no
                // partial credit.
                let reason = format!("AI call failed ({}): {}", e.code(), e);
                error!(
                    "Batch of {} segments failed: {}",
                    batch.segments.len(),
                    reason
                );
                for segment in &batch.segments {
                    self.mark_failed(segment, &reason, &mut outcome).await;
                }
                return outcome;
            }
        };

        let decoded = PromptCodec::decode(&response.content);

        for segment in &batch.segments {
            match decoded.get(&segment.index) {
                Some(translation) => {
                    let meta = TranslationMeta {
                        provider: adapter.kind().to_string(),
                        model: response.model.clone(),
                        prompt_tokens: response.usage.map(|u| u.prompt_tokens),
                        completion_tokens: response.usage.map(|u| u.completion_tokens),
                        total_tokens: response.usage.map(|u| u.total_tokens),
                        translated_at: Utc::now(),
                    };
                    let update = SegmentUpdate::translated(translation.clone(), meta);
                    match self.store.update_one(&segment.id, update).await {
                        Ok(()) => outcome.updated_count += 1,
                        Err(e) => {
                            // Persistence failure demotes this segment
                            // only, never the batch.
                            let reason = format!("failed to persist translation: {}", e);
                            self.mark_failed(segment, &reason, &mut outcome).await;
                        }
                    }
                }
                None => {
                    let reason = "missing in AI response".to_string();
                    warn!(
                        "Segment {} of file {} {}",
                        segment.index, segment.file_id, reason
                    );
                    self.mark_failed(segment, &reason, &mut outcome).await;
                }
            }
        }

        outcome
    }

    /// Record a per-segment failure both in the store and the outcome.
    async fn mark_failed(
        &self,
        segment: &Segment,
        reason: &str,
        outcome: &mut TranslationOutcome,
    ) {
        if let Err(e) = self
            .store
            .update_one(&segment.id, SegmentUpdate::failed(reason))
            .await
        {
            error!(
                "Could not record failure for segment {}: {}",
                segment.index, e
            );
        }
        outcome.failed_segments.push(FailedSegment {
            segment_id: segment.id.clone(),
            index: segment.index,
            error: reason.to_string(),
        });
    }
}
