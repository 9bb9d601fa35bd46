/*!
 * Sequential translation runner.
 *
 * Processes a list of texts one segment at a time through a single
 * provider adapter, tracking per-task state and overall progress in
 * memory. Nothing here is persisted; tasks and progress live only for
 * the duration of one runner invocation.
 *
 * Cancellation is cooperative: it is observed between segment
 * iterations and never aborts an in-flight call.
 */

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::AiProvider;

/// Status of a single translation task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task awaiting its turn
    Pending,
    /// Task's call is in flight
    Processing,
    /// Task finished successfully
    Completed,
    /// Task failed after exhausting its attempts
    Failed,
    /// Task was cancelled before completing
    Cancelled,
}

/// Overall status of a runner invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Not started yet
    Pending,
    /// Currently iterating
    Processing,
    /// Every task completed
    Completed,
    /// At least one task failed
    Failed,
    /// The run was cancelled
    Cancelled,
}

/// Ephemeral per-text task state.
#[derive(Debug, Clone)]
pub struct TranslationTask {
    /// Unique task identifier
    pub id: String,
    /// Current status
    pub status: TaskStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last state change
    pub updated_at: DateTime<Utc>,
    /// Per-task progress, 0-100
    pub progress: u8,
    /// Failure reason, if any
    pub error: Option<String>,
}

impl TranslationTask {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            progress: 0,
            error: None,
        }
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Ephemeral per-run progress snapshot.
#[derive(Debug, Clone)]
pub struct TranslationProgress {
    /// Total number of tasks
    pub total_segments: usize,
    /// Tasks that finished, successfully or not
    pub processed_segments: usize,
    /// Tasks that completed successfully
    pub completed_segments: usize,
    /// Tasks that failed
    pub failed_segments: usize,
    /// Overall progress, 0-100
    pub progress: u8,
    /// Overall status
    pub status: RunStatus,
    /// When this snapshot last changed
    pub last_updated: DateTime<Utc>,
}

impl TranslationProgress {
    fn new(total_segments: usize) -> Self {
        Self {
            total_segments,
            processed_segments: 0,
            completed_segments: 0,
            failed_segments: 0,
            progress: 0,
            status: RunStatus::Pending,
            last_updated: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.progress = if self.total_segments == 0 {
            100
        } else {
            ((self.processed_segments * 100) / self.total_segments) as u8
        };
        self.last_updated = Utc::now();
    }
}

/// Accumulated token usage across a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageTotals {
    /// Total tokens reported by the provider
    pub total_tokens: u64,
    /// Total wall-clock time spent in provider calls
    pub api_duration: Duration,
}

/// Shared handle that requests cancellation of a running translation.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation. Takes effect between segment iterations.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Sequential, single-file translation runner.
///
/// The runner exclusively owns its task list; only one segment call is
/// ever in flight, so no internal locking is needed.
pub struct FileTranslationRunner {
    adapter: Arc<dyn AiProvider>,
    texts: Vec<String>,
    tasks: Vec<TranslationTask>,
    progress: TranslationProgress,
    usage: UsageTotals,
    cancel: CancelHandle,
    /// Bounded attempts per task before accepting failure
    max_attempts: u32,
    /// Delay between retry attempts
    retry_backoff: Duration,
}

impl FileTranslationRunner {
    /// Create a runner over one provider adapter.
    pub fn new(adapter: Arc<dyn AiProvider>) -> Self {
        Self {
            adapter,
            texts: Vec::new(),
            tasks: Vec::new(),
            progress: TranslationProgress::new(0),
            usage: UsageTotals::default(),
            cancel: CancelHandle::default(),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Override the per-task attempt bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Override the retry backoff (tests use zero).
    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Use an externally created cancel handle.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Create one pending task per text, in order.
    pub fn initialize(&mut self, texts: Vec<String>) {
        self.tasks = texts.iter().map(|_| TranslationTask::new()).collect();
        self.progress = TranslationProgress::new(texts.len());
        self.texts = texts;
    }

    /// A handle that can cancel this run from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Cancel the run now: every not-yet-completed task flips to
    /// `Cancelled`, as does the overall progress.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.apply_cancellation();
    }

    fn apply_cancellation(&mut self) {
        for task in &mut self.tasks {
            if task.status != TaskStatus::Completed {
                task.set_status(TaskStatus::Cancelled);
            }
        }
        self.progress.status = RunStatus::Cancelled;
        self.progress.last_updated = Utc::now();
    }

    /// Translate all initialized texts strictly in order.
    ///
    /// A task that exhausts its attempts is marked `Failed` and the run
    /// continues with the next task; the error stays recorded on the
    /// task. Returns the translations by position (`None` for tasks that
    /// failed or were cancelled).
    pub async fn translate(
        &mut self,
        source_language: &str,
        target_language: &str,
    ) -> Vec<Option<String>> {
        let mut results: Vec<Option<String>> = vec![None; self.texts.len()];
        self.progress.status = RunStatus::Processing;

        for position in 0..self.texts.len() {
            // Cooperative cancellation point: between iterations only
            if self.cancel.is_cancelled() {
                self.apply_cancellation();
                return results;
            }

            self.tasks[position].set_status(TaskStatus::Processing);
            let text = self.texts[position].clone();

            match self
                .translate_with_retries(&text, source_language, target_language)
                .await
            {
                Ok(translation) => {
                    if let Some(tokens) = translation.token_count {
                        self.usage.total_tokens += tokens;
                    }
                    self.usage.api_duration += translation.processing_time;

                    let task = &mut self.tasks[position];
                    task.progress = 100;
                    task.set_status(TaskStatus::Completed);
                    self.progress.completed_segments += 1;
                    results[position] = Some(translation.translated_text);
                }
                Err(e) => {
                    warn!("Task {} failed: {}", position, e);
                    let task = &mut self.tasks[position];
                    task.error = Some(e.to_string());
                    task.set_status(TaskStatus::Failed);
                    self.progress.failed_segments += 1;
                }
            }

            self.progress.processed_segments += 1;
            self.progress.touch();
        }

        self.progress.status = if self.progress.failed_segments > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        self.progress.last_updated = Utc::now();
        info!(
            "Sequential run finished: {}/{} completed, {} failed",
            self.progress.completed_segments,
            self.progress.total_segments,
            self.progress.failed_segments
        );
        results
    }

    /// Call the adapter with bounded retries.
    async fn translate_with_retries(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<crate::providers::SingleTranslation, ProviderError> {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self
                .adapter
                .translate_single(text, source_language, target_language)
                .await
            {
                Ok(translation) => return Ok(translation),
                Err(e) => {
                    warn!(
                        "translate_single attempt {}/{} failed: {}",
                        attempt, self.max_attempts, e
                    );
                    last_error = Some(e);
                    if attempt < self.max_attempts && !self.retry_backoff.is_zero() {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| ProviderError::Unknown("no attempts were made".to_string())))
    }

    /// The per-task state, in order.
    pub fn tasks(&self) -> &[TranslationTask] {
        &self.tasks
    }

    /// The current progress snapshot.
    pub fn progress(&self) -> &TranslationProgress {
        &self.progress
    }

    /// Token usage accumulated so far.
    pub fn usage(&self) -> UsageTotals {
        self.usage
    }
}
