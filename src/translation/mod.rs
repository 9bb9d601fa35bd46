/*!
 * AI translation pipeline.
 *
 * This module contains the core translation machinery, split into several
 * submodules:
 *
 * - `tokens`: Token estimation for batch planning
 * - `prompt`: Tagged multi-segment prompt encoding and decoding
 * - `planner`: Token-bounded, order-preserving batch planning
 * - `orchestrator`: Concurrent batched translation of a file's segments
 * - `runner`: Sequential single-segment translation with cancellation
 */

// Re-export main types for easier usage
pub use self::orchestrator::{
    FailedSegment, TranslateOptions, TranslationOrchestrator, TranslationOutcome,
};
pub use self::planner::{BatchPlan, BatchPlanner, SegmentBatch};
pub use self::prompt::{build_system_prompt, PromptCodec};
pub use self::runner::{
    CancelHandle, FileTranslationRunner, RunStatus, TaskStatus, TranslationProgress,
    TranslationTask,
};
pub use self::tokens::TokenEstimator;

// Submodules
pub mod orchestrator;
pub mod planner;
pub mod prompt;
pub mod runner;
pub mod tokens;
