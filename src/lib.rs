/*!
 * # doctran - AI-assisted structured document translation
 *
 * A Rust library for translating structured documents through LLM
 * backends, segment by segment.
 *
 * ## Features
 *
 * - Extract ordered, independently translatable segments from XLIFF 1.2
 *   documents (with a vendor dialect toggle), preserving inline markup
 * - Translate segments in token-bounded batches through a tagged-prompt
 *   protocol, or one at a time with cooperative cancellation
 * - Multiple AI providers behind one capability interface:
 *   - OpenAI API (and OpenAI-compatible servers)
 *   - Anthropic API
 *   - Ollama (local LLM)
 * - Per-segment failure isolation: a failed batch, a dropped marker or a
 *   failed upsert never takes sibling segments down with it
 * - Reconcile translations back into the original document, or fall back
 *   to a plain-text export
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Provider configuration and environment secrets
 * - `segment`: The segment data model and derived file status
 * - `store`: Segment persistence (in-memory and SQLite backends)
 * - `xliff`: XLIFF extraction and write-back
 * - `translation`: The translation pipeline:
 *   - `translation::tokens`: Token estimation
 *   - `translation::prompt`: Tagged prompt encode/decode
 *   - `translation::planner`: Token-bounded batch planning
 *   - `translation::orchestrator`: Concurrent batched translation
 *   - `translation::runner`: Sequential translation with cancellation
 * - `providers`: Adapters for the AI backends and the adapter factory
 * - `export`: Document export with plain-text fallback
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the pipeline
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod export;
pub mod language_utils;
pub mod providers;
pub mod segment;
pub mod store;
pub mod translation;
pub mod xliff;

// Re-export main types for easier usage
pub use app_config::{AdapterConfig, ProviderKind};
pub use errors::{AppError, ConfigError, ExtractionError, ProviderError, StoreError};
pub use segment::{aggregate_file_status, FileStatus, Segment, SegmentStatus};
pub use store::{MemorySegmentStore, SegmentStore, SqliteSegmentStore};
pub use translation::{
    FileTranslationRunner, TranslateOptions, TranslationOrchestrator, TranslationOutcome,
};
pub use xliff::{extract_segments, write_translations};
