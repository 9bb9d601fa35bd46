/*!
 * Segment persistence.
 *
 * The pipeline talks to its store through the [`SegmentStore`] trait only:
 * find/update/insert primitives over segments, nothing richer. Two backends
 * are provided:
 * - `memory`: an in-process map, used by tests and ephemeral runs
 * - `sqlite`: a single-file database for the CLI
 */

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::segment::{Segment, SegmentStatus, TranslationMeta};

pub mod memory;
pub mod sqlite;

pub use memory::MemorySegmentStore;
pub use sqlite::SqliteSegmentStore;

/// Filter over segments. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SegmentFilter {
    /// Restrict to one file
    pub file_id: Option<String>,
    /// Restrict to segments in any of these statuses
    pub statuses: Option<Vec<SegmentStatus>>,
}

impl SegmentFilter {
    /// Match all segments of a file.
    pub fn for_file(file_id: impl Into<String>) -> Self {
        Self {
            file_id: Some(file_id.into()),
            statuses: None,
        }
    }

    /// Restrict the filter to the given statuses.
    pub fn with_statuses(mut self, statuses: Vec<SegmentStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    /// Whether a segment matches this filter.
    pub fn matches(&self, segment: &Segment) -> bool {
        if let Some(file_id) = &self.file_id {
            if &segment.file_id != file_id {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&segment.status) {
                return false;
            }
        }
        true
    }
}

/// Sort order for `find_many`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending by segment index (document order)
    #[default]
    ByIndex,
    /// No guaranteed order
    Unordered,
}

/// Partial update applied to one segment.
///
/// Only fields that are `Some` are written; `clear_error` resets the error
/// column independently so a successful translation can wipe a stale failure.
#[derive(Debug, Clone, Default)]
pub struct SegmentUpdate {
    pub status: Option<SegmentStatus>,
    pub translation: Option<String>,
    pub final_text: Option<String>,
    pub translated_length: Option<usize>,
    pub translation_meta: Option<TranslationMeta>,
    pub error: Option<String>,
    pub clear_error: bool,
}

impl SegmentUpdate {
    /// Update that records a successful translation.
    pub fn translated(translation: String, meta: TranslationMeta) -> Self {
        Self {
            status: Some(SegmentStatus::Translated),
            translated_length: Some(translation.chars().count()),
            translation: Some(translation),
            translation_meta: Some(meta),
            clear_error: true,
            ..Default::default()
        }
    }

    /// Update that records a failed translation.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(SegmentStatus::TranslationFailed),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Apply this update to a segment in place.
    pub fn apply(&self, segment: &mut Segment) {
        if let Some(status) = self.status {
            segment.status = status;
        }
        if let Some(translation) = &self.translation {
            segment.translation = Some(translation.clone());
        }
        if let Some(final_text) = &self.final_text {
            segment.final_text = Some(final_text.clone());
        }
        if let Some(translated_length) = self.translated_length {
            segment.translated_length = Some(translated_length);
        }
        if let Some(meta) = &self.translation_meta {
            segment.translation_meta = Some(meta.clone());
        }
        if self.clear_error {
            segment.error = None;
        }
        if let Some(error) = &self.error {
            segment.error = Some(error.clone());
        }
    }
}

/// Persistence collaborator for segments.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Find all segments matching a filter.
    async fn find_many(
        &self,
        filter: &SegmentFilter,
        sort: SortOrder,
    ) -> Result<Vec<Segment>, StoreError>;

    /// Find one segment by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Segment>, StoreError>;

    /// Apply a partial update to one segment.
    async fn update_one(&self, id: &str, update: SegmentUpdate) -> Result<(), StoreError>;

    /// Insert a batch of segments, returning how many were written.
    async fn insert_many(&self, segments: Vec<Segment>) -> Result<usize, StoreError>;

    /// Delete all segments matching a filter, returning how many went away.
    async fn delete_many(&self, filter: &SegmentFilter) -> Result<usize, StoreError>;

    /// Count segments matching a filter.
    async fn count_documents(&self, filter: &SegmentFilter) -> Result<usize, StoreError>;
}
