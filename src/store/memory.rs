/*!
 * In-memory segment store.
 *
 * Keeps everything in a process-local map behind a parking_lot RwLock.
 * The test suite leans on this heavily; it is also useful for one-shot
 * pipeline runs that never need durability.
 */

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::errors::StoreError;
use crate::segment::Segment;

use super::{SegmentFilter, SegmentStore, SegmentUpdate, SortOrder};

/// In-memory implementation of [`SegmentStore`].
#[derive(Debug, Default)]
pub struct MemorySegmentStore {
    segments: RwLock<HashMap<String, Segment>>,
}

impl MemorySegmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of segments currently held.
    pub fn len(&self) -> usize {
        self.segments.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.read().is_empty()
    }
}

#[async_trait]
impl SegmentStore for MemorySegmentStore {
    async fn find_many(
        &self,
        filter: &SegmentFilter,
        sort: SortOrder,
    ) -> Result<Vec<Segment>, StoreError> {
        let mut matched: Vec<Segment> = self
            .segments
            .read()
            .values()
            .filter(|segment| filter.matches(segment))
            .cloned()
            .collect();
        if sort == SortOrder::ByIndex {
            matched.sort_by_key(|segment| segment.index);
        }
        Ok(matched)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Segment>, StoreError> {
        Ok(self.segments.read().get(id).cloned())
    }

    async fn update_one(&self, id: &str, update: SegmentUpdate) -> Result<(), StoreError> {
        let mut segments = self.segments.write();
        let segment = segments
            .get_mut(id)
            .ok_or_else(|| StoreError::Database(format!("no segment with id {}", id)))?;
        update.apply(segment);
        Ok(())
    }

    async fn insert_many(&self, segments: Vec<Segment>) -> Result<usize, StoreError> {
        let count = segments.len();
        let mut map = self.segments.write();
        for segment in segments {
            map.insert(segment.id.clone(), segment);
        }
        Ok(count)
    }

    async fn delete_many(&self, filter: &SegmentFilter) -> Result<usize, StoreError> {
        let mut map = self.segments.write();
        let before = map.len();
        map.retain(|_, segment| !filter.matches(segment));
        Ok(before - map.len())
    }

    async fn count_documents(&self, filter: &SegmentFilter) -> Result<usize, StoreError> {
        Ok(self
            .segments
            .read()
            .values()
            .filter(|segment| filter.matches(segment))
            .count())
    }
}
