/*!
 * Common test utilities.
 *
 * Store seeding helpers and a store wrapper that injects persistence
 * failures for specific segments, so the per-segment isolation behavior
 * can be exercised without a real database going down.
 */

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use doctran::errors::StoreError;
use doctran::segment::{Segment, SegmentStatus};
use doctran::store::{MemorySegmentStore, SegmentFilter, SegmentStore, SegmentUpdate, SortOrder};

/// Build pending segments for one file from a list of texts.
pub fn make_segments(file_id: &str, texts: &[&str]) -> Vec<Segment> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| Segment::new(file_id, index, *text))
        .collect()
}

/// Seed a fresh in-memory store with pending segments, returning the
/// store and the segment ids in document order.
pub async fn seeded_store(file_id: &str, texts: &[&str]) -> (Arc<MemorySegmentStore>, Vec<String>) {
    let store = Arc::new(MemorySegmentStore::new());
    let segments = make_segments(file_id, texts);
    let ids = segments.iter().map(|s| s.id.clone()).collect();
    store.insert_many(segments).await.unwrap();
    (store, ids)
}

/// Load one file's segments sorted by index.
pub async fn segments_of(store: &dyn SegmentStore, file_id: &str) -> Vec<Segment> {
    store
        .find_many(&SegmentFilter::for_file(file_id), SortOrder::ByIndex)
        .await
        .unwrap()
}

/// Store wrapper that rejects translation upserts for chosen segments.
///
/// Only updates that carry a translation fail; the follow-up update that
/// demotes the segment to `TranslationFailed` is allowed through, which
/// is exactly the partial-failure shape the orchestrator must absorb.
pub struct FailingStore {
    inner: Arc<MemorySegmentStore>,
    fail_translation_for: HashSet<String>,
}

impl FailingStore {
    pub fn new(inner: Arc<MemorySegmentStore>, fail_translation_for: Vec<String>) -> Self {
        Self {
            inner,
            fail_translation_for: fail_translation_for.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SegmentStore for FailingStore {
    async fn find_many(
        &self,
        filter: &SegmentFilter,
        sort: SortOrder,
    ) -> Result<Vec<Segment>, StoreError> {
        self.inner.find_many(filter, sort).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Segment>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn update_one(&self, id: &str, update: SegmentUpdate) -> Result<(), StoreError> {
        if update.translation.is_some() && self.fail_translation_for.contains(id) {
            return Err(StoreError::Database("injected write failure".to_string()));
        }
        self.inner.update_one(id, update).await
    }

    async fn insert_many(&self, segments: Vec<Segment>) -> Result<usize, StoreError> {
        self.inner.insert_many(segments).await
    }

    async fn delete_many(&self, filter: &SegmentFilter) -> Result<usize, StoreError> {
        self.inner.delete_many(filter).await
    }

    async fn count_documents(&self, filter: &SegmentFilter) -> Result<usize, StoreError> {
        self.inner.count_documents(filter).await
    }
}

/// Count segments of a file in a given status.
pub async fn count_in_status(
    store: &dyn SegmentStore,
    file_id: &str,
    status: SegmentStatus,
) -> usize {
    store
        .count_documents(&SegmentFilter::for_file(file_id).with_statuses(vec![status]))
        .await
        .unwrap()
}
