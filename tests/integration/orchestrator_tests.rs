/*!
 * Tests for the batched translation orchestrator.
 */

use std::sync::Arc;

use doctran::app_config::{AdapterConfig, ProviderKind};
use doctran::errors::AppError;
use doctran::providers::mock::MockProvider;
use doctran::providers::AdapterFactory;
use doctran::segment::{aggregate_file_status, FileStatus, Segment, SegmentStatus};
use doctran::store::{MemorySegmentStore, SegmentStore};
use doctran::translation::{TranslateOptions, TranslationOrchestrator};

use crate::common::{count_in_status, make_segments, seeded_store, segments_of, FailingStore};

const FILE: &str = "file-1";

fn orchestrator_with(
    store: Arc<dyn SegmentStore>,
    mock: MockProvider,
) -> TranslationOrchestrator {
    let factory = AdapterFactory::new();
    factory.insert(Arc::new(mock));
    TranslationOrchestrator::with_factory(store, Arc::new(factory))
}

fn options() -> TranslateOptions {
    TranslateOptions::new(ProviderKind::OpenAI, "en", "fr")
}

#[tokio::test]
async fn test_translate_happyPath_shouldTranslateEverySegment() {
    let (store, _) = seeded_store(FILE, &["First", "Second", "Third"]).await;
    let orchestrator = orchestrator_with(store.clone(), MockProvider::working());

    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 3);
    assert!(outcome.failed_segments.is_empty());

    let segments = segments_of(store.as_ref(), FILE).await;
    for segment in &segments {
        assert_eq!(segment.status, SegmentStatus::Translated);
        assert_eq!(
            segment.translation.as_deref(),
            Some(format!("[TRANSLATED] {}", segment.source_text).as_str())
        );
        assert!(segment.error.is_none());
        let meta = segment.translation_meta.as_ref().unwrap();
        assert_eq!(meta.provider, "openai");
        assert_eq!(meta.model, "mock-model");
        assert!(segment.translated_length.is_some());
    }
    assert_eq!(aggregate_file_status(&segments), FileStatus::Translated);
}

#[tokio::test]
async fn test_translate_snapshot_shouldOnlySelectPendingAndFailed() {
    let store = Arc::new(MemorySegmentStore::new());
    let mut segments = make_segments(FILE, &["a", "b", "c", "d"]);
    segments[1].status = SegmentStatus::Translated;
    segments[1].translation = Some("kept".to_string());
    segments[2].status = SegmentStatus::TranslationFailed;
    segments[3].status = SegmentStatus::Confirmed;
    store.insert_many(segments).await.unwrap();

    let orchestrator = orchestrator_with(store.clone(), MockProvider::working());
    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options())
        .await
        .unwrap();

    // Only the pending and previously failed segments were touched
    assert_eq!(outcome.updated_count, 2);
    let after = segments_of(store.as_ref(), FILE).await;
    assert_eq!(after[1].translation.as_deref(), Some("kept"));
    assert_eq!(after[3].status, SegmentStatus::Confirmed);
    assert_eq!(after[0].status, SegmentStatus::Translated);
    assert_eq!(after[2].status, SegmentStatus::Translated);
}

#[tokio::test]
async fn test_translate_missingMarker_shouldFailOnlyThatSegment() {
    let (store, _) = seeded_store(FILE, &["one", "two", "three"]).await;
    // The mock answers every marker except [SEG1]
    let orchestrator = orchestrator_with(store.clone(), MockProvider::missing_markers(vec![1]));

    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options())
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.updated_count, 2);
    assert_eq!(outcome.failed_segments.len(), 1);
    assert_eq!(outcome.failed_segments[0].index, 1);
    assert_eq!(outcome.failed_segments[0].error, "missing in AI response");

    let segments = segments_of(store.as_ref(), FILE).await;
    assert_eq!(segments[0].status, SegmentStatus::Translated);
    assert_eq!(segments[1].status, SegmentStatus::TranslationFailed);
    assert_eq!(segments[1].error.as_deref(), Some("missing in AI response"));
    assert_eq!(segments[2].status, SegmentStatus::Translated);
}

#[tokio::test]
async fn test_translate_adapterError_shouldFailWholeBatchWithCause() {
    let (store, _) = seeded_store(FILE, &["one", "two"]).await;
    let orchestrator = orchestrator_with(store.clone(), MockProvider::failing());

    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options())
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.updated_count, 0);
    assert_eq!(outcome.failed_segments.len(), 2);
    for failed in &outcome.failed_segments {
        assert!(failed.error.contains("api_error"));
        assert!(failed.error.contains("mock provider failure"));
    }
    assert_eq!(
        count_in_status(store.as_ref(), FILE, SegmentStatus::TranslationFailed).await,
        2
    );
}

#[tokio::test]
async fn test_translate_persistenceFailure_shouldDemoteOnlyThatSegment() {
    let (memory, ids) = seeded_store(FILE, &["one", "two", "three"]).await;
    let failing = Arc::new(FailingStore::new(memory.clone(), vec![ids[1].clone()]));
    let orchestrator = orchestrator_with(failing, MockProvider::working());

    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options())
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.updated_count, 2);
    assert_eq!(outcome.failed_segments.len(), 1);
    assert_eq!(outcome.failed_segments[0].index, 1);
    assert!(outcome.failed_segments[0].error.contains("persist"));

    let segments = segments_of(memory.as_ref(), FILE).await;
    assert_eq!(segments[0].status, SegmentStatus::Translated);
    assert_eq!(segments[1].status, SegmentStatus::TranslationFailed);
    assert_eq!(segments[2].status, SegmentStatus::Translated);
}

#[tokio::test]
async fn test_translate_oversizedSegment_shouldBeDroppedAndRecorded() {
    let huge = "colossal ".repeat(4000);
    let (store, _) = seeded_store(FILE, &["small one", &huge, "small two"]).await;
    let orchestrator = orchestrator_with(store.clone(), MockProvider::working());

    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options().with_max_input_tokens(800))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.updated_count, 2);
    assert_eq!(outcome.failed_segments.len(), 1);
    assert_eq!(outcome.failed_segments[0].index, 1);
    assert!(outcome.failed_segments[0].error.contains("token budget"));

    let segments = segments_of(store.as_ref(), FILE).await;
    assert_eq!(segments[1].status, SegmentStatus::TranslationFailed);
}

#[tokio::test]
async fn test_translate_manyBatches_shouldAllSettle() {
    let texts: Vec<String> = (0..40).map(|i| format!("sentence number {} here", i)).collect();
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let (store, _) = seeded_store(FILE, &refs).await;

    let mock = MockProvider::working();
    let orchestrator = orchestrator_with(store.clone(), mock);

    // A small budget forces several concurrent batches
    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options().with_max_input_tokens(200))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 40);
    assert_eq!(
        count_in_status(store.as_ref(), FILE, SegmentStatus::Translated).await,
        40
    );
}

#[tokio::test]
async fn test_translate_missingConfiguration_shouldBeFatal() {
    let (store, _) = seeded_store(FILE, &["text"]).await;
    let orchestrator = orchestrator_with(store, MockProvider::working());

    // An explicit configuration without a key never silently defaults
    let bad_config = AdapterConfig::new(ProviderKind::OpenAI, "");
    let result = orchestrator
        .translate_multiple_segments(FILE, &options().with_config(bad_config))
        .await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_translate_invalidTargetLanguage_shouldBeFatal() {
    let (store, _) = seeded_store(FILE, &["text"]).await;
    let orchestrator = orchestrator_with(store, MockProvider::working());

    let mut options = options();
    options.target_language = String::new();
    let result = orchestrator.translate_multiple_segments(FILE, &options).await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_translate_noEligibleSegments_shouldSucceedDoingNothing() {
    let store = Arc::new(MemorySegmentStore::new());
    let mut segment = Segment::new(FILE, 0, "done already");
    segment.status = SegmentStatus::Confirmed;
    store.insert_many(vec![segment]).await.unwrap();

    let orchestrator = orchestrator_with(store, MockProvider::working());
    let outcome = orchestrator
        .translate_multiple_segments(FILE, &options())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 0);
    assert!(outcome.failed_segments.is_empty());
}
