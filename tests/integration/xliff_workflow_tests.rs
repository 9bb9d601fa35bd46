/*!
 * End-to-end workflow tests: extract, translate through the batched
 * orchestrator, write back, re-extract.
 */

use std::sync::Arc;

use doctran::app_config::ProviderKind;
use doctran::providers::mock::MockProvider;
use doctran::providers::AdapterFactory;
use doctran::segment::SegmentStatus;
use doctran::store::{MemorySegmentStore, SegmentFilter, SegmentStore, SortOrder};
use doctran::translation::{TranslateOptions, TranslationOrchestrator};
use doctran::xliff::{extract_from_str, write_to_string, ExtractOptions, WriteOptions};

const FILE: &str = "guide";

const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file original="guide.html" source-language="en" target-language="fr" datatype="html">
    <body>
      <trans-unit id="title">
        <source>Getting started</source>
      </trans-unit>
      <trans-unit id="intro">
        <source>Read <g id="1">the manual</g> first</source>
      </trans-unit>
      <trans-unit id="footer">
        <source>All rights reserved</source>
      </trans-unit>
    </body>
  </file>
</xliff>"#;

/// Scenario B: one unit with external state "translated" and target
/// text, one empty unit.
#[test]
fn test_extraction_scenarioB_shouldMapStates() {
    let doc = r#"<?xml version="1.0"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file source-language="en" datatype="plaintext"><body>
    <trans-unit id="done">
      <source>Finished text</source>
      <target state="translated">Texte fini</target>
    </trans-unit>
    <trans-unit id="todo">
      <source>Waiting text</source>
    </trans-unit>
  </body></file>
</xliff>"#;

    let result = extract_from_str(doc, &ExtractOptions::new(FILE)).unwrap();
    assert_eq!(result.segment_count, 2);
    assert_eq!(result.segments[0].status, SegmentStatus::Translated);
    assert_eq!(result.segments[0].translation.as_deref(), Some("Texte fini"));
    assert_eq!(result.segments[1].status, SegmentStatus::Pending);
    assert!(result.segments[1].translation.is_none());
}

#[tokio::test]
async fn test_fullPipeline_extractTranslateWriteReextract() {
    // Extract
    let extraction = extract_from_str(DOC, &ExtractOptions::new(FILE)).unwrap();
    assert_eq!(extraction.segment_count, 3);

    // Persist
    let store = Arc::new(MemorySegmentStore::new());
    store.insert_many(extraction.segments).await.unwrap();

    // Translate through the batched path with a mock adapter
    let factory = AdapterFactory::new();
    factory.insert(Arc::new(MockProvider::working()));
    let orchestrator = TranslationOrchestrator::with_factory(store.clone(), Arc::new(factory));
    let outcome = orchestrator
        .translate_multiple_segments(FILE, &TranslateOptions::new(ProviderKind::OpenAI, "en", "fr"))
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 3);

    // Write back
    let translated = store
        .find_many(&SegmentFilter::for_file(FILE), SortOrder::ByIndex)
        .await
        .unwrap();
    let (output, report) =
        write_to_string(DOC, &translated, &WriteOptions::default()).unwrap();
    assert_eq!(report.written, 3);
    assert_eq!(report.skipped, 0);

    // The inline markup survived the whole trip
    assert!(output.contains(r#"[TRANSLATED] Read <g id="1">the manual</g> first"#));

    // Re-extract: same count, same sources, states consistent with what
    // was written
    let second = extract_from_str(&output, &ExtractOptions::new(FILE)).unwrap();
    assert_eq!(second.segment_count, 3);
    for segment in &second.segments {
        assert_eq!(segment.status, SegmentStatus::Translated);
        assert!(segment
            .translation
            .as_deref()
            .unwrap()
            .starts_with("[TRANSLATED]"));
    }
    assert_eq!(second.segments[0].source_text, "Getting started");
    assert_eq!(
        second.segments[1].source_text,
        r#"Read <g id="1">the manual</g> first"#
    );
}

#[tokio::test]
async fn test_reextraction_afterPartialFailure_shouldOnlyRetryFailedSegments() {
    let extraction = extract_from_str(DOC, &ExtractOptions::new(FILE)).unwrap();
    let store = Arc::new(MemorySegmentStore::new());
    store.insert_many(extraction.segments).await.unwrap();

    // First run drops [SEG1] from every response
    let factory = AdapterFactory::new();
    factory.insert(Arc::new(MockProvider::missing_markers(vec![1])));
    let orchestrator = TranslationOrchestrator::with_factory(store.clone(), Arc::new(factory));
    let options = TranslateOptions::new(ProviderKind::OpenAI, "en", "fr");
    let first = orchestrator
        .translate_multiple_segments(FILE, &options)
        .await
        .unwrap();
    assert_eq!(first.updated_count, 2);
    assert_eq!(first.failed_segments.len(), 1);

    // Second run with a healthy adapter picks up only the failed segment
    let factory = AdapterFactory::new();
    let retry_mock = Arc::new(MockProvider::working());
    factory.insert(retry_mock.clone());
    let orchestrator = TranslationOrchestrator::with_factory(store.clone(), Arc::new(factory));
    let second = orchestrator
        .translate_multiple_segments(FILE, &options)
        .await
        .unwrap();

    assert!(second.success);
    assert_eq!(second.updated_count, 1);
    assert_eq!(retry_mock.call_count(), 1);

    let all = store
        .find_many(&SegmentFilter::for_file(FILE), SortOrder::ByIndex)
        .await
        .unwrap();
    assert!(all.iter().all(|s| s.status == SegmentStatus::Translated));
}
