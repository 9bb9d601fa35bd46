/*!
 * Tests for the sequential translation runner.
 */

use std::sync::Arc;
use std::time::Duration;

use doctran::providers::mock::MockProvider;
use doctran::translation::{CancelHandle, FileTranslationRunner, RunStatus, TaskStatus};

fn texts() -> Vec<String> {
    vec![
        "Segment 1".to_string(),
        "Segment 2".to_string(),
        "Segment 3".to_string(),
    ]
}

fn runner_with(mock: MockProvider) -> FileTranslationRunner {
    FileTranslationRunner::new(Arc::new(mock))
        .with_max_attempts(3)
        .with_retry_backoff(Duration::ZERO)
}

#[tokio::test]
async fn test_translate_allWorking_shouldCompleteEveryTaskInOrder() {
    let mut runner = runner_with(MockProvider::working());
    runner.initialize(texts());

    let results = runner.translate("en", "fr").await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_deref(), Some("[TRANSLATED] Segment 1"));
    assert_eq!(results[2].as_deref(), Some("[TRANSLATED] Segment 3"));
    for task in runner.tasks() {
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.error.is_none());
    }

    let progress = runner.progress();
    assert_eq!(progress.total_segments, 3);
    assert_eq!(progress.completed_segments, 3);
    assert_eq!(progress.failed_segments, 0);
    assert_eq!(progress.progress, 100);
    assert_eq!(progress.status, RunStatus::Completed);
    assert!(runner.usage().total_tokens > 0);
}

/// Scenario A: the second segment fails three consecutive attempts, the
/// next call succeeds. The failed task stays failed, the run continues.
#[tokio::test]
async fn test_translate_scenarioA_secondSegmentFails_shouldContinueRun() {
    let mock = MockProvider::fail_when_contains("Segment 2");
    let mut runner = runner_with(mock);
    runner.initialize(texts());

    let results = runner.translate("en", "fr").await;

    let tasks = runner.tasks();
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert_eq!(tasks[1].status, TaskStatus::Failed);
    assert!(tasks[1].error.as_deref().unwrap().contains("mock provider failure"));
    assert_eq!(tasks[2].status, TaskStatus::Completed);

    assert!(results[0].is_some());
    assert!(results[1].is_none());
    assert!(results[2].is_some());

    let progress = runner.progress();
    assert_eq!(progress.completed_segments, 2);
    assert_eq!(progress.failed_segments, 1);
    assert_eq!(progress.status, RunStatus::Failed);
    assert_eq!(progress.progress, 100);
}

#[tokio::test]
async fn test_translate_retries_shouldBeBoundedPerTask() {
    let mock = Arc::new(MockProvider::fail_when_contains("Segment 2"));
    let mut runner = FileTranslationRunner::new(mock.clone())
        .with_max_attempts(3)
        .with_retry_backoff(Duration::ZERO);
    runner.initialize(texts());
    runner.translate("en", "fr").await;

    // 1 call for task 0, 3 bounded attempts for task 1, 1 call for task 2
    assert_eq!(mock.call_count(), 5);
}

#[tokio::test]
async fn test_cancel_beforeRun_shouldCancelEveryTask() {
    let mut runner = runner_with(MockProvider::working());
    runner.initialize(texts());
    runner.cancel();

    for task in runner.tasks() {
        assert_eq!(task.status, TaskStatus::Cancelled);
    }
    assert_eq!(runner.progress().status, RunStatus::Cancelled);

    // A run after cancellation does no work
    let results = runner.translate("en", "fr").await;
    assert!(results.iter().all(|r| r.is_none()));
}

#[tokio::test]
async fn test_cancel_midRun_shouldCancelRemainingTasksOnly() {
    // Cancel from "outside" as soon as the first provider call happens;
    // the runner observes it between iterations
    let handle = CancelHandle::default();
    let hook_handle = handle.clone();
    let mock = MockProvider::working().with_call_hook(Arc::new(move |_call| {
        hook_handle.cancel();
    }));
    let mut runner = runner_with(mock).with_cancel_handle(handle);
    runner.initialize(texts());

    let results = runner.translate("en", "fr").await;
    let tasks = runner.tasks();

    // First task finished before cancellation was observed
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert!(results[0].is_some());
    assert_eq!(tasks[1].status, TaskStatus::Cancelled);
    assert_eq!(tasks[2].status, TaskStatus::Cancelled);
    assert!(results[1].is_none());
    assert_eq!(runner.progress().status, RunStatus::Cancelled);
}
