/*!
 * Tests for token-bounded batch planning.
 */

use doctran::segment::Segment;
use doctran::translation::{BatchPlanner, TokenEstimator};

fn segments(count: usize, words_each: usize) -> Vec<Segment> {
    (0..count)
        .map(|index| {
            let text = format!("word{} ", index).repeat(words_each);
            Segment::new("file-1", index, text.trim().to_string())
        })
        .collect()
}

fn planner() -> BatchPlanner {
    BatchPlanner::new(TokenEstimator::default())
}

const SYSTEM_PROMPT: &str = "Translate every block and keep the markers.";

#[test]
fn test_plan_batchCoverage_unionShouldEqualInputMinusOversized() {
    let mut input = segments(12, 6);
    // Make one segment impossible to fit
    input[5].source_text = "jumbo ".repeat(3000);

    let plan = planner().plan(&input, SYSTEM_PROMPT, 300);

    let mut covered: Vec<usize> = plan
        .batches
        .iter()
        .flat_map(|b| b.segments.iter().map(|s| s.index))
        .chain(plan.oversized.iter().map(|s| s.index))
        .collect();
    covered.sort_unstable();
    assert_eq!(covered, (0..12).collect::<Vec<_>>());
    assert_eq!(plan.oversized.len(), 1);
    assert_eq!(plan.oversized[0].index, 5);
}

#[test]
fn test_plan_tokenBound_noBatchShouldExceedBudget() {
    let input = segments(30, 8);
    let max = 200;
    let plan = planner().plan(&input, SYSTEM_PROMPT, max);

    assert!(plan.batches.len() > 1, "expected the budget to force a split");
    for batch in &plan.batches {
        assert!(batch.estimated_tokens <= max);
        assert!(!batch.segments.is_empty());
    }
}

#[test]
fn test_plan_orderShouldSurviveAcrossBatchBoundaries() {
    let input = segments(20, 10);
    let plan = planner().plan(&input, SYSTEM_PROMPT, 150);

    let flattened: Vec<usize> = plan
        .batches
        .iter()
        .flat_map(|b| b.segments.iter().map(|s| s.index))
        .collect();
    let mut sorted = flattened.clone();
    sorted.sort_unstable();
    assert_eq!(flattened, sorted, "document order must never be reshuffled");
}

#[test]
fn test_plan_generousBudget_shouldYieldSingleBatch() {
    let input = segments(5, 3);
    let plan = planner().plan(&input, SYSTEM_PROMPT, 100_000);
    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].segments.len(), 5);
}
