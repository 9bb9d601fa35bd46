/*!
 * Token-bounded batch planning.
 *
 * Greedy, order-preserving bin packing: segments are taken in document
 * order and appended to the current batch while the running token total
 * (seeded with the system prompt's cost) stays within the budget. Document
 * order affects cross-segment context, so it is never reshuffled, within
 * or across batches.
 */

use log::{debug, error};

use crate::segment::Segment;

use super::prompt::PromptCodec;
use super::tokens::TokenEstimator;

/// One planned batch with its estimated input cost.
#[derive(Debug, Clone)]
pub struct SegmentBatch {
    /// Member segments, in document order
    pub segments: Vec<Segment>,
    /// Estimated input tokens including the system prompt
    pub estimated_tokens: usize,
}

/// Result of planning a translation run.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    /// Token-bounded batches, in document order
    pub batches: Vec<SegmentBatch>,
    /// Segments whose own cost exceeds the budget even alone; these are
    /// dropped from the run, not split and not retried
    pub oversized: Vec<Segment>,
}

impl BatchPlan {
    /// Total number of segments across all batches.
    pub fn planned_count(&self) -> usize {
        self.batches.iter().map(|b| b.segments.len()).sum()
    }
}

/// Planner that groups ordered segments into token-bounded batches.
#[derive(Debug)]
pub struct BatchPlanner {
    estimator: TokenEstimator,
}

impl BatchPlanner {
    /// Create a planner using the given estimator.
    pub fn new(estimator: TokenEstimator) -> Self {
        Self { estimator }
    }

    /// Plan batches for the given ordered segments.
    ///
    /// `max_input_tokens` bounds each batch's estimated total: system
    /// prompt plus the encoded blocks of its members.
    pub fn plan(
        &self,
        ordered_segments: &[Segment],
        system_prompt: &str,
        max_input_tokens: usize,
    ) -> BatchPlan {
        let system_tokens = self.estimator.estimate(system_prompt);
        let mut plan = BatchPlan::default();
        let mut current: Vec<Segment> = Vec::new();
        let mut running = system_tokens;

        for segment in ordered_segments {
            let segment_tokens = self.estimator.estimate(&PromptCodec::encode_segment(segment));

            // A segment that cannot fit even in an empty batch is dropped
            // from the run entirely.
            if system_tokens + segment_tokens > max_input_tokens {
                error!(
                    "Segment {} of file {} needs {} tokens on its own (budget {}); dropping it from the plan",
                    segment.index, segment.file_id, system_tokens + segment_tokens, max_input_tokens
                );
                plan.oversized.push(segment.clone());
                continue;
            }

            if running + segment_tokens > max_input_tokens && !current.is_empty() {
                plan.batches.push(SegmentBatch {
                    segments: std::mem::take(&mut current),
                    estimated_tokens: running,
                });
                running = system_tokens;
            }

            running += segment_tokens;
            current.push(segment.clone());
        }

        if !current.is_empty() {
            plan.batches.push(SegmentBatch {
                segments: current,
                estimated_tokens: running,
            });
        }

        debug!(
            "Planned {} batches covering {} segments ({} oversized dropped)",
            plan.batches.len(),
            plan.planned_count(),
            plan.oversized.len()
        );
        plan
    }
}
