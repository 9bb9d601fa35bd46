/*!
 * Token estimation.
 *
 * Batch planning needs a cheap, deterministic estimate of how many model
 * tokens a string costs. We use a tiktoken BPE for the configured model;
 * unknown model ids fall back to the cl100k_base encoding, and if no
 * encoder can be built at all the estimate degrades to ceil(chars / 4).
 */

use log::warn;
use std::sync::Arc;
use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};

/// Token estimator calibrated to a model family.
///
/// The encoder is resolved once at construction; `estimate` is a single
/// encode call, cheap enough for once-per-segment use.
#[derive(Clone)]
pub struct TokenEstimator {
    bpe: Option<Arc<CoreBPE>>,
}

impl TokenEstimator {
    /// Build an estimator for the given model hint.
    pub fn for_model(model_hint: &str) -> Self {
        let bpe = match get_bpe_from_model(model_hint) {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(_) => match cl100k_base() {
                Ok(bpe) => Some(Arc::new(bpe)),
                Err(e) => {
                    warn!(
                        "No tokenizer available for model '{}' ({}); falling back to character heuristic",
                        model_hint, e
                    );
                    None
                }
            },
        };
        Self { bpe }
    }

    /// Estimate the token cost of a string.
    pub fn estimate(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.chars().count().div_ceil(4),
        }
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::for_model("gpt-4o-mini")
    }
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("bpe", &self.bpe.as_ref().map(|_| "CoreBPE"))
            .finish()
    }
}
