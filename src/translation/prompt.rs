/*!
 * Tagged prompt encoding and decoding.
 *
 * Multiple segments share one AI call by embedding positional markers:
 *
 * ```text
 * [SEG4]
 * First source text
 *
 * [SEG5]
 * Second source text
 * ```
 *
 * The response is expected to carry the same markers, each followed by the
 * translated text. Markers the model dropped are simply absent from the
 * decoded map; callers must treat missing entries as failures, not as
 * empty translations.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::language_utils;
use crate::segment::Segment;

// @const: Segment marker regex
static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[SEG(\d+)\]").unwrap());

/// Encoder/decoder for the tagged multi-segment wire format.
pub struct PromptCodec;

impl PromptCodec {
    /// Encode one segment as its tagged block.
    pub fn encode_segment(segment: &Segment) -> String {
        format!("[SEG{}]\n{}", segment.index, segment.source_text)
    }

    /// Encode a batch of segments into one prompt body.
    pub fn encode(batch: &[Segment]) -> String {
        batch
            .iter()
            .map(Self::encode_segment)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Decode a tagged response into an index → text map.
    ///
    /// For each `[SEG{n}]` marker the trailing text runs up to the next
    /// marker or end of string, trimmed. Duplicate markers keep the last
    /// occurrence.
    pub fn decode(response: &str) -> HashMap<usize, String> {
        let mut decoded = HashMap::new();
        let markers: Vec<_> = MARKER_REGEX.captures_iter(response).collect();

        for (position, capture) in markers.iter().enumerate() {
            let Ok(index) = capture[1].parse::<usize>() else {
                continue;
            };
            let start = capture.get(0).unwrap().end();
            let end = markers
                .get(position + 1)
                .map(|next| next.get(0).unwrap().start())
                .unwrap_or(response.len());
            decoded.insert(index, response[start..end].trim().to_string());
        }

        decoded
    }
}

/// Build the system prompt for a translation call.
///
/// Language names are rendered in English; models follow "Translate to
/// French" far more reliably than ISO codes. The marker instruction only
/// matters for batched prompts but is harmless for single-segment calls.
pub fn build_system_prompt(source_language: &str, target_language: &str) -> String {
    let source = language_utils::get_language_name(source_language)
        .unwrap_or_else(|_| source_language.to_string());
    let target = language_utils::get_language_name(target_language)
        .unwrap_or_else(|_| target_language.to_string());

    format!(
        "You are a professional translator. Translate the following text from {} to {}. \
         The input contains numbered blocks, each introduced by a marker like [SEG0]. \
         Reproduce every marker exactly as given, each followed by the translation of its block. \
         Preserve all inline markup tags unchanged. \
         Only respond with the markers and translated text, without any explanations or notes.",
        source, target
    )
}
