/*!
 * Segment data model.
 *
 * A segment is the smallest independently translatable unit extracted from a
 * document. Segments are created once at extraction time, mutated by the
 * translation pipeline, and only destroyed when a file is re-extracted.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Translation status for individual segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    /// Segment awaiting translation
    Pending,
    /// Segment currently being translated
    Processing,
    /// Segment has an AI translation
    Translated,
    /// Translation failed
    TranslationFailed,
    /// A reviewer finished reviewing the translation
    ReviewCompleted,
    /// Translation confirmed / signed off
    Confirmed,
    /// Segment was cancelled before translation
    Cancelled,
}

impl SegmentStatus {
    /// Whether this segment is eligible for a translation run.
    pub fn is_translatable(&self) -> bool {
        matches!(self, SegmentStatus::Pending | SegmentStatus::TranslationFailed)
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SegmentStatus::Pending => "pending",
            SegmentStatus::Processing => "processing",
            SegmentStatus::Translated => "translated",
            SegmentStatus::TranslationFailed => "translation_failed",
            SegmentStatus::ReviewCompleted => "review_completed",
            SegmentStatus::Confirmed => "confirmed",
            SegmentStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for SegmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SegmentStatus::Pending),
            "processing" => Ok(SegmentStatus::Processing),
            "translated" => Ok(SegmentStatus::Translated),
            "translation_failed" => Ok(SegmentStatus::TranslationFailed),
            "review_completed" => Ok(SegmentStatus::ReviewCompleted),
            "confirmed" => Ok(SegmentStatus::Confirmed),
            "cancelled" => Ok(SegmentStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid segment status: {}", s)),
        }
    }
}

/// Format-specific structural anchor, required for lossless round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// The original document's unit identifier (e.g. trans-unit id)
    pub unit_id: Option<String>,
    /// The original external state string, verbatim
    pub external_state: Option<String>,
}

/// Provenance of the last successful translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationMeta {
    /// Provider that produced the translation
    pub provider: String,
    /// Model that produced the translation
    pub model: String,
    /// Prompt tokens consumed, when reported
    pub prompt_tokens: Option<u64>,
    /// Completion tokens consumed, when reported
    pub completion_tokens: Option<u64>,
    /// Total tokens consumed, when reported
    pub total_tokens: Option<u64>,
    /// When the translation landed
    pub translated_at: DateTime<Utc>,
}

/// The unit of work for the translation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Unique segment identifier (UUID)
    pub id: String,
    /// File this segment belongs to
    pub file_id: String,
    /// Stable 0-based position in document order; never reassigned
    pub index: usize,
    /// Original text; immutable once extracted
    pub source_text: String,
    /// AI translation output
    pub translation: Option<String>,
    /// Post-review override; takes precedence over `translation` for export
    pub final_text: Option<String>,
    /// Current status
    pub status: SegmentStatus,
    /// Cached length of the source text
    pub source_length: usize,
    /// Cached length of the translation
    pub translated_length: Option<usize>,
    /// Structural anchor and original external state
    pub metadata: SegmentMetadata,
    /// Provenance of the last successful translation
    pub translation_meta: Option<TranslationMeta>,
    /// Last failure reason; cleared on success
    pub error: Option<String>,
}

impl Segment {
    /// Create a new pending segment at the given document position.
    pub fn new(file_id: impl Into<String>, index: usize, source_text: impl Into<String>) -> Self {
        let source_text = source_text.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_id: file_id.into(),
            index,
            source_length: source_text.chars().count(),
            source_text,
            translation: None,
            final_text: None,
            status: SegmentStatus::Pending,
            translated_length: None,
            metadata: SegmentMetadata::default(),
            translation_meta: None,
            error: None,
        }
    }

    /// Attach the structural anchor from the original document.
    pub fn with_anchor(mut self, unit_id: impl Into<String>) -> Self {
        self.metadata.unit_id = Some(unit_id.into());
        self
    }

    /// The text to write back into a document: `final_text` wins over
    /// `translation`; an untranslated segment exports as empty.
    pub fn export_text(&self) -> &str {
        self.final_text
            .as_deref()
            .or(self.translation.as_deref())
            .unwrap_or("")
    }
}

/// Aggregate state of a file, derived from its segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// The file has no segments
    Empty,
    /// No segment has a translation yet
    NotTranslated,
    /// Some segments are translated, some not
    PartiallyTranslated,
    /// Every segment is translated (or further along)
    Translated,
    /// At least one segment failed and none are left pending
    Failed,
}

/// Derive a file's aggregate status from its segment statuses.
///
/// Computed on read rather than stored, so it can never drift from the
/// per-segment truth.
pub fn aggregate_file_status(segments: &[Segment]) -> FileStatus {
    if segments.is_empty() {
        return FileStatus::Empty;
    }

    let translated = segments
        .iter()
        .filter(|s| {
            matches!(
                s.status,
                SegmentStatus::Translated | SegmentStatus::ReviewCompleted | SegmentStatus::Confirmed
            )
        })
        .count();
    let failed = segments
        .iter()
        .filter(|s| s.status == SegmentStatus::TranslationFailed)
        .count();
    let pending = segments
        .iter()
        .filter(|s| matches!(s.status, SegmentStatus::Pending | SegmentStatus::Processing))
        .count();

    if translated == segments.len() {
        FileStatus::Translated
    } else if translated > 0 {
        FileStatus::PartiallyTranslated
    } else if failed > 0 && pending == 0 {
        FileStatus::Failed
    } else {
        FileStatus::NotTranslated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_with_status(index: usize, status: SegmentStatus) -> Segment {
        let mut segment = Segment::new("file-1", index, format!("text {}", index));
        segment.status = status;
        segment
    }

    #[test]
    fn test_segmentStatus_roundTrip_shouldParseDisplayOutput() {
        for status in [
            SegmentStatus::Pending,
            SegmentStatus::Processing,
            SegmentStatus::Translated,
            SegmentStatus::TranslationFailed,
            SegmentStatus::ReviewCompleted,
            SegmentStatus::Confirmed,
            SegmentStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<SegmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_exportText_shouldPreferFinalTextOverTranslation() {
        let mut segment = Segment::new("file-1", 0, "Bonjour");
        assert_eq!(segment.export_text(), "");

        segment.translation = Some("Hello".to_string());
        assert_eq!(segment.export_text(), "Hello");

        segment.final_text = Some("Hello!".to_string());
        assert_eq!(segment.export_text(), "Hello!");
    }

    #[test]
    fn test_aggregateFileStatus_shouldDeriveFromSegments() {
        assert_eq!(aggregate_file_status(&[]), FileStatus::Empty);

        let pending = segment_with_status(0, SegmentStatus::Pending);
        let translated = segment_with_status(1, SegmentStatus::Translated);
        let failed = segment_with_status(2, SegmentStatus::TranslationFailed);
        let confirmed = segment_with_status(3, SegmentStatus::Confirmed);

        assert_eq!(
            aggregate_file_status(&[pending.clone()]),
            FileStatus::NotTranslated
        );
        assert_eq!(
            aggregate_file_status(&[pending.clone(), translated.clone()]),
            FileStatus::PartiallyTranslated
        );
        assert_eq!(
            aggregate_file_status(&[translated.clone(), confirmed]),
            FileStatus::Translated
        );
        assert_eq!(aggregate_file_status(&[failed.clone()]), FileStatus::Failed);
        assert_eq!(
            aggregate_file_status(&[failed, pending]),
            FileStatus::NotTranslated
        );
    }
}
