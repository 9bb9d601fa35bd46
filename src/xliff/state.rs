/*!
 * State vocabulary mapping.
 *
 * XLIFF carries unit state in two external vocabularies: the standard
 * `state` attribute on the `<target>` element, and (for the vendor
 * dialect) an `mq:status` attribute on the trans-unit itself. Both map
 * into the internal [`SegmentStatus`] through the fixed tables below;
 * the writer uses the inverse direction.
 */

use log::warn;

use crate::segment::SegmentStatus;

/// Map a standard `target/@state` value into the internal vocabulary.
///
/// A unit with no state but existing target text counts as translated;
/// an unrecognized state degrades to `Pending` with a warning rather
/// than failing the extraction.
pub fn from_generic(state: Option<&str>, has_target_text: bool) -> SegmentStatus {
    match state {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "new" | "needs-translation" => SegmentStatus::Pending,
            "translated" => SegmentStatus::Translated,
            v if v.starts_with("needs-review") => SegmentStatus::Translated,
            "reviewed" => SegmentStatus::ReviewCompleted,
            "signed-off" | "final" | "confirmed" => SegmentStatus::Confirmed,
            other => {
                warn!("Unrecognized target state '{}'; treating unit as pending", other);
                SegmentStatus::Pending
            }
        },
        None if has_target_text => SegmentStatus::Translated,
        None => SegmentStatus::Pending,
    }
}

/// Map a vendor `mq:status` value into the internal vocabulary.
pub fn from_vendor(state: &str) -> SegmentStatus {
    match state.to_ascii_lowercase().as_str() {
        "notstarted" | "rejected" => SegmentStatus::Pending,
        "machinetranslated" | "translated" | "edited" => SegmentStatus::Translated,
        "reviewed" => SegmentStatus::ReviewCompleted,
        "confirmed" | "proofread" => SegmentStatus::Confirmed,
        other => {
            warn!("Unrecognized vendor state '{}'; treating unit as pending", other);
            SegmentStatus::Pending
        }
    }
}

/// Inverse of [`from_generic`]: the `target/@state` value written for an
/// internal status.
pub fn to_generic(status: SegmentStatus) -> &'static str {
    match status {
        SegmentStatus::Pending | SegmentStatus::Cancelled => "new",
        SegmentStatus::Processing | SegmentStatus::TranslationFailed => "needs-translation",
        SegmentStatus::Translated => "translated",
        SegmentStatus::ReviewCompleted => "reviewed",
        SegmentStatus::Confirmed => "final",
    }
}

/// Inverse of [`from_vendor`]: the `mq:status` value written for an
/// internal status.
pub fn to_vendor(status: SegmentStatus) -> &'static str {
    match status {
        SegmentStatus::Pending
        | SegmentStatus::Cancelled
        | SegmentStatus::Processing
        | SegmentStatus::TranslationFailed => "NotStarted",
        SegmentStatus::Translated => "Translated",
        SegmentStatus::ReviewCompleted => "Reviewed",
        SegmentStatus::Confirmed => "Confirmed",
    }
}
