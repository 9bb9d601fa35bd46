/*!
 * XLIFF 1.2 round-tripping.
 *
 * The extractor turns an XLIFF document into ordered segments; the writer
 * reconciles translated segments back into the original document. Both
 * stream quick-xml events, so untouched nodes and formatting survive the
 * round trip verbatim.
 *
 * See <https://docs.oasis-open.org/xliff/v1.2/os/xliff-core.html>
 */

use serde::{Deserialize, Serialize};

pub mod extractor;
pub mod state;
pub mod writer;

pub use extractor::{extract_from_str, extract_segments, ExtractOptions, ExtractionResult};
pub use writer::{write_to_string, write_translations, WriteOptions, WriteReport};

pub(crate) const UNIT_TAG: &[u8] = b"trans-unit";
pub(crate) const SOURCE_TAG: &[u8] = b"source";
pub(crate) const TARGET_TAG: &[u8] = b"target";
pub(crate) const FILE_TAG: &[u8] = b"file";
pub(crate) const BODY_TAG: &[u8] = b"body";
pub(crate) const STATE_ATTR: &[u8] = b"state";
pub(crate) const ID_ATTR: &[u8] = b"id";

/// Vendor dialect state attribute, carried on the trans-unit itself.
pub(crate) const VENDOR_STATE_ATTR: &[u8] = b"mq:status";

/// Document-level metadata captured from the `<file>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// The `original` attribute (source document name)
    pub original: Option<String>,
    /// Declared source language
    pub source_language: Option<String>,
    /// Declared target language
    pub target_language: Option<String>,
    /// Declared datatype
    pub datatype: Option<String>,
}

/// Translatable content of one unit.
///
/// Plain text and markup fragments are kept apart so that re-import can
/// parse fragments properly instead of string-concatenating XML.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineContent {
    /// Text with no inline elements, unescaped
    Plain(String),
    /// Serialized markup fragment: inline tags verbatim, text escaped
    Markup(String),
}

impl InlineContent {
    /// The string stored on the segment.
    pub fn into_text(self) -> String {
        match self {
            InlineContent::Plain(text) => text,
            InlineContent::Markup(fragment) => fragment,
        }
    }

    /// Whether there is any content at all.
    pub fn is_empty(&self) -> bool {
        match self {
            InlineContent::Plain(text) => text.trim().is_empty(),
            InlineContent::Markup(fragment) => fragment.trim().is_empty(),
        }
    }
}

/// Read one attribute value by key from an element start, unescaped.
pub(crate) fn attribute_value(
    start: &quick_xml::events::BytesStart<'_>,
    key: &[u8],
) -> Result<Option<String>, crate::errors::ExtractionError> {
    use crate::errors::ExtractionError;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ExtractionError::Structural(e.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| ExtractionError::Structural(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Whether an anchor can safely be used to look up a unit.
///
/// Anchors containing markup delimiters, quotes or control characters are
/// skipped by the writer rather than risking a corrupt lookup.
pub(crate) fn is_safe_anchor(anchor: &str) -> bool {
    !anchor.trim().is_empty()
        && !anchor
            .chars()
            .any(|c| matches!(c, '<' | '>' | '"' | '\'' | '&') || c.is_control())
}
