/*!
 * XLIFF segment extraction.
 *
 * Streams the document once and emits one segment per usable trans-unit,
 * assigning sequential indices in document order. Inline markup inside
 * `<source>` is preserved as a serialized fragment rather than flattened
 * to plain text.
 */

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

use crate::errors::ExtractionError;
use crate::segment::Segment;

use super::state;
use super::{
    attribute_value, DocumentMetadata, InlineContent, BODY_TAG, FILE_TAG, ID_ATTR, SOURCE_TAG,
    STATE_ATTR, TARGET_TAG, UNIT_TAG, VENDOR_STATE_ATTR,
};

/// Options for one extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// File id assigned to every extracted segment
    pub file_id: String,
    /// Honor the vendor attribute set (`mq:status` on the unit)
    pub vendor_dialect: bool,
}

impl ExtractOptions {
    /// Options for a file id, standard dialect.
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            vendor_dialect: false,
        }
    }

    /// Enable the vendor dialect.
    pub fn with_vendor_dialect(mut self) -> Self {
        self.vendor_dialect = true;
        self
    }
}

/// Result of one extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted segments, indexed in document order
    pub segments: Vec<Segment>,
    /// Document-level metadata from the `<file>` element
    pub metadata: DocumentMetadata,
    /// Number of extracted segments
    pub segment_count: usize,
}

/// Everything captured from one trans-unit before validation.
#[derive(Debug, Default)]
struct RawUnit {
    id: Option<String>,
    vendor_state: Option<String>,
    source: Option<InlineContent>,
    target_text: Option<String>,
    target_state: Option<String>,
}

/// Extract segments from an XLIFF file on disk.
pub fn extract_segments(
    path: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractionError> {
    let content = fs::read_to_string(path)?;
    extract_from_str(&content, options)
}

/// Extract segments from XLIFF content.
pub fn extract_from_str(
    content: &str,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractionError> {
    let mut reader = Reader::from_str(content);
    let mut segments: Vec<Segment> = Vec::new();
    let mut metadata = DocumentMetadata::default();
    let mut saw_file = false;
    let mut saw_body = false;

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(ExtractionError::Structural(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                let local = start.local_name();
                if local.as_ref() == FILE_TAG {
                    saw_file = true;
                    metadata = read_file_metadata(&start)?;
                } else if local.as_ref() == BODY_TAG {
                    saw_body = true;
                } else if local.as_ref() == UNIT_TAG {
                    let unit = read_unit(&mut reader, &start)?;
                    finalize_unit(unit, options, &mut segments);
                }
            }
            Ok(Event::Empty(start)) => {
                let local = start.local_name();
                if local.as_ref() == FILE_TAG {
                    saw_file = true;
                    metadata = read_file_metadata(&start)?;
                } else if local.as_ref() == BODY_TAG {
                    saw_body = true;
                }
            }
            Ok(_) => {}
        }
    }

    if !saw_file || !saw_body {
        return Err(ExtractionError::Structural(
            "document has no file/body structure".to_string(),
        ));
    }

    Ok(ExtractionResult {
        segment_count: segments.len(),
        segments,
        metadata,
    })
}

/// Read the `<file>` element attributes.
fn read_file_metadata(start: &BytesStart<'_>) -> Result<DocumentMetadata, ExtractionError> {
    let mut metadata = DocumentMetadata::default();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ExtractionError::Structural(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| ExtractionError::Structural(e.to_string()))?
            .into_owned();
        match attr.key.as_ref() {
            b"original" => metadata.original = Some(value),
            b"source-language" => metadata.source_language = Some(value),
            b"target-language" => metadata.target_language = Some(value),
            b"datatype" => metadata.datatype = Some(value),
            _ => {}
        }
    }
    Ok(metadata)
}

/// Read the remainder of one trans-unit.
fn read_unit(
    reader: &mut Reader<&[u8]>,
    unit_start: &BytesStart<'_>,
) -> Result<RawUnit, ExtractionError> {
    let mut unit = RawUnit {
        id: attribute_value(unit_start, ID_ATTR)?,
        vendor_state: attribute_value(unit_start, VENDOR_STATE_ATTR)?,
        ..Default::default()
    };

    loop {
        match reader.read_event() {
            Err(e) => return Err(ExtractionError::Structural(e.to_string())),
            Ok(Event::Eof) => {
                return Err(ExtractionError::Structural(
                    "unexpected end of document inside trans-unit".to_string(),
                ));
            }
            Ok(Event::Start(start)) => {
                let local = start.local_name();
                if local.as_ref() == SOURCE_TAG {
                    unit.source = Some(capture_inline(reader)?);
                } else if local.as_ref() == TARGET_TAG {
                    unit.target_state = attribute_value(&start, STATE_ATTR)?;
                    unit.target_text = Some(capture_inline(reader)?.into_text());
                }
            }
            Ok(Event::Empty(start)) => {
                let local = start.local_name();
                if local.as_ref() == SOURCE_TAG {
                    unit.source = Some(InlineContent::Plain(String::new()));
                } else if local.as_ref() == TARGET_TAG {
                    unit.target_state = attribute_value(&start, STATE_ATTR)?;
                    unit.target_text = Some(String::new());
                }
            }
            Ok(Event::End(end)) => {
                if end.local_name().as_ref() == UNIT_TAG {
                    return Ok(unit);
                }
            }
            Ok(_) => {}
        }
    }
}

/// Capture the content of the element just opened, preserving inline
/// markup as a serialized fragment.
fn capture_inline(reader: &mut Reader<&[u8]>) -> Result<InlineContent, ExtractionError> {
    let mut raw = String::new();
    let mut plain = String::new();
    let mut has_markup = false;
    let mut depth = 1usize;

    loop {
        match reader.read_event() {
            Err(e) => return Err(ExtractionError::Structural(e.to_string())),
            Ok(Event::Eof) => {
                return Err(ExtractionError::Structural(
                    "unexpected end of document inside element content".to_string(),
                ));
            }
            Ok(Event::Start(start)) => {
                depth += 1;
                has_markup = true;
                raw.push('<');
                raw.push_str(&String::from_utf8_lossy(&start));
                raw.push('>');
            }
            Ok(Event::Empty(start)) => {
                has_markup = true;
                raw.push('<');
                raw.push_str(&String::from_utf8_lossy(&start));
                raw.push_str("/>");
            }
            Ok(Event::End(end)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                raw.push_str("</");
                raw.push_str(&String::from_utf8_lossy(end.name().as_ref()));
                raw.push('>');
            }
            Ok(Event::Text(text)) => {
                raw.push_str(&String::from_utf8_lossy(&text));
                plain.push_str(
                    &text
                        .unescape()
                        .map_err(|e| ExtractionError::Structural(e.to_string()))?,
                );
            }
            Ok(Event::CData(cdata)) => {
                let content = String::from_utf8_lossy(&cdata).into_owned();
                raw.push_str("<![CDATA[");
                raw.push_str(&content);
                raw.push_str("]]>");
                plain.push_str(&content);
            }
            // Comments and PIs inside content are not translatable
            Ok(_) => {}
        }
    }

    if has_markup {
        Ok(InlineContent::Markup(raw))
    } else {
        Ok(InlineContent::Plain(plain))
    }
}

/// Turn a raw unit into a segment, or skip it with a warning.
fn finalize_unit(unit: RawUnit, options: &ExtractOptions, segments: &mut Vec<Segment>) {
    let Some(id) = unit.id else {
        warn!("Skipping trans-unit without an id attribute");
        return;
    };
    let source = match unit.source {
        Some(content) if !content.is_empty() => content,
        _ => {
            warn!("Skipping unit '{}' with no source text", id);
            return;
        }
    };

    let has_target = unit
        .target_text
        .as_deref()
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    let status = if options.vendor_dialect && unit.vendor_state.is_some() {
        state::from_vendor(unit.vendor_state.as_deref().unwrap())
    } else {
        state::from_generic(unit.target_state.as_deref(), has_target)
    };

    let index = segments.len();
    let mut segment =
        Segment::new(&options.file_id, index, source.into_text()).with_anchor(&id);
    segment.status = status;
    segment.metadata.external_state = if options.vendor_dialect {
        unit.vendor_state.or(unit.target_state)
    } else {
        unit.target_state
    };
    if has_target {
        let target_text = unit.target_text.unwrap_or_default();
        segment.translated_length = Some(target_text.chars().count());
        segment.translation = Some(target_text);
    }
    segments.push(segment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentStatus;

    const SIMPLE_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file original="hello.txt" source-language="en" target-language="fr" datatype="plaintext">
    <body>
      <trans-unit id="u1">
        <source>Hello</source>
        <target state="translated">Bonjour</target>
      </trans-unit>
      <trans-unit id="u2">
        <source>World</source>
      </trans-unit>
    </body>
  </file>
</xliff>"#;

    fn options() -> ExtractOptions {
        ExtractOptions::new("file-1")
    }

    #[test]
    fn test_extract_should_map_states_and_assign_indices() {
        let result = extract_from_str(SIMPLE_DOC, &options()).unwrap();
        assert_eq!(result.segment_count, 2);

        let first = &result.segments[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.source_text, "Hello");
        assert_eq!(first.status, SegmentStatus::Translated);
        assert_eq!(first.translation.as_deref(), Some("Bonjour"));
        assert_eq!(first.metadata.unit_id.as_deref(), Some("u1"));
        assert_eq!(first.metadata.external_state.as_deref(), Some("translated"));

        let second = &result.segments[1];
        assert_eq!(second.index, 1);
        assert_eq!(second.status, SegmentStatus::Pending);
        assert!(second.translation.is_none());

        assert_eq!(result.metadata.source_language.as_deref(), Some("en"));
        assert_eq!(result.metadata.original.as_deref(), Some("hello.txt"));
    }

    #[test]
    fn test_extract_should_preserve_inline_markup() {
        let doc = r#"<?xml version="1.0"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file source-language="en" datatype="html"><body>
    <trans-unit id="u1">
      <source>Click <g id="1">here</g> or press <x id="2"/> now</source>
    </trans-unit>
  </body></file>
</xliff>"#;
        let result = extract_from_str(doc, &options()).unwrap();
        assert_eq!(
            result.segments[0].source_text,
            r#"Click <g id="1">here</g> or press <x id="2"/> now"#
        );
    }

    #[test]
    fn test_extract_should_skip_units_without_id_or_source() {
        let doc = r#"<?xml version="1.0"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file source-language="en" datatype="plaintext"><body>
    <trans-unit>
      <source>No id here</source>
    </trans-unit>
    <trans-unit id="empty">
      <source>   </source>
    </trans-unit>
    <trans-unit id="ok">
      <source>Usable</source>
    </trans-unit>
  </body></file>
</xliff>"#;
        let result = extract_from_str(doc, &options()).unwrap();
        assert_eq!(result.segment_count, 1);
        assert_eq!(result.segments[0].metadata.unit_id.as_deref(), Some("ok"));
        // Indices are assigned in document order over kept units only
        assert_eq!(result.segments[0].index, 0);
    }

    #[test]
    fn test_extract_should_fail_without_file_body_structure() {
        let doc = r#"<?xml version="1.0"?><xliff version="1.2"><other/></xliff>"#;
        let result = extract_from_str(doc, &options());
        assert!(matches!(result, Err(ExtractionError::Structural(_))));
    }

    #[test]
    fn test_extract_should_fail_on_malformed_xml() {
        let doc = "<xliff><file><body><trans-unit id='u1'><source>text";
        let result = extract_from_str(doc, &options());
        assert!(matches!(result, Err(ExtractionError::Structural(_))));
    }

    #[test]
    fn test_extract_vendor_dialect_should_prefer_unit_state() {
        let doc = r#"<?xml version="1.0"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2" xmlns:mq="urn:example:vendor">
  <file source-language="en" datatype="plaintext"><body>
    <trans-unit id="u1" mq:status="Confirmed">
      <source>Hello</source>
      <target state="translated">Bonjour</target>
    </trans-unit>
  </body></file>
</xliff>"#;
        let standard = extract_from_str(doc, &options()).unwrap();
        assert_eq!(standard.segments[0].status, SegmentStatus::Translated);

        let vendor = extract_from_str(doc, &options().with_vendor_dialect()).unwrap();
        assert_eq!(vendor.segments[0].status, SegmentStatus::Confirmed);
        assert_eq!(
            vendor.segments[0].metadata.external_state.as_deref(),
            Some("Confirmed")
        );
    }
}
