/*!
 * XLIFF translation write-back.
 *
 * Streams the original document and rewrites only the trans-units whose
 * anchor matches a segment; every other event passes through untouched,
 * which is what preserves the document's formatting. The internal status
 * maps back to the standard vocabulary on `target/@state`, and to the
 * vendor vocabulary on the unit's own `mq:status` attribute when the
 * vendor dialect is enabled.
 */

use log::warn;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::errors::ExtractionError;
use crate::segment::Segment;

use super::state;
use super::{attribute_value, is_safe_anchor, ID_ATTR, SOURCE_TAG, TARGET_TAG, UNIT_TAG};

/// Options for one write-back.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Also write the vendor state attribute on each unit
    pub vendor_dialect: bool,
}

impl WriteOptions {
    /// Enable the vendor dialect.
    pub fn with_vendor_dialect(mut self) -> Self {
        self.vendor_dialect = true;
        self
    }
}

/// What happened during a write-back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Units rewritten with a translation
    pub written: usize,
    /// Segments skipped (missing/unsafe anchor, or anchor not found)
    pub skipped: usize,
}

/// Write translated segments back into a document on disk.
pub fn write_translations(
    segments: &[Segment],
    original_path: impl AsRef<Path>,
    target_path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<WriteReport, ExtractionError> {
    let content = fs::read_to_string(original_path)?;
    let (output, report) = write_to_string(&content, segments, options)?;
    if let Some(parent) = target_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(target_path, output)?;
    Ok(report)
}

/// Write translated segments back into document content.
pub fn write_to_string(
    content: &str,
    segments: &[Segment],
    options: &WriteOptions,
) -> Result<(String, WriteReport), ExtractionError> {
    let mut report = WriteReport::default();

    // Anchor → segment lookup; unusable anchors are skipped up front.
    let mut by_anchor: HashMap<&str, &Segment> = HashMap::new();
    for segment in segments {
        match segment.metadata.unit_id.as_deref() {
            Some(anchor) if is_safe_anchor(anchor) => {
                by_anchor.insert(anchor, segment);
            }
            Some(anchor) => {
                warn!(
                    "Skipping segment {}: anchor '{}' is not safe for lookup",
                    segment.index, anchor
                );
                report.skipped += 1;
            }
            None => {
                warn!("Skipping segment {}: no structural anchor", segment.index);
                report.skipped += 1;
            }
        }
    }

    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::new());
    let mut used: HashSet<String> = HashSet::new();

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
            Ok(Event::Start(start)) if start.local_name().as_ref() == UNIT_TAG => {
                let anchor = attribute_value(&start, ID_ATTR)?;
                let segment = anchor.as_deref().and_then(|id| by_anchor.get(id).copied());
                match segment {
                    Some(segment) => {
                        let events = buffer_unit(&mut reader, Event::Start(start.into_owned()))?;
                        for event in transform_unit(events, segment, options) {
                            write_event(&mut writer, event)?;
                        }
                        used.insert(anchor.unwrap_or_default());
                        report.written += 1;
                    }
                    None => {
                        write_event(&mut writer, Event::Start(start))?;
                    }
                }
            }
            Ok(event) => write_event(&mut writer, event)?,
        }
    }

    // Segments whose anchor never matched a unit
    for (anchor, segment) in &by_anchor {
        if !used.contains(*anchor) {
            warn!(
                "Segment {} anchor '{}' matched no unit in the document",
                segment.index, anchor
            );
            report.skipped += 1;
        }
    }

    let bytes = writer.into_inner();
    let output = String::from_utf8(bytes)
        .map_err(|e| ExtractionError::Structural(format!("output is not valid UTF-8: {}", e)))?;
    Ok((output, report))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ExtractionError> {
    writer
        .write_event(event)
        .map_err(|e| ExtractionError::Structural(format!("failed to write event: {}", e)))
}

/// Collect the events of one trans-unit, including its start and end.
fn buffer_unit(
    reader: &mut Reader<&[u8]>,
    first: Event<'static>,
) -> Result<Vec<Event<'static>>, ExtractionError> {
    let mut events = vec![first];
    let mut depth = 1usize;
    loop {
        match reader.read_event() {
            Err(e) => return Err(ExtractionError::Structural(e.to_string())),
            Ok(Event::Eof) => {
                return Err(ExtractionError::Structural(
                    "unexpected end of document inside trans-unit".to_string(),
                ));
            }
            Ok(event) => {
                match &event {
                    Event::Start(start) if start.local_name().as_ref() == UNIT_TAG => depth += 1,
                    Event::End(end) if end.local_name().as_ref() == UNIT_TAG => depth -= 1,
                    _ => {}
                }
                let done = depth == 0;
                events.push(event.into_owned());
                if done {
                    break;
                }
            }
        }
    }
    Ok(events)
}

/// Rebuild a start element with one attribute set (replacing any existing
/// occurrence of it).
fn with_attribute(start: &BytesStart<'_>, key: &str, value: &str) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut rebuilt = BytesStart::new(name);
    for attr in start.attributes().flatten() {
        if attr.key.as_ref() != key.as_bytes() {
            rebuilt.push_attribute(attr);
        }
    }
    rebuilt.push_attribute((key, value));
    rebuilt.into_owned()
}

/// The events that make up the new target content.
///
/// The translation is parsed as a markup fragment so inline tags survive
/// re-import; a text that is not a well-formed fragment degrades to one
/// escaped text node.
fn content_events(segment: &Segment) -> Vec<Event<'static>> {
    let text = segment.export_text();
    if text.is_empty() {
        return Vec::new();
    }
    match parse_fragment(text) {
        Ok(events) => events,
        Err(reason) => {
            warn!(
                "Translation for unit {:?} is not a well-formed fragment ({}); writing plain text",
                segment.metadata.unit_id, reason
            );
            vec![Event::Text(BytesText::new(text).into_owned())]
        }
    }
}

/// Parse a markup fragment into a balanced event sequence.
fn parse_fragment(text: &str) -> Result<Vec<Event<'static>>, String> {
    let mut reader = Reader::from_str(text);
    let mut events = Vec::new();
    let mut depth = 0i64;
    loop {
        match reader.read_event() {
            Err(e) => return Err(e.to_string()),
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                depth += 1;
                events.push(Event::Start(start.into_owned()));
            }
            Ok(Event::End(end)) => {
                depth -= 1;
                if depth < 0 {
                    return Err("unbalanced closing tag".to_string());
                }
                events.push(Event::End(end.into_owned()));
            }
            Ok(Event::Text(text)) => {
                // Reject bare ampersands and broken entities up front
                text.unescape().map_err(|e| e.to_string())?;
                events.push(Event::Text(text.into_owned()));
            }
            Ok(event) => events.push(event.into_owned()),
        }
    }
    if depth != 0 {
        return Err("unbalanced opening tag".to_string());
    }
    Ok(events)
}

fn is_whitespace_text(event: &Event<'_>) -> bool {
    match event {
        Event::Text(text) => String::from_utf8_lossy(text).trim().is_empty(),
        _ => false,
    }
}

/// Rewrite one buffered trans-unit with the segment's translation.
fn transform_unit(
    events: Vec<Event<'static>>,
    segment: &Segment,
    options: &WriteOptions,
) -> Vec<Event<'static>> {
    let generic_state = state::to_generic(segment.status);
    let mut out: Vec<Event<'static>> = Vec::with_capacity(events.len() + 4);

    // Unit start: the vendor state lives on the unit itself
    match &events[0] {
        Event::Start(start) if options.vendor_dialect => {
            out.push(Event::Start(with_attribute(
                start,
                "mq:status",
                state::to_vendor(segment.status),
            )));
        }
        first => out.push(first.clone()),
    }

    let content = content_events(segment);

    // Existing target, if any
    let target_pos = events.iter().enumerate().skip(1).find_map(|(i, e)| match e {
        Event::Start(s) if s.local_name().as_ref() == TARGET_TAG => Some(i),
        Event::Empty(s) if s.local_name().as_ref() == TARGET_TAG => Some(i),
        _ => None,
    });

    if let Some(t) = target_pos {
        out.extend(events[1..t].iter().cloned());
        match &events[t] {
            Event::Start(start) => {
                out.push(Event::Start(with_attribute(start, "state", generic_state)));
                out.extend(content);
                // Drop the old content up to the matching end tag
                let mut depth = 1usize;
                let mut j = t + 1;
                while j < events.len() {
                    match &events[j] {
                        Event::Start(_) => depth += 1,
                        Event::End(end) => {
                            depth -= 1;
                            if depth == 0 && end.local_name().as_ref() == TARGET_TAG {
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                if j < events.len() {
                    out.push(events[j].clone());
                    out.extend(events[j + 1..].iter().cloned());
                }
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                out.push(Event::Start(with_attribute(start, "state", generic_state)));
                out.extend(content);
                out.push(Event::End(BytesEnd::new(name)));
                out.extend(events[t + 1..].iter().cloned());
            }
            _ => {}
        }
        return out;
    }

    // No target yet: create one immediately after the source element,
    // dropping any placeholder comment sitting in that position.
    let source_end = events.iter().enumerate().skip(1).find_map(|(i, e)| match e {
        Event::End(end) if end.local_name().as_ref() == SOURCE_TAG => Some(i),
        Event::Empty(s) if s.local_name().as_ref() == SOURCE_TAG => Some(i),
        _ => None,
    });

    let mut target = BytesStart::new("target");
    target.push_attribute(("state", generic_state));

    match source_end {
        Some(se) => {
            out.extend(events[1..=se].iter().cloned());
            out.push(Event::Start(target));
            out.extend(content);
            out.push(Event::End(BytesEnd::new("target")));

            // Skip an immediately following placeholder comment, keeping
            // any whitespace around it
            let mut rest = se + 1;
            let mut lookahead = rest;
            while lookahead < events.len() {
                match &events[lookahead] {
                    event if is_whitespace_text(event) => lookahead += 1,
                    Event::Comment(_) => {
                        out.extend(events[rest..lookahead].iter().cloned());
                        rest = lookahead + 1;
                        break;
                    }
                    _ => break,
                }
            }
            out.extend(events[rest..].iter().cloned());
        }
        None => {
            // No source either; append the target just before the unit end
            let last = events.len() - 1;
            out.extend(events[1..last].iter().cloned());
            out.push(Event::Start(target));
            out.extend(content);
            out.push(Event::End(BytesEnd::new("target")));
            out.push(events[last].clone());
        }
    }

    out
}
