/*!
 * Document export.
 *
 * Routes to the format's writer when one exists; formats without
 * full-fidelity reconstruction fall back to a plain-text export with
 * segments joined by blank lines.
 */

use log::info;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::errors::AppError;
use crate::segment::Segment;
use crate::xliff::{self, WriteOptions};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// XLIFF 1.2; full-fidelity write-back
    Xliff,
    /// Anything else; plain-text fallback only
    PlainText,
}

impl FileFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("xlf") | Some("xliff") => FileFormat::Xliff,
            _ => FileFormat::PlainText,
        }
    }
}

/// Export translated segments to a target path.
///
/// For XLIFF the original document is required and only targeted units
/// are touched. The plain-text fallback writes `final_text`, or the
/// translation, or the source when neither exists, in document order.
pub fn export_document(
    segments: &[Segment],
    format: FileFormat,
    original_path: Option<&Path>,
    target_path: impl AsRef<Path>,
) -> Result<(), AppError> {
    let target_path = target_path.as_ref();
    match format {
        FileFormat::Xliff => {
            let original = original_path.ok_or_else(|| {
                AppError::File("XLIFF export needs the original document".to_string())
            })?;
            let report =
                xliff::write_translations(segments, original, target_path, &WriteOptions::default())?;
            info!(
                "Exported {} units to {:?} ({} skipped)",
                report.written, target_path, report.skipped
            );
            Ok(())
        }
        FileFormat::PlainText => {
            let mut ordered: Vec<&Segment> = segments.iter().collect();
            ordered.sort_by_key(|s| s.index);

            if let Some(parent) = target_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut file = File::create(target_path)?;
            let body = ordered
                .iter()
                .map(|segment| {
                    let text = segment.export_text();
                    if text.is_empty() {
                        segment.source_text.as_str()
                    } else {
                        text
                    }
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            file.write_all(body.as_bytes())?;
            info!("Exported {} segments as plain text to {:?}", ordered.len(), target_path);
            Ok(())
        }
    }
}
