//! Text extraction for uploaded files.
//!
//! Supports three upload kinds, dispatched on the file extension:
//!
//! - `.pdf` — per-page text extraction via `lopdf`
//! - `.txt` — UTF-8 decode
//! - `.json` — the top-level `content` string field

use lopdf::Document as PdfDocument;
use tracing::{debug, warn};

use crate::error::{RagError, Result};

/// Extract the textual content of an uploaded file.
///
/// The file kind is determined by the extension of `filename`
/// (case-insensitive). Any other extension fails with
/// [`RagError::UnsupportedFileType`].
///
/// # Errors
///
/// - [`RagError::UnsupportedFileType`] for unknown extensions.
/// - [`RagError::Extract`] when a `.pdf` cannot be parsed at all or a
///   `.txt` is not valid UTF-8.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String> {
    match extension(filename).as_deref() {
        Some("pdf") => extract_pdf(filename, bytes),
        Some("txt") => extract_txt(filename, bytes),
        Some("json") => extract_json(filename, bytes),
        other => Err(RagError::UnsupportedFileType {
            extension: other.unwrap_or_default().to_string(),
        }),
    }
}

fn extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Concatenate the text of every page. A page whose extraction fails
/// contributes an empty string rather than failing the document.
fn extract_pdf(filename: &str, bytes: &[u8]) -> Result<String> {
    let doc = PdfDocument::load_mem(bytes).map_err(|e| RagError::Extract {
        filename: filename.to_string(),
        message: format!("invalid PDF: {e}"),
    })?;

    let mut text = String::new();
    for (page_number, _) in doc.get_pages() {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                warn!(filename, page_number, error = %e, "skipping unextractable PDF page");
            }
        }
    }

    debug!(filename, text_len = text.len(), "extracted PDF text");
    Ok(text)
}

fn extract_txt(filename: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| RagError::Extract {
        filename: filename.to_string(),
        message: format!("not valid UTF-8: {e}"),
    })
}

/// Read the top-level `content` string field; a missing or non-string
/// field yields an empty document rather than an error.
fn extract_json(filename: &str, bytes: &[u8]) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| RagError::Extract {
            filename: filename.to_string(),
            message: format!("invalid JSON: {e}"),
        })?;

    Ok(value
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string())
}
