//! Text of attached full-text documents.
//!
//! PDFs go through `pdf-extract`; anything else is read as UTF-8 text.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use crate::error::ImportError;

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Extract the text layer of a PDF held in memory.
///
/// # Errors
///
/// Returns `ImportError::Pdf` when the document cannot be read or has no
/// text layer.
pub fn pdf_text(bytes: &[u8]) -> Result<String, ImportError> {
    // The extractor panics on some malformed documents.
    let extracted = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| ImportError::Pdf("document could not be decoded".into()))?
        .map_err(|e| ImportError::Pdf(format!("{e:?}")))?;
    let text = extracted.trim();
    if text.is_empty() {
        return Err(ImportError::Pdf("no text layer".into()));
    }
    Ok(text.to_string())
}

/// Read the text of a full-text document: PDFs by extraction, other files
/// as UTF-8.
///
/// # Errors
///
/// Returns `ImportError::Io` if the file cannot be read and
/// `ImportError::Pdf` when a PDF yields no text.
pub fn read_text(path: &Path) -> Result<String, ImportError> {
    if is_pdf(path) {
        let bytes = std::fs::read(path)?;
        pdf_text(&bytes)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// [`read_text`] for attach time: a document that cannot be read is logged
/// and gives `None`, so the file is still attached without content.
#[must_use]
pub fn read_text_lenient(path: &Path) -> Option<String> {
    match read_text(path) {
        Ok(text) => {
            tracing::debug!(path = %path.display(), chars = text.len(), "full text extracted");
            Some(text)
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "full text not extracted");
            None
        }
    }
}
