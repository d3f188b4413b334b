//! Import error types for sift-import.

/// Errors that can occur while reading a bibliographic export or filling in
/// article text.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse failed for {format} at line {line}: {message}")]
    Parse {
        format: &'static str,
        line: usize,
        message: String,
    },

    #[error("PubMed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid PubMed URL {0}")]
    Url(String),

    #[error("PubMed returned unreadable XML: {0}")]
    Xml(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),
}
