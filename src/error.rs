//! Error types for the fabparts-import library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ImportError`] is fatal: the import cannot proceed at all
//!   (unsupported file type, no PDF engine, unreadable document). Returned as
//!   `Err(ImportError)` from the top-level `import*` and `extract*` functions.
//!
//! * [`PageError`] is non-fatal: a single page could not be rendered or
//!   recognised, but the remaining pages are fine. Recorded in
//!   [`crate::import::ExtractionReport::failed_pages`] and replaced inline by
//!   a placeholder line so parsing still runs over everything else.
//!
//! Parsing itself never fails. An input with no recognisable parts produces an
//! empty record list, not an error.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the fabparts-import library.
#[derive(Debug, Error)]
pub enum ImportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file extension is not one of `.pdf`, `.txt`, `.text`, `.csv`.
    #[error("Unsupported file type '{name}'\nAccepted: .pdf, .txt, .text, .csv")]
    UnsupportedFormat { name: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// A required text-layer or OCR collaborator is missing from the runtime.
    #[error("{collaborator} is not available: {detail}")]
    ExtractionUnavailable { collaborator: String, detail: String },

    /// No collaborator could produce usable output for the document.
    #[error("Could not extract text from '{name}': {detail}")]
    ExtractionFailed { name: String, detail: String },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none (or a wrong one) was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// The caller raised the cancel flag while extraction was running.
    #[error("Extraction cancelled before page {page}")]
    Cancelled { page: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed before recognition could start.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR collaborator failed on this page after retries.
    #[error("Page {page}: recognition failed after {retries} retries: {detail}")]
    RecognitionFailed {
        page: usize,
        retries: u8,
        detail: String,
    },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } | PageError::RecognitionFailed { page, .. } => {
                *page
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = ImportError::UnsupportedFormat {
            name: "drawing.dwg".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("drawing.dwg"), "got: {msg}");
        assert!(msg.contains(".csv"));
    }

    #[test]
    fn unavailable_display_names_collaborator() {
        let e = ImportError::ExtractionUnavailable {
            collaborator: "PDFium".into(),
            detail: "library not found".into(),
        };
        assert!(e.to_string().starts_with("PDFium is not available"));
    }

    #[test]
    fn page_error_reports_page() {
        let e = PageError::RecognitionFailed {
            page: 4,
            retries: 2,
            detail: "timeout".into(),
        };
        assert_eq!(e.page(), 4);
        assert!(e.to_string().contains("Page 4"));
        assert_eq!(PageError::RenderFailed { page: 2, detail: "x".into() }.page(), 2);
    }

    #[test]
    fn cancelled_display() {
        let e = ImportError::Cancelled { page: 3 };
        assert!(e.to_string().contains("page 3"));
    }
}
