//! Progress-callback trait for extraction status events.
//!
//! Text-layer reading is quick, but the OCR escalation path renders and
//! recognises every page and can run for minutes. Inject an
//! [`Arc<dyn ImportProgressCallback>`] via
//! [`crate::config::ImportConfigBuilder::progress_callback`] to keep an
//! operator informed.
//!
//! The contract is a single status-text sink, [`ImportProgressCallback::on_status`].
//! Any `Fn(&str) + Send + Sync` closure implements the trait directly. The
//! structured hooks format a human-readable message and forward it to
//! `on_status` by default; override them when a caller wants numbers instead
//! of text (a progress bar, for example).
//!
//! # Example
//!
//! ```rust
//! use fabparts_import::{ImportConfig, ImportProgressCallback};
//! use std::sync::Arc;
//!
//! let status = |msg: &str| eprintln!("{msg}");
//! let config = ImportConfig::builder()
//!     .progress_callback(Arc::new(status) as Arc<dyn ImportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// Which extraction pass is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    /// Reading positioned glyph runs from the PDF text layer.
    TextLayer,
    /// Rasterising pages and sending them to the OCR collaborator.
    Ocr,
}

impl fmt::Display for ExtractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionPhase::TextLayer => f.write_str("Text layer"),
            ExtractionPhase::Ocr => f.write_str("OCR"),
        }
    }
}

/// Receives coarse-grained status while a file is being extracted.
///
/// Implementations must be `Send + Sync`: the callback lives in an
/// [`crate::config::ImportConfig`] that may be shared across tasks. Hooks are
/// called from the extracting task, never from inside `spawn_blocking`.
pub trait ImportProgressCallback: Send + Sync {
    /// Human-readable status line, e.g. `"OCR: Processing page 2 of 3..."`.
    fn on_status(&self, message: &str) {
        let _ = message;
    }

    /// Called once per phase before its first page.
    fn on_extraction_start(&self, total_pages: usize, phase: ExtractionPhase) {
        match phase {
            ExtractionPhase::TextLayer => {
                self.on_status(&format!("Extracting text from {total_pages} page(s)..."))
            }
            ExtractionPhase::Ocr => self.on_status(&format!(
                "Little or no embedded text found; running OCR on {total_pages} page(s)..."
            )),
        }
    }

    /// Called just before a page is processed.
    ///
    /// * `page_num`: 1-indexed page number
    fn on_page_start(&self, page_num: usize, total_pages: usize, phase: ExtractionPhase) {
        match phase {
            ExtractionPhase::TextLayer => self.on_status(&format!(
                "Reading text layer: page {page_num} of {total_pages}..."
            )),
            ExtractionPhase::Ocr => {
                self.on_status(&format!("OCR: Processing page {page_num} of {total_pages}..."))
            }
        }
    }

    /// Called when a page fails; the import continues with a placeholder.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.on_status(&format!(
            "Page {page_num} of {total_pages} failed ({error}); continuing..."
        ));
    }

    /// Called once after extraction produced its final line list.
    fn on_extraction_complete(&self, line_count: usize) {
        self.on_status(&format!("Extracted {line_count} line(s); parsing..."));
    }
}

impl<F> ImportProgressCallback for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_status(&self, message: &str) {
        self(message)
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ImportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ImportConfig`].
pub type ProgressCallback = Arc<dyn ImportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(5, ExtractionPhase::TextLayer);
        cb.on_page_start(1, 5, ExtractionPhase::Ocr);
        cb.on_page_error(2, 5, "some error");
        cb.on_extraction_complete(12);
    }

    #[test]
    fn closure_receives_formatted_status() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&seen);
        let cb: ProgressCallback = Arc::new(move |m: &str| sink.lock().unwrap().push(m.to_string()));

        cb.on_extraction_start(3, ExtractionPhase::TextLayer);
        cb.on_page_start(2, 3, ExtractionPhase::Ocr);
        cb.on_page_error(3, 3, "timeout");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], "Extracting text from 3 page(s)...");
        assert_eq!(seen[1], "OCR: Processing page 2 of 3...");
        assert!(seen[2].contains("timeout"));
    }

    #[test]
    fn structured_hooks_can_be_overridden() {
        struct Counting {
            pages: AtomicUsize,
            statuses: AtomicUsize,
        }
        impl ImportProgressCallback for Counting {
            fn on_status(&self, _message: &str) {
                self.statuses.fetch_add(1, Ordering::SeqCst);
            }
            fn on_page_start(&self, _page: usize, _total: usize, _phase: ExtractionPhase) {
                self.pages.fetch_add(1, Ordering::SeqCst);
            }
        }

        let cb = Counting {
            pages: AtomicUsize::new(0),
            statuses: AtomicUsize::new(0),
        };
        cb.on_page_start(1, 2, ExtractionPhase::Ocr);
        cb.on_page_start(2, 2, ExtractionPhase::Ocr);
        cb.on_extraction_complete(4);
        assert_eq!(cb.pages.load(Ordering::SeqCst), 2);
        assert_eq!(cb.statuses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn phase_display() {
        assert_eq!(ExtractionPhase::Ocr.to_string(), "OCR");
        assert_eq!(ExtractionPhase::TextLayer.to_string(), "Text layer");
    }
}
