//! Text extraction: an [`ImportFile`] in, ordered [`RawLine`]s out.
//!
//! ## Paths
//!
//! ```text
//! .txt / .text ──▶ decode ───────────────────────────────────▶ lines
//! .csv         ──▶ decode ──▶ records → tab-separated rows ──▶ lines
//! .pdf         ──▶ text layer ──▶ layout ──▶ density check ──▶ lines
//!                                               │ too sparse
//!                                               ▼
//!                               rasterise ──▶ OCR (every page) ──▶ lines
//! ```
//!
//! The density check compares non-whitespace characters in the whole text
//! layer with `min_chars_per_page × pages`. Below it the document is treated
//! as a scan: every page is OCR'd exactly once and the sparse text layer is
//! discarded. Pages are separated by [`PAGE_BREAK_MARKER`] on both paths.
//!
//! A page that fails to render or recognise becomes the placeholder line
//! `[OCR failed on page N]` and is reported; the remaining pages continue.

use super::document::{DocumentBackend, PdfiumBackend};
use super::input::{FileKind, ImportFile};
use super::layout;
use super::ocr::{PageRecognizer, VisionRecognizer};
use crate::config::ImportConfig;
use crate::error::{ImportError, PageError};
use crate::progress::{ExtractionPhase, ImportProgressCallback, NoopProgressCallback};
use crate::record::RawLine;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Line inserted between pages of a multi-page PDF.
pub const PAGE_BREAK_MARKER: &str = "--- PAGE BREAK ---";

/// How many leading bytes may precede the `%PDF` header.
const PDF_MAGIC_WINDOW: usize = 1024;

/// Placeholder line for a page whose OCR failed.
pub fn ocr_failed_placeholder(page_num: usize) -> String {
    format!("[OCR failed on page {page_num}]")
}

/// Which path produced the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PlainText,
    Csv,
    TextLayer,
    Ocr,
}

/// Lines recovered from one file, plus what it took to get them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub lines: Vec<RawLine>,
    pub method: ExtractionMethod,
    /// Pages in the document (1 for text and CSV files).
    pub page_count: usize,
    /// Pages sent to the recogniser.
    pub ocr_pages: usize,
    pub failed_pages: Vec<PageError>,
}

/// Recover the ordered lines of `file`.
///
/// # Errors
/// - [`ImportError::UnsupportedFormat`] for an unrecognised extension
/// - [`ImportError::ExtractionFailed`] for a `.pdf` that is not a PDF
/// - [`ImportError::ExtractionUnavailable`] when pdfium or the OCR provider
///   cannot be loaded
/// - [`ImportError::Cancelled`] when the cancel flag is raised
pub async fn extract_lines(file: &ImportFile, config: &ImportConfig) -> Result<Extraction, ImportError> {
    let kind = file.kind()?;
    let progress = progress(config);
    let extraction = match kind {
        FileKind::PlainText => text_extraction(decode_text(&file.bytes), ExtractionMethod::PlainText),
        FileKind::Csv => {
            let text = decode_text(&file.bytes);
            text_extraction(csv_to_rows(&text), ExtractionMethod::Csv)
        }
        FileKind::Pdf => extract_pdf(file, config, progress).await?,
    };
    info!(
        "Extracted {} line(s) from '{}' via {:?}",
        extraction.lines.len(),
        file.name,
        extraction.method
    );
    progress.on_extraction_complete(extraction.lines.len());
    Ok(extraction)
}

// ── Plain text and CSV ────────────────────────────────────────────────────

/// Lossy UTF-8 decode with any byte-order mark removed.
fn decode_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string()
}

fn text_extraction(text: String, method: ExtractionMethod) -> Extraction {
    let lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| RawLine::new(1, index, line))
        .collect();
    Extraction {
        lines,
        method,
        page_count: 1,
        ocr_pages: 0,
        failed_pages: Vec::new(),
    }
}

/// Re-emit CSV records as tab-separated rows, the column separator the
/// tabular parser understands. Unreadable CSV is passed through unchanged.
fn csv_to_rows(text: &str) -> String {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());

    let rows: Result<Vec<String>, csv::Error> = reader
        .records()
        .map(|record| {
            record.map(|r| {
                r.iter()
                    .map(|field| field.replace(['\t', '\n', '\r'], " "))
                    .collect::<Vec<_>>()
                    .join("\t")
            })
        })
        .collect();

    match rows {
        Ok(rows) => rows.join("\n"),
        Err(e) => {
            warn!("CSV parse failed ({e}); using raw lines");
            text.to_string()
        }
    }
}

// ── PDF ───────────────────────────────────────────────────────────────────

static NOOP_PROGRESS: NoopProgressCallback = NoopProgressCallback;

fn progress(config: &ImportConfig) -> &dyn ImportProgressCallback {
    match config.progress_callback {
        Some(ref cb) => cb.as_ref(),
        None => &NOOP_PROGRESS,
    }
}

fn check_cancelled(config: &ImportConfig, page: usize) -> Result<(), ImportError> {
    let cancelled = config
        .cancel_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::SeqCst));
    if cancelled {
        info!("Extraction cancelled before page {}", page);
        return Err(ImportError::Cancelled { page });
    }
    Ok(())
}

fn has_pdf_magic(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_MAGIC_WINDOW)];
    window.windows(4).any(|w| w == b"%PDF")
}

/// Backend errors carry no filename; attach the upload's.
fn with_name(err: ImportError, name: &str) -> ImportError {
    match err {
        ImportError::CorruptPdf { detail, .. } => ImportError::CorruptPdf {
            name: name.to_string(),
            detail,
        },
        ImportError::PasswordRequired { .. } => ImportError::PasswordRequired {
            name: name.to_string(),
        },
        other => other,
    }
}

async fn blocking<T, F>(what: &str, f: F) -> Result<T, ImportError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ImportError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ImportError::Internal(format!("{what} task panicked: {e}")))?
}

async fn extract_pdf(
    file: &ImportFile,
    config: &ImportConfig,
    progress: &dyn ImportProgressCallback,
) -> Result<Extraction, ImportError> {
    if !has_pdf_magic(&file.bytes) {
        return Err(ImportError::ExtractionFailed {
            name: file.name.clone(),
            detail: "file has a .pdf extension but no %PDF header".to_string(),
        });
    }

    let backend: Arc<dyn DocumentBackend> = config
        .document_backend
        .clone()
        .unwrap_or_else(|| Arc::new(PdfiumBackend::new()));
    let pdf: Arc<[u8]> = Arc::from(file.bytes.as_slice());
    let password = config.password.clone();

    check_cancelled(config, 1)?;
    progress.on_status("Reading text layer...");
    let token_pages = {
        let backend = Arc::clone(&backend);
        let pdf = Arc::clone(&pdf);
        let password = password.clone();
        blocking("text layer", move || backend.text_layer(&pdf, password.as_deref()))
            .await
            .map_err(|e| with_name(e, &file.name))?
    };
    let page_count = token_pages.len();
    progress.on_extraction_start(page_count, ExtractionPhase::TextLayer);

    let mut text_pages = Vec::with_capacity(page_count);
    for (idx, tokens) in token_pages.into_iter().enumerate() {
        check_cancelled(config, idx + 1)?;
        progress.on_page_start(idx + 1, page_count, ExtractionPhase::TextLayer);
        text_pages.push(layout::cluster_lines(tokens, &config.layout));
    }

    let chars: usize = text_pages
        .iter()
        .flatten()
        .map(|line| line.chars().filter(|c| !c.is_whitespace()).count())
        .sum();
    let threshold = config.min_chars_per_page.saturating_mul(page_count);
    debug!(
        "Text layer: {} non-whitespace chars over {} page(s), threshold {}",
        chars, page_count, threshold
    );

    if chars >= threshold {
        return Ok(Extraction {
            lines: join_pages(text_pages),
            method: ExtractionMethod::TextLayer,
            page_count,
            ocr_pages: 0,
            failed_pages: Vec::new(),
        });
    }

    info!(
        "Text layer too sparse ({} < {}); running OCR on {} page(s)",
        chars, threshold, page_count
    );
    let recognizer: Arc<dyn PageRecognizer> = match config.recognizer {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(VisionRecognizer::from_config(config)?),
    };
    progress.on_extraction_start(page_count, ExtractionPhase::Ocr);

    let mut ocr_pages: Vec<Vec<String>> = Vec::with_capacity(page_count);
    let mut failed_pages = Vec::new();
    for idx in 0..page_count {
        let page_num = idx + 1;
        check_cancelled(config, page_num)?;
        progress.on_page_start(page_num, page_count, ExtractionPhase::Ocr);

        let rendered = {
            let backend = Arc::clone(&backend);
            let pdf = Arc::clone(&pdf);
            let password = password.clone();
            let scale = config.ocr_scale;
            blocking("rasterise", move || {
                backend.rasterize_page(&pdf, password.as_deref(), idx, scale)
            })
            .await
        };

        let result = match rendered {
            Ok(image) => recognizer.recognize(page_num, page_count, &image).await,
            Err(e) => Err(PageError::RenderFailed {
                page: page_num,
                detail: e.to_string(),
            }),
        };

        match result {
            Ok(text) => ocr_pages.push(
                text.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            Err(e) => {
                warn!("{}", e);
                progress.on_page_error(page_num, page_count, &e.to_string());
                ocr_pages.push(vec![ocr_failed_placeholder(page_num)]);
                failed_pages.push(e);
            }
        }
    }

    Ok(Extraction {
        lines: join_pages(ocr_pages),
        method: ExtractionMethod::Ocr,
        page_count,
        ocr_pages: page_count,
        failed_pages,
    })
}

/// Flatten per-page lines into one sequence with a marker between pages.
fn join_pages(pages: Vec<Vec<String>>) -> Vec<RawLine> {
    let mut lines = Vec::new();
    for (idx, page) in pages.into_iter().enumerate() {
        let page_num = idx + 1;
        if idx > 0 {
            lines.push(RawLine::new(page_num, lines.len(), PAGE_BREAK_MARKER));
        }
        for text in page {
            lines.push(RawLine::new(page_num, lines.len(), text));
        }
    }
    lines
}
