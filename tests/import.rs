//! Integration tests for the full import pipeline.
//!
//! The PDF engine and the OCR engine are replaced by in-memory fakes, so
//! these tests need neither a pdfium library nor an API key.

use fabparts_import::{
    extract, import_file, import_input, Confidence, DocumentBackend, ExtractionMethod,
    ImportConfig, ImportError, ImportFile, ImportProgressCallback, PageError, PageRecognizer,
    PartType, RollType, Strategy, TextToken, PAGE_BREAK_MARKER,
};
use futures::future::BoxFuture;
use image::DynamicImage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Bytes that pass the `%PDF` check; the fake backend never parses them.
const PDF_BYTES: &[u8] = b"%PDF-1.7\n% fake\n";

/// Serves canned tokens per page and counts rasterisations.
struct FakeDocument {
    pages: Vec<Vec<TextToken>>,
    rasterized: AtomicUsize,
}

impl FakeDocument {
    fn new(pages: Vec<Vec<TextToken>>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            rasterized: AtomicUsize::new(0),
        })
    }
}

impl DocumentBackend for FakeDocument {
    fn text_layer(
        &self,
        _pdf: &[u8],
        _password: Option<&str>,
    ) -> Result<Vec<Vec<TextToken>>, ImportError> {
        Ok(self.pages.clone())
    }

    fn rasterize_page(
        &self,
        _pdf: &[u8],
        _password: Option<&str>,
        page_index: usize,
        scale: f32,
    ) -> Result<DynamicImage, ImportError> {
        assert!(page_index < self.pages.len());
        assert!(scale >= 2.0);
        self.rasterized.fetch_add(1, Ordering::SeqCst);
        Ok(DynamicImage::new_luma8(8, 8))
    }
}

/// Returns canned text per page (1-indexed); pages without an entry fail.
struct FakeRecognizer {
    pages: HashMap<usize, String>,
    calls: Mutex<Vec<usize>>,
}

impl FakeRecognizer {
    fn new(pages: &[(usize, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.iter().map(|(p, t)| (*p, t.to_string())).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageRecognizer for FakeRecognizer {
    fn recognize<'a>(
        &'a self,
        page_num: usize,
        _total_pages: usize,
        _image: &'a DynamicImage,
    ) -> BoxFuture<'a, Result<String, PageError>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(page_num);
            self.pages
                .get(&page_num)
                .cloned()
                .ok_or_else(|| PageError::RecognitionFailed {
                    page: page_num,
                    retries: 0,
                    detail: "model returned 503".to_string(),
                })
        })
    }
}

/// Lay out words left to right on one baseline, one space apart.
fn line_tokens(words: &[&str], y: f32) -> Vec<TextToken> {
    let mut x = 36.0;
    words
        .iter()
        .map(|w| {
            let width = w.len() as f32 * 5.0;
            let token = TextToken::new(*w, x, y, width);
            x += width + 3.0;
            token
        })
        .collect()
}

fn config_with(
    backend: Arc<FakeDocument>,
    recognizer: Arc<FakeRecognizer>,
) -> fabparts_import::ImportConfigBuilder {
    ImportConfig::builder()
        .document_backend(backend)
        .recognizer(recognizer)
}

fn collecting_callback() -> (Arc<Mutex<Vec<String>>>, Arc<dyn ImportProgressCallback>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let cb: Arc<dyn ImportProgressCallback> =
        Arc::new(move |msg: &str| sink.lock().unwrap().push(msg.to_string()));
    (messages, cb)
}

// ── Native text layer ────────────────────────────────────────────────────────

#[tokio::test]
async fn text_layer_pdf_is_parsed_without_ocr() {
    let mut page1 = line_tokens(&["PURCHASE", "ORDER", "4411"], 760.0);
    page1.extend(line_tokens(
        &["1", "PCS", "1/2\"", "A36", "34.75", "X", "227.77\""],
        700.0,
    ));
    let page2 = line_tokens(&["3", "PCS", "3/8\"", "A36", "12", "X", "24\""], 700.0);
    let backend = FakeDocument::new(vec![page1, page2]);
    let recognizer = FakeRecognizer::new(&[]);
    let config = config_with(backend.clone(), recognizer.clone()).build().unwrap();

    let out = import_file(&ImportFile::new("PO-4411.pdf", PDF_BYTES), &config)
        .await
        .unwrap();

    assert_eq!(out.extraction.method, ExtractionMethod::TextLayer);
    assert_eq!(out.extraction.page_count, 2);
    assert_eq!(out.extraction.ocr_pages, 0);
    assert!(recognizer.calls().is_empty());
    assert_eq!(backend.rasterized.load(Ordering::SeqCst), 0);

    assert_eq!(out.strategy, Some(Strategy::FullSpecLines));
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].quantity, 1);
    assert_eq!(out.records[0].thickness, "1/2\"");
    assert_eq!(out.records[0].width, "34.75");
    assert_eq!(out.records[1].quantity, 3);
    assert_eq!(out.records[1].thickness, "3/8\"");
}

#[tokio::test]
async fn text_layer_lines_keep_reading_order_and_page_breaks() {
    // Tokens arrive bottom line first; reading order puts the top line first.
    let mut page1 = line_tokens(
        &["ROLL", "AND", "TACK", "THE", "EASY", "WAY", "TO", "A", "42.125\"", "ID"],
        680.0,
    );
    page1.extend(line_tokens(
        &["2", "PCS", "1/2\"", "A36", "10", "X", "48.57\""],
        700.0,
    ));
    let page2 = line_tokens(
        &["NOTES:", "DELIVER", "TO", "DOCK", "3", "BEFORE", "NOON"],
        700.0,
    );
    let backend = FakeDocument::new(vec![page1, page2]);
    let config = config_with(backend, FakeRecognizer::new(&[])).build().unwrap();

    let extraction = extract(&ImportFile::new("po.pdf", PDF_BYTES), &config)
        .await
        .unwrap();
    let texts: Vec<_> = extraction.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "2 PCS 1/2\" A36 10 X 48.57\"",
            "ROLL AND TACK THE EASY WAY TO A 42.125\" ID",
            PAGE_BREAK_MARKER,
            "NOTES: DELIVER TO DOCK 3 BEFORE NOON",
        ]
    );

    let out = import_file(&ImportFile::new("po.pdf", PDF_BYTES), &config)
        .await
        .unwrap();
    assert_eq!(out.strategy, Some(Strategy::PurchaseOrderBlocks));
    let r = &out.records[0];
    assert_eq!(r.roll_spec.value, Some(42.125));
    assert_eq!(r.roll_type, Some(RollType::EasyWay));
    assert!(r.special_instructions.contains("Tack weld"));
    assert_eq!(r.confidence, Confidence::High);
}

// ── OCR escalation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sparse_scan_is_ocr_once_per_page_and_drops_text_layer() {
    // Three pages with a one-character text layer each: far below 20/page.
    let pages = (0..3).map(|_| line_tokens(&["x"], 700.0)).collect();
    let backend = FakeDocument::new(pages);
    let recognizer = FakeRecognizer::new(&[
        (1, "2 PCS 1/2\" A36 10 X 48.57\"\nROLL AND TACK THE EASY WAY TO A 42.125\" ID"),
        (2, ""),
        (3, "1 PCS 1/4\" A36 5 X 5\""),
    ]);
    let config = config_with(backend.clone(), recognizer.clone()).build().unwrap();

    let out = import_file(&ImportFile::new("scan.pdf", PDF_BYTES), &config)
        .await
        .unwrap();

    assert_eq!(recognizer.calls(), vec![1, 2, 3]);
    assert_eq!(backend.rasterized.load(Ordering::SeqCst), 3);
    assert_eq!(out.extraction.method, ExtractionMethod::Ocr);
    assert_eq!(out.extraction.ocr_pages, 3);
    assert!(out.extraction.failed_pages.is_empty());

    let extraction = extract(&ImportFile::new("scan.pdf", PDF_BYTES), &config)
        .await
        .unwrap();
    assert!(extraction.lines.iter().all(|l| l.text != "x"));
    assert_eq!(
        extraction
            .lines
            .iter()
            .filter(|l| l.text == PAGE_BREAK_MARKER)
            .count(),
        2
    );

    assert_eq!(out.strategy, Some(Strategy::PurchaseOrderBlocks));
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].part_type, PartType::PlateRoll);
    assert_eq!(out.records[0].roll_spec.value, Some(42.125));
    assert_eq!(out.records[1].quantity, 1);
}

#[tokio::test]
async fn failed_ocr_page_becomes_placeholder() {
    let pages = (0..3).map(|_| Vec::new()).collect();
    let backend = FakeDocument::new(pages);
    let recognizer = FakeRecognizer::new(&[
        (1, "1 PCS 1/2\" A36 34.75 X 227.77\""),
        (3, "3 PCS 3/8\" A36 12 X 24\""),
    ]);
    let (messages, cb) = collecting_callback();
    let config = config_with(backend, recognizer)
        .progress_callback(cb)
        .build()
        .unwrap();

    let out = import_file(&ImportFile::new("scan.pdf", PDF_BYTES), &config)
        .await
        .unwrap();

    assert_eq!(out.extraction.failed_pages.len(), 1);
    assert_eq!(out.extraction.failed_pages[0].page(), 2);
    assert_eq!(out.records.len(), 2, "remaining pages still parse");

    let extraction = extract(&ImportFile::new("scan.pdf", PDF_BYTES), &config)
        .await
        .unwrap();
    assert!(extraction
        .lines
        .iter()
        .any(|l| l.page == 2 && l.text == "[OCR failed on page 2]"));

    let messages = messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.starts_with("Page 2 of 3 failed")));
}

#[tokio::test]
async fn progress_reports_phases_and_pages() {
    let pages = (0..2).map(|_| Vec::new()).collect();
    let backend = FakeDocument::new(pages);
    let recognizer = FakeRecognizer::new(&[(1, "1 PCS 1/4\" A36 5 X 5\""), (2, "")]);
    let (messages, cb) = collecting_callback();
    let config = config_with(backend, recognizer)
        .progress_callback(cb)
        .build()
        .unwrap();

    import_file(&ImportFile::new("scan.pdf", PDF_BYTES), &config)
        .await
        .unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages[0], "Reading text layer...");
    assert_eq!(messages[1], "Extracting text from 2 page(s)...");
    assert!(messages.contains(&"OCR: Processing page 1 of 2...".to_string()));
    assert!(messages.contains(&"OCR: Processing page 2 of 2...".to_string()));
    assert!(messages.last().unwrap().starts_with("Extracted "));
}

// ── Failure modes ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_extension_fails_before_extraction() {
    let backend = FakeDocument::new(vec![Vec::new()]);
    let config = config_with(backend.clone(), FakeRecognizer::new(&[]))
        .build()
        .unwrap();
    let err = import_file(&ImportFile::new("part.step", PDF_BYTES), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat { .. }));
    assert_eq!(backend.rasterized.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pdf_without_magic_is_extraction_failed() {
    let err = import_file(
        &ImportFile::new("po.pdf", "this is not a pdf"),
        &ImportConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ImportError::ExtractionFailed { .. }));
}

#[tokio::test]
async fn cancel_flag_stops_extraction() {
    let pages = (0..3).map(|_| Vec::new()).collect();
    let backend = FakeDocument::new(pages);
    let recognizer = FakeRecognizer::new(&[(1, "1 PCS 1/4\" A36 5 X 5\"")]);
    let flag = Arc::new(AtomicBool::new(true));
    let config = config_with(backend, recognizer.clone())
        .cancel_flag(flag)
        .build()
        .unwrap();

    let err = import_file(&ImportFile::new("scan.pdf", PDF_BYTES), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Cancelled { page: 1 }));
    assert!(recognizer.calls().is_empty());
}

// ── Text and CSV inputs ──────────────────────────────────────────────────────

#[tokio::test]
async fn csv_file_on_disk_parses_as_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bom.csv");
    std::fs::write(
        &path,
        "QTY,PART,DESCRIPTION,MATERIAL,NOTES\n\
         2,A-1,\"1/2\"\" PL 10 X 48\",A36,ROLL\n\
         x,A-2,BAD ROW,A36,\n\
         4,A-3,GUSSET,A36,FORM 90 DEG\n",
    )
    .unwrap();

    let out = import_input(path.to_str().unwrap(), &ImportConfig::default())
        .await
        .unwrap();

    assert_eq!(out.extraction.method, ExtractionMethod::Csv);
    assert_eq!(out.strategy, Some(Strategy::TabularBom));
    assert_eq!(out.records.len(), 2);

    let first = &out.records[0];
    assert_eq!(first.quantity, 2);
    assert_eq!(first.client_part_number.as_deref(), Some("A-1"));
    assert_eq!(first.part_type, PartType::PlateRoll);
    assert_eq!(first.material, "A36");
    assert_eq!(first.confidence, Confidence::Medium);

    assert_eq!(out.records[1].part_type, PartType::PressBrake);
}

#[tokio::test]
async fn prose_text_yields_no_records() {
    let out = import_file(
        &ImportFile::new("email.txt", "Hi,\nPlease quote the attached.\nThanks"),
        &ImportConfig::default(),
    )
    .await
    .unwrap();
    assert!(out.is_empty());
    assert_eq!(out.strategy, None);
    assert_eq!(out.extraction.method, ExtractionMethod::PlainText);
}

#[tokio::test]
async fn missing_path_is_file_not_found() {
    let err = import_input("/no/such/dir/po.pdf", &ImportConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound { .. }));
}
