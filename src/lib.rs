//! # fabparts-import
//!
//! Recover structured part records from the purchase orders and parts lists
//! a metal-fabrication shop receives: native PDFs, scanned PDFs, plain text
//! and CSV.
//!
//! Every record carries a confidence tag and its source text. The output is
//! meant for a human review step, never for direct commit, so a poor document
//! degrades to fewer or lower-confidence records instead of an error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Input     .pdf / .txt / .text / .csv, from bytes, path or URL
//!  ├─ 2. Extract   PDF text layer → reading-order lines (pdfium)
//!  │               too sparse? rasterise + OCR every page (vision LLM)
//!  ├─ 3. Parse     purchase-order blocks → single-line specs → tabular BOM
//!  │               first strategy with output wins
//!  └─ 4. Build     normalise dimensions and grades, assign confidence
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fabparts_import::{import_input, ImportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ImportConfig::default();
//!     let output = import_input("PO-4411.pdf", &config).await?;
//!     for record in &output.records {
//!         println!("{} x {:?} {} ({:?})",
//!             record.quantity, record.part_type, record.thickness, record.confidence);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Parsing alone needs no runtime:
//!
//! ```rust
//! let records = fabparts_import::parse_text("1 PCS 1/2\" A36 34.75 X 227.77\"");
//! assert_eq!(records[0].quantity, 1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `parts-import` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! fabparts-import = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod import;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImportConfig, ImportConfigBuilder, LayoutTolerances};
pub use error::{ImportError, PageError};
pub use import::{extract, import_file, import_input, import_sync, ExtractionReport, ImportOutput};
pub use parser::{parse, parse_text, parse_with_strategy, ParseOutcome, Strategy};
pub use pipeline::document::{DocumentBackend, PdfiumBackend};
pub use pipeline::extract::{Extraction, ExtractionMethod, PAGE_BREAK_MARKER};
pub use pipeline::input::{FileKind, ImportFile};
pub use pipeline::layout::TextToken;
pub use pipeline::ocr::{PageRecognizer, VisionRecognizer};
pub use progress::{ExtractionPhase, ImportProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{
    Confidence, MeasurePoint, MeasureType, ParsedPartRecord, PartType, RawLine, RollSpec, RollType,
};
