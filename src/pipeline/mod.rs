//! Text Extractor stages: one uploaded file in, ordered raw lines out.
//!
//! Each submodule implements one step and can be tested on its own. The two
//! external collaborators (the PDF engine and the OCR engine) sit behind
//! narrow traits so extraction can run against fakes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ layout ──────────────────────────▶ extract
//! (file)    (text layer)  (line clustering)                 (lines)
//!              │ sparse
//!              ▼
//!           document ──▶ ocr ──▶ encode ──▶ VLM ──▶ postprocess
//!           (raster)
//! ```
//!
//! 1. [`input`]: file typing and path/URL resolution to an `ImportFile`
//! 2. [`document`]: positioned text tokens and page rasters; pdfium calls
//!    run in `spawn_blocking`
//! 3. [`layout`]: cluster tokens into reading-order lines
//! 4. [`ocr`]: page recognition capability and the vision-LLM default
//! 5. [`encode`]: PNG-encode and base64-wrap a page for the OCR request
//! 6. [`postprocess`]: deterministic cleanup of transcriptions
//! 7. [`extract`]: orchestration and the density escalation to OCR

pub mod document;
pub mod encode;
pub mod extract;
pub mod input;
pub mod layout;
pub mod ocr;
pub mod postprocess;
