//! PDF access: the positioned text layer and page rasterisation.
//!
//! ## Why a trait?
//!
//! The extractor only needs two things from a PDF engine: positioned glyph
//! runs per page and a bitmap of one page. Putting them
//! behind [`DocumentBackend`] lets tests drive the whole pipeline with canned
//! tokens, and lets a host application supply its own engine.
//!
//! ## Threading
//!
//! Backend methods are synchronous. pdfium is not async-safe, so the
//! extractor always calls them from `tokio::task::spawn_blocking`.

use super::layout::TextToken;
use crate::error::ImportError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Environment variable naming a directory that contains the pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Text-layer and rasterisation capability over an in-memory PDF.
pub trait DocumentBackend: Send + Sync {
    /// Positioned text tokens for every page, in page order.
    fn text_layer(
        &self,
        pdf: &[u8],
        password: Option<&str>,
    ) -> Result<Vec<Vec<TextToken>>, ImportError>;

    /// Render one page (0-based) at `scale` times its native size.
    fn rasterize_page(
        &self,
        pdf: &[u8],
        password: Option<&str>,
        page_index: usize,
        scale: f32,
    ) -> Result<DynamicImage, ImportError>;
}

/// [`DocumentBackend`] over the pdfium C library.
///
/// The library is bound on each call: from `$PDFIUM_LIB_PATH` when set, then
/// from the working directory, then from the system library path.
#[derive(Debug, Default, Clone)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    pub fn new() -> Self {
        Self
    }

    fn bind(&self) -> Result<Pdfium, ImportError> {
        let dir = std::env::var(PDFIUM_LIB_PATH_ENV).unwrap_or_else(|_| "./".to_string());
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| ImportError::ExtractionUnavailable {
                collaborator: "PDFium".to_string(),
                detail: format!("{e:?}. Set {PDFIUM_LIB_PATH_ENV} to the directory containing the pdfium library."),
            })?;
        Ok(Pdfium::new(bindings))
    }
}

fn load_error(err: PdfiumError, password: Option<&str>) -> ImportError {
    let detail = format!("{err:?}");
    if detail.to_ascii_lowercase().contains("password") && password.is_none() {
        ImportError::PasswordRequired {
            name: "document".to_string(),
        }
    } else {
        ImportError::CorruptPdf {
            name: "document".to_string(),
            detail,
        }
    }
}

impl DocumentBackend for PdfiumBackend {
    fn text_layer(
        &self,
        pdf: &[u8],
        password: Option<&str>,
    ) -> Result<Vec<Vec<TextToken>>, ImportError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, password)
            .map_err(|e| load_error(e, password))?;

        let mut pages = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            // A page without a readable text layer contributes no tokens; the
            // density check upstream decides whether OCR is needed.
            let Ok(text) = page.text() else {
                debug!("Page {}: no text layer", idx + 1);
                pages.push(Vec::new());
                continue;
            };
            let tokens: Vec<TextToken> = text
                .segments()
                .iter()
                .map(|segment| {
                    let bounds = segment.bounds();
                    TextToken::new(
                        segment.text(),
                        bounds.left().value,
                        bounds.bottom().value,
                        bounds.right().value - bounds.left().value,
                    )
                })
                .collect();
            debug!("Page {}: {} text segments", idx + 1, tokens.len());
            pages.push(tokens);
        }
        info!("Read text layer from {} page(s)", pages.len());
        Ok(pages)
    }

    fn rasterize_page(
        &self,
        pdf: &[u8],
        password: Option<&str>,
        page_index: usize,
        scale: f32,
    ) -> Result<DynamicImage, ImportError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, password)
            .map_err(|e| load_error(e, password))?;
        let render_error = |detail: String| ImportError::ExtractionFailed {
            name: format!("page {}", page_index + 1),
            detail,
        };

        let index = u16::try_from(page_index)
            .map_err(|_| render_error(format!("page index {page_index} out of range")))?;
        let page = document
            .pages()
            .get(index)
            .map_err(|e| render_error(format!("{e:?}")))?;

        let target_width = (page.width().value * scale).round() as i32;
        let render_config = PdfRenderConfig::new().set_target_width(target_width.max(1));
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| render_error(format!("{e:?}")))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
