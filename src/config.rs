//! Configuration types for the import pipeline.
//!
//! All extraction behaviour is controlled through [`ImportConfig`], built via
//! its [`ImportConfigBuilder`]. Parsing has no knobs: the strategy library is
//! fixed, so only the extractor's layout and OCR settings live here.
//!
//! The layout tolerances and the OCR density threshold are empirical. They
//! were tuned on single-column vendor purchase orders and should be checked
//! against sample documents before being relied on for other layouts.

use crate::error::ImportError;
use crate::pipeline::document::DocumentBackend;
use crate::pipeline::ocr::PageRecognizer;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Geometry thresholds used to rebuild lines from positioned glyph runs.
///
/// Units are PDF user-space points (1/72 in).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutTolerances {
    /// Maximum vertical distance from a line's reference `y` for a token to
    /// join that line. Default: 5.0.
    pub line_tolerance: f32,

    /// Horizontal gap above which two tokens are joined with two spaces
    /// instead of one, preserving column breaks for the tabular parser.
    /// Default: 20.0.
    pub column_gap: f32,
}

impl Default for LayoutTolerances {
    fn default() -> Self {
        Self {
            line_tolerance: 5.0,
            column_gap: 20.0,
        }
    }
}

/// Configuration for one import.
///
/// Built via [`ImportConfig::builder()`] or using [`ImportConfig::default()`].
///
/// # Example
/// ```rust
/// use fabparts_import::ImportConfig;
///
/// let config = ImportConfig::builder()
///     .min_chars_per_page(30)
///     .ocr_scale(3.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ImportConfig {
    /// Line-clustering thresholds for the text layer.
    pub layout: LayoutTolerances,

    /// Non-whitespace characters expected per page from a native-text PDF.
    /// Default: 20.
    ///
    /// When the whole document yields fewer than `min_chars_per_page × pages`
    /// characters it is treated as a scan and every page goes through OCR.
    pub min_chars_per_page: usize,

    /// Rasterisation scale factor for OCR, relative to the page's native size.
    /// Minimum and default: 2.0.
    pub ocr_scale: f32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Vision model identifier used for OCR, e.g. "gpt-4.1-nano".
    pub model: Option<String>,

    /// Vision provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed vision provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for transcription. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Retry attempts per page on a recogniser failure. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Text-layer and rasterisation backend. Defaults to pdfium when `None`.
    pub document_backend: Option<Arc<dyn DocumentBackend>>,

    /// OCR collaborator. Defaults to the vision recogniser when `None`; it is
    /// only resolved if a document actually needs OCR.
    pub recognizer: Option<Arc<dyn PageRecognizer>>,

    /// Receives status text during extraction.
    pub progress_callback: Option<ProgressCallback>,

    /// When set to `true` by the caller, extraction stops before the next page.
    pub cancel_flag: Option<Arc<AtomicBool>>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            layout: LayoutTolerances::default(),
            min_chars_per_page: 20,
            ocr_scale: 2.0,
            password: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            max_retries: 2,
            retry_backoff_ms: 500,
            document_backend: None,
            recognizer: None,
            progress_callback: None,
            cancel_flag: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("layout", &self.layout)
            .field("min_chars_per_page", &self.min_chars_per_page)
            .field("ocr_scale", &self.ocr_scale)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field(
                "document_backend",
                &self.document_backend.as_ref().map(|_| "<dyn DocumentBackend>"),
            )
            .field("recognizer", &self.recognizer.as_ref().map(|_| "<dyn PageRecognizer>"))
            .field("progress_callback", &self.progress_callback.is_some())
            .field("cancel_flag", &self.cancel_flag.is_some())
            .finish()
    }
}

impl ImportConfig {
    /// Create a new builder for `ImportConfig`.
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ImportConfig`].
#[derive(Debug)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn line_tolerance(mut self, points: f32) -> Self {
        self.config.layout.line_tolerance = points;
        self
    }

    pub fn column_gap(mut self, points: f32) -> Self {
        self.config.layout.column_gap = points;
        self
    }

    pub fn layout(mut self, layout: LayoutTolerances) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn min_chars_per_page(mut self, n: usize) -> Self {
        self.config.min_chars_per_page = n;
        self
    }

    pub fn ocr_scale(mut self, scale: f32) -> Self {
        self.config.ocr_scale = scale.clamp(2.0, 6.0);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn document_backend(mut self, backend: Arc<dyn DocumentBackend>) -> Self {
        self.config.document_backend = Some(backend);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn PageRecognizer>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel_flag = Some(flag);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ImportConfig, ImportError> {
        let c = &self.config;
        if !(c.layout.line_tolerance.is_finite() && c.layout.line_tolerance >= 0.0) {
            return Err(ImportError::InvalidConfig(format!(
                "line tolerance must be a non-negative number, got {}",
                c.layout.line_tolerance
            )));
        }
        if !(c.layout.column_gap.is_finite() && c.layout.column_gap > 0.0) {
            return Err(ImportError::InvalidConfig(format!(
                "column gap must be positive, got {}",
                c.layout.column_gap
            )));
        }
        Ok(self.config)
    }
}
