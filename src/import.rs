//! Import entry points: extract a file's lines, then parse them into records.
//!
//! Only extraction can fail. Once lines exist, parsing always produces a
//! (possibly empty) record list; an empty list is the "no records found"
//! outcome and callers present it as such.

use crate::config::ImportConfig;
use crate::error::{ImportError, PageError};
use crate::parser::{self, Strategy};
use crate::pipeline::extract::{self, Extraction, ExtractionMethod};
use crate::pipeline::input::{self, ImportFile};
use crate::record::ParsedPartRecord;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// What extraction produced, without the lines themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub method: ExtractionMethod,
    pub page_count: usize,
    pub line_count: usize,
    pub ocr_pages: usize,
    pub failed_pages: Vec<PageError>,
    pub duration_ms: u64,
}

/// Result of importing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutput {
    pub records: Vec<ParsedPartRecord>,
    /// Strategy that produced `records`; `None` when nothing matched.
    pub strategy: Option<Strategy>,
    pub extraction: ExtractionReport,
    pub parse_duration_ms: u64,
}

impl ImportOutput {
    /// No strategy recognised any part.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extract the raw lines of `file` without parsing them.
pub async fn extract(file: &ImportFile, config: &ImportConfig) -> Result<Extraction, ImportError> {
    extract::extract_lines(file, config).await
}

/// Import an in-memory file (name plus bytes).
///
/// # Errors
/// Only extraction errors; see [`extract::extract_lines`].
pub async fn import_file(file: &ImportFile, config: &ImportConfig) -> Result<ImportOutput, ImportError> {
    info!("Importing '{}' ({} bytes)", file.name, file.bytes.len());

    let extract_start = Instant::now();
    let extraction = extract::extract_lines(file, config).await?;
    let extract_ms = extract_start.elapsed().as_millis() as u64;

    let parse_start = Instant::now();
    let outcome = parser::parse_with_strategy(&extraction.lines);
    let parse_duration_ms = parse_start.elapsed().as_millis() as u64;

    let (strategy, records) = match outcome {
        Some(o) => (Some(o.strategy), o.records),
        None => (None, Vec::new()),
    };
    match strategy {
        Some(s) => info!("Found {} part record(s) via {}", records.len(), s),
        None => info!("No part records found in '{}'", file.name),
    }

    Ok(ImportOutput {
        records,
        strategy,
        extraction: ExtractionReport {
            method: extraction.method,
            page_count: extraction.page_count,
            line_count: extraction.lines.len(),
            ocr_pages: extraction.ocr_pages,
            failed_pages: extraction.failed_pages,
            duration_ms: extract_ms,
        },
        parse_duration_ms,
    })
}

/// Import a local path or HTTP(S) URL.
pub async fn import_input(
    input_str: impl AsRef<str>,
    config: &ImportConfig,
) -> Result<ImportOutput, ImportError> {
    let file = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    import_file(&file, config).await
}

/// Synchronous wrapper around [`import_input`].
///
/// Creates a temporary tokio runtime. Do not call from inside an async
/// context; use [`import_input`] there.
pub fn import_sync(
    input_str: impl AsRef<str>,
    config: &ImportConfig,
) -> Result<ImportOutput, ImportError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ImportError::Internal(format!("failed to create tokio runtime: {e}")))?;
    rt.block_on(import_input(input_str, config))
}
