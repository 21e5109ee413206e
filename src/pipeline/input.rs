//! Input resolution: turn a path, URL, or upload into an [`ImportFile`].
//!
//! The engine works on a filename plus its bytes, which is what an upload
//! handler has in hand. Paths are read into memory and URLs are downloaded,
//! so the rest of the pipeline never touches the filesystem.

use crate::error::ImportError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Document type, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    PlainText,
    Csv,
}

impl FileKind {
    /// Map a filename's extension (case-insensitive) to a kind.
    pub fn from_name(name: &str) -> Result<Self, ImportError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(FileKind::Pdf),
            Some("txt") | Some("text") => Ok(FileKind::PlainText),
            Some("csv") => Ok(FileKind::Csv),
            _ => Err(ImportError::UnsupportedFormat {
                name: name.to_string(),
            }),
        }
    }
}

/// An uploaded document: its original filename and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn kind(&self) -> Result<FileKind, ImportError> {
        FileKind::from_name(&self.name)
    }

    /// Read a local file into memory.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ImportError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ImportError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(Self { name, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP(S) URL to an [`ImportFile`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ImportFile, ImportError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        ImportFile::from_path(PathBuf::from(input)).await
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ImportFile, ImportError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ImportError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let download_error = |e: reqwest::Error| {
        if e.is_timeout() {
            ImportError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ImportError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(download_error)?;
    if !response.status().is_success() {
        return Err(ImportError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(download_error)?;
    let name = filename_from_url(url);
    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(ImportFile::new(name, bytes.to_vec()))
}

/// Last path segment of the URL when it has an extension, else `download.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "download.pdf".to_string())
}
