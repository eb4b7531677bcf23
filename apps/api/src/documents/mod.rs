//! Document-to-text conversion for uploaded CVs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// File extensions the extractor (and directory-mode batches) accept.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("CV file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported CV file format: {0}. Use PDF, TXT or MD.")]
    UnsupportedFormat(String),

    #[error("Failed to read CV file {path}: {message}")]
    Read { path: PathBuf, message: String },
}

/// Converts a source document on disk to plain text.
#[async_trait]
pub trait DocumentTextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, DocumentError>;
}

/// Default extractor: PDF via `pdf-extract`, plain text and markdown read as UTF-8.
pub struct FileTextExtractor;

pub fn is_supported(path: &Path) -> bool {
    supported_extension(path).is_some()
}

/// Lowercased extension of `path` when it is one we can read.
pub fn supported_extension(path: &Path) -> Option<String> {
    extension_of(path).filter(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[async_trait]
impl DocumentTextExtractor for FileTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        let extension = extension_of(path).unwrap_or_default();
        let read_error = |message: String| DocumentError::Read {
            path: path.to_path_buf(),
            message,
        };

        let text = match extension.as_str() {
            "pdf" => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| read_error(e.to_string()))?;
                // pdf-extract is CPU-bound and synchronous
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await
                    .map_err(|e| read_error(e.to_string()))?
                    .map_err(|e| read_error(e.to_string()))?
            }
            "txt" | "md" => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| read_error(e.to_string()))?,
            other => return Err(DocumentError::UnsupportedFormat(format!(".{other}"))),
        };

        debug!("Extracted {} chars from {}", text.len(), path.display());
        Ok(text)
    }
}
