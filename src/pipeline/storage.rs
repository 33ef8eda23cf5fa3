//! Transient storage for uploaded files.
//!
//! Each upload is spooled to a uniquely named file inside the configured
//! upload directory. The file is owned by a [`TransientUpload`] and removed
//! exactly once when that value is dropped, whichever way the request ends.
//! A failed removal is logged and otherwise ignored.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const UPLOAD_PREFIX: &str = "upload-";

/// A request-scoped uploaded file on disk.
#[derive(Debug)]
pub struct TransientUpload {
    original_filename: String,
    mime_hint: Option<String>,
    size: u64,
    stored: Option<TempPath>,
    writer: Option<tokio::fs::File>,
}

impl TransientUpload {
    /// Create an empty stored file in `dir` under a generated name.
    pub fn create_in(
        dir: &Path,
        original_filename: impl Into<String>,
        mime_hint: Option<String>,
    ) -> Result<Self, ConvertError> {
        let named = tempfile::Builder::new()
            .prefix(UPLOAD_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| ConvertError::io(dir, e))?;
        let (file, stored) = named.into_parts();
        debug!("Created transient upload {}", stored.display());

        Ok(Self {
            original_filename: original_filename.into(),
            mime_hint,
            size: 0,
            stored: Some(stored),
            writer: Some(tokio::fs::File::from_std(file)),
        })
    }

    /// Append a chunk of the upload body.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), ConvertError> {
        let path = self.path().to_path_buf();
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ConvertError::Internal("upload already finished".into()))?;
        writer
            .write_all(chunk)
            .await
            .map_err(|e| ConvertError::io(path, e))?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the writer. Further writes fail.
    pub async fn finish(&mut self) -> Result<(), ConvertError> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .await
                .map_err(|e| ConvertError::io(self.path(), e))?;
        }
        Ok(())
    }

    /// Path of the stored file (generated name, not the original).
    pub fn path(&self) -> &Path {
        self.stored
            .as_deref()
            .unwrap_or_else(|| Path::new(""))
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn mime_hint(&self) -> Option<&str> {
        self.mime_hint.as_deref()
    }

    /// Bytes written so far.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for TransientUpload {
    fn drop(&mut self) {
        drop(self.writer.take());
        if let Some(stored) = self.stored.take() {
            let path: PathBuf = stored.to_path_buf();
            match stored.close() {
                Ok(()) => debug!("Removed transient upload {}", path.display()),
                Err(e) => warn!("Error deleting file {}: {}", path.display(), e),
            }
        }
    }
}
