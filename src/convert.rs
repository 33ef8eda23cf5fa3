//! Conversion dispatch: route a stored file to exactly one format handler.
//!
//! The tag comes from the upload's *original* filename (see
//! [`crate::format::classify`]); the path is wherever the bytes were spooled.
//! Each handler is attempted once, with no retries.

use crate::error::ConvertError;
use crate::format::{classify, FormatTag};
use crate::output::{ConversionResult, ExtractedText};
use crate::pipeline::{docx, pdf, xlsx};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Convert the file stored at `stored_path` according to `tag`.
///
/// # Errors
/// - [`ConvertError::UnsupportedFormat`] for [`FormatTag::Unsupported`]
/// - a processing error when the format library rejects the file
pub async fn convert(stored_path: &Path, tag: FormatTag) -> Result<ConversionResult, ConvertError> {
    if !tag.is_supported() {
        return Err(ConvertError::UnsupportedFormat {
            filename: stored_path.display().to_string(),
        });
    }

    let start = Instant::now();
    let path = stored_path.to_path_buf();
    debug!("Dispatching {} as {}", path.display(), tag);

    let result = tokio::task::spawn_blocking(move || convert_blocking(&path, tag))
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task panicked: {}", e)))??;

    info!(
        "Converted {} in {}ms",
        tag,
        start.elapsed().as_millis()
    );
    Ok(result)
}

/// Blocking body of [`convert`].
fn convert_blocking(path: &Path, tag: FormatTag) -> Result<ConversionResult, ConvertError> {
    match tag {
        FormatTag::Pdf => pdf::repack_pdf(path).map(ConversionResult::Binary),
        FormatTag::Docx => {
            let text = docx::extract_raw_text(path)?;
            structured(path, &ExtractedText { text })
        }
        FormatTag::Xlsx => {
            let rows = xlsx::first_sheet_rows(path)?;
            Ok(ConversionResult::Structured(serde_json::Value::Array(rows)))
        }
        FormatTag::Unsupported => Err(ConvertError::UnsupportedFormat {
            filename: path.display().to_string(),
        }),
    }
}

fn structured<T: serde::Serialize>(path: &Path, value: &T) -> Result<ConversionResult, ConvertError> {
    ConversionResult::structured(value)
        .map_err(|e| ConvertError::Internal(format!("{}: serialisation failed: {e}", path.display())))
}

/// Convert a local file, classifying it by its own filename.
pub async fn convert_file(path: impl AsRef<Path>) -> Result<ConversionResult, ConvertError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tag = classify(&name);
    if !tag.is_supported() {
        return Err(ConvertError::UnsupportedFormat { filename: name });
    }
    if !path.exists() {
        return Err(ConvertError::io(
            PathBuf::from(path),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }
    convert(path, tag).await
}

/// Convert in-memory bytes whose original name was `original_filename`.
///
/// The bytes are spooled to a managed temp file that is removed on return.
pub async fn convert_from_bytes(
    bytes: &[u8],
    original_filename: &str,
) -> Result<ConversionResult, ConvertError> {
    let tag = classify(original_filename);
    if !tag.is_supported() {
        return Err(ConvertError::UnsupportedFormat {
            filename: original_filename.to_string(),
        });
    }

    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ConvertError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ConvertError::io(tmp.path(), e))?;
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(tmp.path(), tag).await
}
