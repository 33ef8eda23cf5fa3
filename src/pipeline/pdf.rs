//! PDF round-trip: parse the whole document with lopdf and write it back out.
//!
//! The page tree and content streams are untouched; only the file's
//! internal layout (object order, xref table) is normalised by re-emitting.

use crate::error::ConvertError;
use crate::output::BinaryPayload;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, info};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const PDF_FILENAME: &str = "converted.pdf";

/// Load `path` fully into memory and re-serialise it.
///
/// Blocking; call from `spawn_blocking`.
pub fn repack_pdf(path: &Path) -> Result<BinaryPayload, ConvertError> {
    let mut document = Document::load(path).map_err(|e| ConvertError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let page_count = document.get_pages().len();
    debug!(
        "PDF loaded: version {}, {} pages, {} objects",
        document.version,
        page_count,
        document.objects.len()
    );

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| ConvertError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("re-serialisation failed: {e}"),
        })?;

    info!("Re-packed PDF: {} pages, {} bytes", page_count, bytes.len());

    Ok(BinaryPayload {
        bytes,
        content_type: PDF_CONTENT_TYPE,
        filename: PDF_FILENAME,
    })
}
