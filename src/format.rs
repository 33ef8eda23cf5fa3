//! Format inspection: map a filename (or MIME type) to a [`FormatTag`].
//!
//! Classification is by extension only. File contents are never sniffed,
//! so a mislabelled file is routed by its name and fails later in the
//! handler that cannot parse it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Closed set of upload types the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Pdf,
    Docx,
    Xlsx,
    Unsupported,
}

/// Tags a client may select or request a conversion for.
pub const SUPPORTED_FORMATS: [FormatTag; 3] = [FormatTag::Pdf, FormatTag::Docx, FormatTag::Xlsx];

impl FormatTag {
    /// Lower-case extension without the dot; `None` for [`FormatTag::Unsupported`].
    pub fn extension(self) -> Option<&'static str> {
        match self {
            FormatTag::Pdf => Some("pdf"),
            FormatTag::Docx => Some("docx"),
            FormatTag::Xlsx => Some("xlsx"),
            FormatTag::Unsupported => None,
        }
    }

    pub fn is_supported(self) -> bool {
        self != FormatTag::Unsupported
    }

    /// Parse a bare tag such as `"pdf"` or `"XLSX"`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pdf" => FormatTag::Pdf,
            "docx" => FormatTag::Docx,
            "xlsx" => FormatTag::Xlsx,
            _ => FormatTag::Unsupported,
        }
    }

    /// Map a MIME type to a tag.
    ///
    /// Accepts the registered Office Open XML types as well as the short
    /// `*/pdf`, `*/docx`, `*/xlsx` subtypes some browsers report.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => FormatTag::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                FormatTag::Docx
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => FormatTag::Xlsx,
            other => match other.split_once('/') {
                Some((_, subtype)) => FormatTag::from_name(subtype),
                None => FormatTag::Unsupported,
            },
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension().unwrap_or("unsupported"))
    }
}

/// Classify an original upload filename by its extension, case-insensitively.
///
/// Names without an extension, and dot-files such as `.pdf`, are unsupported.
pub fn classify(original_filename: &str) -> FormatTag {
    Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(FormatTag::from_name)
        .unwrap_or(FormatTag::Unsupported)
}
