//! Error types for the docconv library.
//!
//! Two error types reflect the two sides of the wire:
//!
//! * [`ConvertError`]: raised on the server side while receiving, storing
//!   or converting an upload. Each variant belongs to one of two classes:
//!   **client faults** (unrecognised extension, malformed request) that map
//!   to a 4xx response, and **processing faults** (a format library could
//!   not parse the file, an I/O failure) that map to a 500.
//!
//! * [`ClientError`]: raised by [`crate::client`] before or after talking to
//!   the server: selection validation, transport failures, non-2xx replies.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while handling an upload.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Client faults ─────────────────────────────────────────────────────
    /// The original filename carries an extension no handler accepts.
    #[error("Unsupported file format: '{filename}'")]
    UnsupportedFormat { filename: String },

    /// The multipart body has no `file` field.
    #[error("No file uploaded: expected a multipart field named 'file'")]
    MissingFile,

    /// The multipart body could not be parsed.
    #[error("Invalid multipart request: {0}")]
    InvalidMultipart(String),

    /// The upload exceeded the configured body limit.
    #[error("Upload exceeds the maximum allowed size of {limit} bytes: {detail}")]
    PayloadTooLarge { limit: usize, detail: String },

    // ── Processing faults ─────────────────────────────────────────────────
    /// lopdf could not parse or re-serialise the document.
    #[error("PDF '{path}' could not be processed: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The DOCX package or its `word/document.xml` part is unreadable.
    #[error("DOCX '{path}' could not be processed: {detail}")]
    CorruptDocx { path: PathBuf, detail: String },

    /// calamine could not open the workbook or read its first sheet.
    #[error("XLSX '{path}' could not be processed: {detail}")]
    CorruptXlsx { path: PathBuf, detail: String },

    /// The workbook parsed but declares no sheets.
    #[error("XLSX '{path}' contains no worksheets")]
    EmptyWorkbook { path: PathBuf },

    /// Reading or writing transient storage failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Build an [`ConvertError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status this error maps to at the upload endpoint.
    pub fn status_code(&self) -> u16 {
        match self {
            ConvertError::UnsupportedFormat { .. }
            | ConvertError::MissingFile
            | ConvertError::InvalidMultipart(_) => 400,
            ConvertError::PayloadTooLarge { .. } => 413,
            _ => 500,
        }
    }

    /// `true` when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// The fixed, user-facing message for the JSON error body.
    pub fn public_message(&self) -> &'static str {
        match self {
            ConvertError::UnsupportedFormat { .. } => "Unsupported file format",
            ConvertError::MissingFile => "No file uploaded",
            ConvertError::InvalidMultipart(_) => "Invalid upload request",
            ConvertError::PayloadTooLarge { .. } => "File too large",
            _ => "Error processing file",
        }
    }

    /// Whether the underlying detail is included in the error body.
    ///
    /// The unsupported-format and missing-file bodies carry only `message`.
    pub fn exposes_detail(&self) -> bool {
        !matches!(
            self,
            ConvertError::UnsupportedFormat { .. } | ConvertError::MissingFile
        )
    }
}

/// Errors raised by the upload client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The selected file's MIME type is not PDF, DOCX or XLSX.
    #[error("Invalid file type '{mime}'. Please select a PDF, DOCX, or XLSX file.")]
    InvalidFileType { mime: String },

    /// The selected file is above the client-side size limit.
    #[error("File size {size} bytes exceeds {limit} bytes. Please select a smaller file.")]
    FileTooLarge { size: u64, limit: u64 },

    /// A conversion was requested with nothing selected.
    #[error("Please select a file!")]
    NoFileSelected,

    /// The requested conversion target is not one of the allowed tags.
    #[error("Invalid conversion type selected: '{target}'")]
    InvalidTargetType { target: String },

    /// A conversion is already in flight for this selection.
    #[error("A conversion is already in progress")]
    ConversionInFlight,

    /// Transport-level failure talking to the server.
    #[error("Upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// Local file system failure (reading the selection, saving the result).
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
