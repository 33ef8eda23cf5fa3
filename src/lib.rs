//! # docconv
//!
//! Upload a PDF, DOCX or XLSX document over HTTP and get back a converted
//! form of it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! multipart upload
//!  │
//!  ├─ 1. Store     spool field "file" to a uniquely named transient file
//!  ├─ 2. Classify  original filename extension → FormatTag
//!  ├─ 3. Convert   one handler, on the blocking pool
//!  │      ├─ pdf   parse + re-serialise        → application/pdf, converted.pdf
//!  │      ├─ docx  raw text                    → { "text": … }
//!  │      └─ xlsx  first sheet, header → cell  → [ { … }, … ]
//!  ├─ 4. Respond   bytes with Content-Disposition, or JSON
//!  └─ 5. Cleanup   transient file removed on every exit path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docconv::{convert_file, ConversionResult};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     match convert_file("people.xlsx").await? {
//!         ConversionResult::Structured(rows) => println!("{rows:#}"),
//!         ConversionResult::Binary(pdf) => eprintln!("{} bytes", pdf.bytes.len()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Serving the endpoint:
//!
//! ```rust,no_run
//! use docconv::{start_server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().port(5000).upload_dir("uploads").build()?;
//!     start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{
    preview_result, save_result, ClientSelection, SelectedFile, UploadClient, UploadResponse,
    MAX_CLIENT_FILE_BYTES,
};
pub use config::{ClientConfig, ServerConfig, ServerConfigBuilder, DEFAULT_MAX_UPLOAD_BYTES};
pub use convert::{convert, convert_file, convert_from_bytes};
pub use error::{ClientError, ConvertError};
pub use format::{classify, FormatTag, SUPPORTED_FORMATS};
pub use output::{BinaryPayload, ConversionResult, ExtractedText};
pub use server::{build_router, start_server};
