//! Upload client: file selection, one conversion request per click, result saving.
//!
//! ```text
//! select(path) ──▶ SelectedFile (MIME + size checked locally)
//!      │
//! begin_convert(target) ──▶ loading = true
//!      │
//! UploadClient::upload ──▶ POST multipart "file" ──▶ UploadResponse
//!      │
//! finish_convert(ok) ──▶ loading = false, converted = ok
//!      │
//! save_result / preview_result
//! ```
//!
//! A selection that fails validation never produces a request.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::format::FormatTag;
use crate::server::FILE_FIELD;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest file the client will send (10 MiB).
pub const MAX_CLIENT_FILE_BYTES: u64 = 10_485_760;

/// A local file that passed the type and size checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime: String,
    format: FormatTag,
}

impl SelectedFile {
    /// Stat `path`, infer its MIME type from the name, and validate both.
    pub fn inspect(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| ClientError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        let format = validate_selection(&mime, meta.len())?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: meta.len(),
            mime,
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn format(&self) -> FormatTag {
        self.format
    }
}

/// Check a reported MIME type and size against what the server accepts.
pub fn validate_selection(mime: &str, size: u64) -> Result<FormatTag, ClientError> {
    let format = FormatTag::from_mime(mime);
    if !format.is_supported() {
        return Err(ClientError::InvalidFileType {
            mime: mime.to_string(),
        });
    }
    if size > MAX_CLIENT_FILE_BYTES {
        return Err(ClientError::FileTooLarge {
            size,
            limit: MAX_CLIENT_FILE_BYTES,
        });
    }
    Ok(format)
}

/// Selection state for one upload form.
#[derive(Debug, Default)]
pub struct ClientSelection {
    file: Option<SelectedFile>,
    preview: Option<PathBuf>,
    converted: bool,
    loading: bool,
    preview_visible: bool,
}

impl ClientSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a file. On error the previous state is kept as is.
    pub fn select(&mut self, path: impl AsRef<Path>) -> Result<&SelectedFile, ClientError> {
        let file = SelectedFile::inspect(path)?;
        debug!("Selected {} ({} bytes, {})", file.name, file.size, file.mime);

        self.preview = Some(file.path.clone());
        self.converted = false;
        self.preview_visible = false;
        Ok(self.file.insert(file))
    }

    /// Start a conversion towards `target` (`pdf`, `docx` or `xlsx`).
    ///
    /// Fails while another conversion is still loading.
    pub fn begin_convert(&mut self, target: &str) -> Result<FormatTag, ClientError> {
        if self.loading {
            return Err(ClientError::ConversionInFlight);
        }
        if self.file.is_none() {
            return Err(ClientError::NoFileSelected);
        }
        let tag = FormatTag::from_name(target);
        if !tag.is_supported() {
            return Err(ClientError::InvalidTargetType {
                target: target.to_string(),
            });
        }
        self.loading = true;
        Ok(tag)
    }

    pub fn finish_convert(&mut self, success: bool) {
        self.loading = false;
        self.converted = success;
    }

    /// Make the local preview visible, returning its path.
    pub fn show_preview(&mut self) -> Option<&Path> {
        let preview = self.preview.as_deref()?;
        self.preview_visible = true;
        Some(preview)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_converted(&self) -> bool {
        self.converted
    }

    pub fn is_preview_visible(&self) -> bool {
        self.preview_visible
    }
}

/// A successful response from the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl UploadResponse {
    pub fn is_json(&self) -> bool {
        self.content_type.starts_with("application/json")
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.starts_with("application/pdf")
    }

    /// Name to save the body under, chosen from what the server returned.
    pub fn result_filename(&self) -> &'static str {
        if self.is_pdf() {
            "converted.pdf"
        } else if self.is_json() {
            "converted.json"
        } else {
            "converted.bin"
        }
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// HTTP client for `POST /api/upload`.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl UploadClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `file` as the multipart `file` field.
    pub async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse, ClientError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ClientError::Io {
                path: file.path.clone(),
                source: e,
            })?;
        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = Form::new().part(FILE_FIELD, part);

        info!("Uploading {} to {}", file.name, self.config.server_url);
        let response = self
            .http
            .post(&self.config.server_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            let message = server_message(&body);
            warn!("Upload of {} failed: {} {}", file.name, status, message);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Received {} bytes of {}", body.len(), content_type);
        Ok(UploadResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    /// Run one convert action on `selection`, keeping its flags in step.
    pub async fn convert(
        &self,
        selection: &mut ClientSelection,
        target: &str,
    ) -> Result<UploadResponse, ClientError> {
        selection.begin_convert(target)?;
        let result = match selection.selected() {
            Some(file) => self.upload(file).await,
            None => Err(ClientError::NoFileSelected),
        };
        selection.finish_convert(result.is_ok());
        result
    }
}

/// Pull a readable message out of an error body.
fn server_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(v) => {
            let message = v["message"].as_str().unwrap_or("Error converting file");
            match v["error"].as_str() {
                Some(detail) => format!("{message}: {detail}"),
                None => message.to_string(),
            }
        }
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

/// Write the response body into `output_dir` and return the saved path.
pub async fn save_result(
    response: &UploadResponse,
    output_dir: &Path,
) -> Result<PathBuf, ClientError> {
    let path = output_dir.join(response.result_filename());
    tokio::fs::write(&path, &response.body)
        .await
        .map_err(|e| ClientError::Io {
            path: path.clone(),
            source: e,
        })?;
    info!("Saved {} bytes to {}", response.body.len(), path.display());
    Ok(path)
}

/// Render a structured response for display. Binary bodies have no preview.
pub fn preview_result(response: &UploadResponse) -> Option<String> {
    if !response.is_json() {
        return None;
    }
    let rendered = response
        .json()
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).to_string());
    Some(rendered)
}
