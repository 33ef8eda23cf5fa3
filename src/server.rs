//! HTTP upload endpoint.
//!
//! ```text
//! POST /api/upload  (multipart, field "file")
//!   │
//!   ├─ spool field to a TransientUpload in `upload_dir`
//!   ├─ classify(original filename) → FormatTag
//!   ├─ convert(stored path, tag)
//!   ├─ drop TransientUpload (file removed on every path)
//!   └─ 200 PDF bytes | 200 JSON | 400/413/500 JSON error
//! GET /health
//! ```
//!
//! The handler is the only error boundary: every [`ConvertError`] becomes a
//! JSON body of the shape `{ "message": …, "error"?: … }`.

use crate::config::ServerConfig;
use crate::convert::convert;
use crate::error::ConvertError;
use crate::format::classify;
use crate::output::ConversionResult;
use crate::pipeline::storage::TransientUpload;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the API router.
pub fn build_router(config: ServerConfig) -> Router {
    let body_limit = config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors = config.cors_permissive;
    let state = AppState::new(config);

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http());

    let router = if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Create the upload directory, bind, and serve until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<(), ConvertError> {
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| ConvertError::io(&config.upload_dir, e))?;

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ConvertError::Internal(format!("Failed to bind {addr}: {e}")))?;

    info!(
        "Listening on {} (uploads in {}, limit {} bytes)",
        addr,
        config.upload_dir.display(),
        config.max_upload_bytes
    );

    axum::serve(listener, build_router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConvertError::Internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/upload`
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ConvertError> {
    let upload = receive_upload(&state.config, &mut multipart).await?;
    let tag = classify(upload.original_filename());
    info!(
        filename = upload.original_filename(),
        size = upload.size(),
        mime = ?upload.mime_hint(),
        format = %tag,
        "Received upload"
    );

    let result = convert(upload.path(), tag).await;
    drop(upload);

    Ok(into_http_response(result?))
}

/// Spool the single `file` field into transient storage.
///
/// Other fields are ignored. A second `file` field is rejected.
async fn receive_upload(
    config: &ServerConfig,
    multipart: &mut Multipart,
) -> Result<TransientUpload, ConvertError> {
    let limit = config.max_upload_bytes;
    let mut upload: Option<TransientUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error(limit))? {
        if field.name() != Some(FILE_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        if upload.is_some() {
            return Err(ConvertError::InvalidMultipart(format!(
                "expected a single '{FILE_FIELD}' field"
            )));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().map(str::to_string);
        let mut stored = TransientUpload::create_in(&config.upload_dir, filename, mime)?;

        while let Some(chunk) = field.chunk().await.map_err(multipart_error(limit))? {
            if stored.size() + chunk.len() as u64 > limit as u64 {
                warn!(
                    size = stored.size() + chunk.len() as u64,
                    limit,
                    "File size limit exceeded, aborting upload"
                );
                return Err(ConvertError::PayloadTooLarge {
                    limit,
                    detail: format!(
                        "File size exceeds maximum allowed size of {} bytes ({} MB)",
                        limit,
                        limit / (1024 * 1024)
                    ),
                });
            }
            stored.write_chunk(&chunk).await?;
        }
        stored.finish().await?;
        upload = Some(stored);
    }

    upload.ok_or(ConvertError::MissingFile)
}

fn multipart_error(limit: usize) -> impl Fn(axum::extract::multipart::MultipartError) -> ConvertError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ConvertError::PayloadTooLarge {
                limit,
                detail: e.body_text(),
            }
        } else {
            ConvertError::InvalidMultipart(e.body_text())
        }
    }
}

fn into_http_response(result: ConversionResult) -> Response {
    match result {
        ConversionResult::Binary(payload) => {
            let headers = [
                (header::CONTENT_TYPE, payload.content_type.to_string()),
                (header::CONTENT_DISPOSITION, payload.content_disposition()),
            ];
            (headers, payload.bytes).into_response()
        }
        ConversionResult::Structured(value) => Json(value).into_response(),
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            debug!("Client error: {}", self);
        } else {
            error!("Error processing file: {:#}", self);
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = if self.exposes_detail() {
            json!({ "message": self.public_message(), "error": self.to_string() })
        } else {
            json!({ "message": self.public_message() })
        };

        (status, Json(body)).into_response()
    }
}
