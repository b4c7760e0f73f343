// Browser UI server.
//
// Serves the upload page, runs an analysis per form submission and keeps the
// latest export in memory so the download link can fetch it.

use crate::html::{render_page, Banner};
use crate::output::{to_xlsx_bytes, EXPORT_FILE_NAME, XLSX_MIME};
use crate::reports::{run_analysis, AnalysisInput, AnalysisResult, Upload};
use crate::RiskError;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Upload limit per request; three spreadsheets comfortably fit.
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone, Default)]
pub struct AppState {
    /// Workbook bytes of the most recent successful run
    last_export: Arc<RwLock<Option<Vec<u8>>>>,
}

/// Create the application router
pub fn create_app() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/analyze", post(analyze_handler))
        .route("/download", get(download_handler))
        .route("/health", get(health_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(AppState::default())
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app()).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "revenue-risk",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn index_handler() -> Html<String> {
    Html(render_page(None, None))
}

/// The three form fields, each present only if a non-empty file was sent.
#[derive(Debug, Default)]
struct FormUploads {
    ar_file: Option<Upload>,
    billing_file: Option<Upload>,
    contract_file: Option<Upload>,
}

impl FormUploads {
    async fn read(multipart: &mut Multipart) -> Result<Self, axum::extract::multipart::MultipartError> {
        let mut uploads = FormUploads::default();
        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            // Browsers send an empty part for a picker left blank.
            if bytes.is_empty() {
                continue;
            }
            let upload = Some(Upload {
                name: file_name,
                bytes: bytes.to_vec(),
            });
            match field_name.as_str() {
                "ar_file" => uploads.ar_file = upload,
                "billing_file" => uploads.billing_file = upload,
                "contract_file" => uploads.contract_file = upload,
                _ => {}
            }
        }
        Ok(uploads)
    }

    fn into_input(self) -> Option<AnalysisInput> {
        Some(AnalysisInput {
            ar_aging: self.ar_file?,
            billing: self.billing_file?,
            contract: self.contract_file?,
        })
    }
}

async fn analyze_handler(State(state): State<AppState>, mut multipart: Multipart) -> Html<String> {
    let uploads = match FormUploads::read(&mut multipart).await {
        Ok(u) => u,
        Err(e) => {
            warn!(error = %e, "could not read upload form");
            *state.last_export.write().await = None;
            return Html(render_page(Some(&Banner::processing_error(e)), None));
        }
    };
    let Some(input) = uploads.into_input() else {
        return Html(render_page(Some(&Banner::missing_files()), None));
    };

    let outcome = tokio::task::spawn_blocking(move || {
        analyze_and_export(&input).map_err(|e| e.to_string())
    })
    .await
    .unwrap_or_else(|join_err| Err(join_err.to_string()));

    match outcome {
        Ok((result, bytes)) => {
            *state.last_export.write().await = Some(bytes);
            Html(render_page(Some(&Banner::Success), Some(&result)))
        }
        Err(cause) => {
            warn!(%cause, "risk analysis failed");
            *state.last_export.write().await = None;
            Html(render_page(Some(&Banner::processing_error(cause)), None))
        }
    }
}

/// The full run: nothing is kept unless both the analysis and the export succeed.
fn analyze_and_export(input: &AnalysisInput) -> Result<(AnalysisResult, Vec<u8>), RiskError> {
    let result = run_analysis(input)?;
    let bytes = to_xlsx_bytes(&result.table)?;
    Ok((result, bytes))
}

async fn download_handler(State(state): State<AppState>) -> Response {
    match state.last_export.read().await.clone() {
        Some(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "No analysis results to download yet.").into_response(),
    }
}
