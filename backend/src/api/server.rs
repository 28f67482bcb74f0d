//! HTTP server for the dashboard data API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | POST   | `/api/upload`     | Upload a JSON, Excel or CSV file         |
//! | GET    | `/api/data`       | Current dashboard model                  |
//! | GET    | `/api/validate`   | Data-quality issues of the current model |
//! | GET    | `/api/export`     | Download the current model as JSON       |
//! | GET    | `/api/template`   | Download the blank Excel template        |
//! | GET    | `/api/status`     | Current status message                   |
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_status, LOG_BROADCASTER};
use super::types::{error_response, StatusResponse, UploadResponse, ValidationResponse};
use crate::config::{DashboardConfig, MAX_UPLOAD_BYTES};
use crate::error::{DecodeError, ExportError, IngestError, ServerResult};
use crate::export::{export_state, template_file, ExportFile};
use crate::state::{DashboardState, RenderHooks, Severity, StatusBoard};
use crate::transform::pipeline::{commit_upload, prepare_upload, UploadedFile};
use crate::validation::validate_value;

type ApiError = (StatusCode, Json<Value>);

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<RwLock<DashboardState>>,
    pub status: Arc<StatusBoard>,
    pub config: Arc<DashboardConfig>,
    pub hooks: RenderHooks,
}

impl AppState {
    /// Fresh state with hooks that log refreshes and route notifications to the status board.
    pub fn new(config: DashboardConfig) -> Self {
        let status = Arc::new(StatusBoard::new(config.status_ttl));
        let notify_board = status.clone();

        let hooks = RenderHooks::none()
            .with_refresh(|| log_info("🔄 Refreshing all dashboard sections"))
            .with_refresh_overview(|| log_info("🔄 Refreshing overview section"))
            .with_notify(move |message, severity| {
                notify_board.show(message, severity);
                log_status(message, severity);
            });

        Self {
            dashboard: Arc::new(RwLock::new(DashboardState::new())),
            status,
            config: Arc::new(config),
            hooks,
        }
    }

    fn report(&self, message: &str, severity: Severity) {
        self.status.show(message, severity);
        log_status(message, severity);
    }
}

pub fn router(app: AppState) -> Router {
    // Permissive CORS for the dashboard page.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/data", get(current_data))
        .route("/api/validate", get(validate_current))
        .route("/api/export", get(export_current))
        .route("/api/template", get(download_template))
        .route("/api/status", get(current_status))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(app)
}

/// Start the HTTP server
pub async fn start_server(config: DashboardConfig) -> ServerResult<()> {
    let port = config.port;
    let app = router(AppState::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Salesload server running on http://localhost:{}", port);
    println!("   POST /api/upload   - Upload JSON / Excel / CSV");
    println!("   GET  /api/data     - Current dashboard data");
    println!("   GET  /api/export   - Download current data");
    println!("   GET  /api/template - Download Excel template");
    println!("   GET  /api/logs     - SSE log stream");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "salesload",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers just miss entries.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn upload(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, Json(error_response(&format!("Multipart error: {}", e))))
    })? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| {
                (StatusCode::BAD_REQUEST, Json(error_response(&format!("Read error: {}", e))))
            })?;
            file = Some(UploadedFile::new(name, bytes.to_vec()));
        }
    }

    handle_upload(&app, file).await.map(Json)
}

/// Run one upload against the shared state, reporting through the status board.
pub async fn handle_upload(
    app: &AppState,
    file: Option<UploadedFile>,
) -> Result<UploadResponse, ApiError> {
    let Some(file) = file else {
        return Err(upload_failed(app, IngestError::MissingInput));
    };

    app.report("Processing file...", Severity::Info);

    // Decoding a large workbook is CPU-bound.
    let config = app.config.clone();
    let prepared = tokio::task::spawn_blocking(move || prepare_upload(&file, &config))
        .await
        .map_err(|e| {
            let message = format!("Upload task failed: {}", e);
            app.report(&message, Severity::Error);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&message)))
        })?
        .map_err(|e| upload_failed(app, e))?;
    let kind = prepared.report.kind.clone();

    let report = {
        let mut dashboard = app.dashboard.write().await;
        commit_upload(&mut dashboard, &app.hooks, prepared)
    };

    let message = format!("{} data loaded successfully!", kind);
    app.report(&message, Severity::Success);
    Ok(UploadResponse::new(message, report))
}

fn upload_failed(app: &AppState, err: IngestError) -> ApiError {
    let code = match &err {
        IngestError::MissingInput => StatusCode::BAD_REQUEST,
        IngestError::Decode(DecodeError::UnsupportedKind(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        IngestError::Decode(DecodeError::Io(_)) | IngestError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        IngestError::Decode(DecodeError::Format { .. }) | IngestError::Schema(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    let message = err.to_string();
    app.report(&message, Severity::Error);
    (code, Json(error_response(&message)))
}

async fn current_data(State(app): State<AppState>) -> Result<Json<Value>, ApiError> {
    app.dashboard
        .read()
        .await
        .snapshot()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(error_response("No data loaded yet"))))
}

async fn validate_current(State(app): State<AppState>) -> Json<ValidationResponse> {
    let dashboard = app.dashboard.read().await;
    let issues = dashboard
        .snapshot()
        .map(|model| validate_value(&model))
        .unwrap_or_else(|| vec!["No branches in data".to_string()]);
    Json(ValidationResponse::new(dashboard.revision(), issues))
}

async fn export_current(State(app): State<AppState>) -> Result<Response, ApiError> {
    let today = chrono::Local::now().date_naive();
    let result = export_state(&*app.dashboard.read().await, &app.config, today);

    match result {
        Ok(file) => {
            app.report("Data exported successfully!", Severity::Success);
            Ok(attachment(file))
        }
        Err(err) => {
            let code = match err {
                ExportError::NoData => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            app.report(&err.to_string(), Severity::Error);
            Err((code, Json(error_response(&err.to_string()))))
        }
    }
}

async fn download_template(State(app): State<AppState>) -> Result<Response, ApiError> {
    match template_file(&app.config) {
        Ok(file) => {
            app.report("Blank Excel template downloaded!", Severity::Success);
            Ok(attachment(file))
        }
        Err(err) => {
            log_error(format!("Template generation failed: {}", err));
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&err.to_string()))))
        }
    }
}

async fn current_status(State(app): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: app.status.current(),
    })
}

fn attachment(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Branch,Month,Year,Sales,Orders\nHamdan,Jan,2024,500,10\n";

    fn app() -> AppState {
        AppState::new(DashboardConfig::default())
    }

    #[tokio::test]
    async fn test_upload_updates_state_and_status() {
        let app = app();
        let response = handle_upload(&app, Some(UploadedFile::new("sales.csv", CSV)))
            .await
            .unwrap();

        assert_eq!(response.status, "ready");
        assert_eq!(response.message, "CSV data loaded successfully!");
        assert_eq!(app.dashboard.read().await.revision(), 1);

        let status = app.status.current().unwrap();
        assert_eq!(status.severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_bad_upload_keeps_previous_data() {
        let app = app();
        handle_upload(&app, Some(UploadedFile::new("sales.csv", CSV))).await.unwrap();

        let (code, _) = handle_upload(&app, Some(UploadedFile::new("broken.xlsx", b"PK\x03\x04".to_vec())))
            .await
            .unwrap_err();

        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app.dashboard.read().await.revision(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_bad_request() {
        let app = app();
        let (code, body) = handle_upload(&app, None).await.unwrap_err();

        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["status"], "error");
        assert_eq!(app.status.current().unwrap().severity, Severity::Error);
        assert!(app.dashboard.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_kind_status_code() {
        let app = app();
        let (code, _) = handle_upload(&app, Some(UploadedFile::new("slides.pptx", vec![1, 2, 3])))
            .await
            .unwrap_err();
        assert_eq!(code, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_data_and_export_require_upload() {
        let app = app();
        let (code, _) = current_data(State(app.clone())).await.unwrap_err();
        assert_eq!(code, StatusCode::NOT_FOUND);

        let (code, _) = export_current(State(app.clone())).await.unwrap_err();
        assert_eq!(code, StatusCode::NOT_FOUND);

        handle_upload(&app, Some(UploadedFile::new("sales.csv", CSV))).await.unwrap();
        let Json(data) = current_data(State(app.clone())).await.unwrap();
        assert_eq!(data["data2024"]["sales"]["Hamdan"][0], 500.0);

        let response = export_current(State(app)).await.unwrap();
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"crispy-chicken-data-"));
    }

    #[tokio::test]
    async fn test_validate_endpoint() {
        let app = app();
        let Json(empty) = validate_current(State(app.clone())).await;
        assert_eq!(empty.issues, vec!["No branches in data"]);

        let csv = "Branch,Month,Year,Sales,Orders\nHamdan,Mar,2025,0,4\n";
        handle_upload(&app, Some(UploadedFile::new("s.csv", csv))).await.unwrap();
        let Json(result) = validate_current(State(app)).await;
        assert_eq!(result.issues, vec!["Hamdan Mar: orders without sales in 2025"]);
        assert_eq!(result.revision, 1);
    }

    #[tokio::test]
    async fn test_template_download() {
        let response = download_template(State(app())).await.unwrap();
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("spreadsheetml"));
    }
}
