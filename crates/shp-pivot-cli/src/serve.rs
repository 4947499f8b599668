//! HTTP upload server.
//!
//! GET  /                  upload page
//! POST /api/load          multipart `file` (+ `include_geometry`) -> status, summary, preview, widget table
//! GET  /api/widget-spec   saved widget view
//! PUT  /api/widget-spec   replace the saved widget view

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use shp_pivot_core::report::Level;
use shp_pivot_core::{
    AppConfig, ArchiveLoader, LoadOutcome, Preview, RecordStats, RenderError, StatusMessage,
    WidgetPayload, WidgetSpecStore,
};
use std::sync::Arc;

/// Application state shared across handlers.
pub struct AppState {
    pub loader: ArchiveLoader,
    pub config: AppConfig,
    pub specs: WidgetSpecStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            loader: ArchiveLoader::new(&config)?,
            specs: WidgetSpecStore::new(&config.widget.spec_path),
            config,
        })
    }
}

/// Start the HTTP server and run until Ctrl+C.
pub async fn run(addr: &str, config: AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");
    eprintln!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/api/load", post(load_handler))
        .route(
            "/api/widget-spec",
            get(get_spec_handler).put(put_spec_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// --- Handlers ---

const INDEX_HTML: &str = include_str!("index.html");

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub status: StatusMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RecordStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetPayload>,
    /// Set when the table loaded but could not be handed to the widget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_error: Option<StatusMessage>,
}

impl LoadResponse {
    fn status_only(status: StatusMessage) -> Self {
        Self {
            status,
            summary: None,
            preview: None,
            widget: None,
            render_error: None,
        }
    }
}

fn reply(code: StatusCode, body: LoadResponse) -> Response {
    (code, Json(body)).into_response()
}

fn bad_request(text: impl Into<String>) -> Response {
    reply(
        StatusCode::BAD_REQUEST,
        LoadResponse::status_only(StatusMessage {
            level: Level::Error,
            text: text.into(),
            hint: None,
        }),
    )
}

async fn load_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    let mut include_geometry = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("Error reading upload: {}", e)),
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => match field.bytes().await {
                Ok(bytes) => upload = Some(bytes),
                Err(e) => return bad_request(format!("Error reading upload: {}", e)),
            },
            "include_geometry" => match field.text().await {
                Ok(text) => include_geometry = is_checked(&text),
                Err(e) => return bad_request(format!("Error reading upload: {}", e)),
            },
            _ => {}
        }
    }

    let Some(bytes) = upload else {
        return bad_request("No file uploaded. Send the ZIP in a multipart field named 'file'.");
    };

    // Extraction and parsing are blocking file work.
    let worker = state.clone();
    let result =
        tokio::task::spawn_blocking(move || worker.loader.load(&bytes, include_geometry)).await;

    let outcome = match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "upload failed to load");
            return reply(
                StatusCode::UNPROCESSABLE_ENTITY,
                LoadResponse::status_only(StatusMessage::load_failed(&e)),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "load task panicked");
            return reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                LoadResponse::status_only(StatusMessage {
                    level: Level::Error,
                    text: format!("Internal error: {}", e),
                    hint: None,
                }),
            );
        }
    };

    let (code, body) = respond_to_outcome(&outcome, &state.config);
    reply(code, body)
}

/// Builds the response for a successful load call. The table and widget
/// stages fail independently: a widget failure keeps the summary and preview.
pub fn respond_to_outcome(outcome: &LoadOutcome, config: &AppConfig) -> (StatusCode, LoadResponse) {
    let rs = match outcome {
        LoadOutcome::Loaded(rs) => rs,
        LoadOutcome::NotFound => {
            return (
                StatusCode::NOT_FOUND,
                LoadResponse::status_only(StatusMessage::not_found()),
            )
        }
    };

    let mut body = LoadResponse {
        status: StatusMessage::loaded(rs.len()),
        summary: Some(rs.stats()),
        preview: Some(Preview::new(rs, config.loader.preview_rows)),
        widget: None,
        render_error: None,
    };
    match WidgetPayload::build(rs, &config.widget) {
        Ok(payload) => {
            body.widget = Some(payload);
            (StatusCode::OK, body)
        }
        Err(e @ RenderError::TooLarge { .. }) => {
            tracing::warn!(error = %e, "widget payload rejected");
            body.render_error = Some(StatusMessage::render_failed(&e));
            (StatusCode::PAYLOAD_TOO_LARGE, body)
        }
        Err(e @ RenderError::NoColumns) => {
            tracing::warn!(error = %e, "widget payload rejected");
            // Shrinking the upload would not help; there is nothing to pivot.
            body.render_error = Some(StatusMessage {
                hint: None,
                ..StatusMessage::render_failed(&e)
            });
            (StatusCode::UNPROCESSABLE_ENTITY, body)
        }
    }
}

fn is_checked(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

async fn get_spec_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.specs.read() {
        Ok(spec) => Json(spec).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, path = %state.specs.path().display(), "unreadable widget spec");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error reading widget spec: {}", e))
                .into_response()
        }
    }
}

async fn put_spec_handler(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<serde_json::Value>,
) -> Response {
    match state.specs.write(&spec) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error saving widget spec: {}", e),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::io::{Cursor, Write};
    use tower::ServiceExt;
    use zip::write::SimpleFileOptions;

    const BOUNDARY: &str = "shp-pivot-test-boundary";

    fn state(dir: &std::path::Path) -> Arc<AppState> {
        let mut config = AppConfig::default();
        config.widget.spec_path = dir.join("gw_config.json");
        Arc::new(AppState::new(config).unwrap())
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            w.start_file(*name, SimpleFileOptions::default()).unwrap();
            w.write_all(data).unwrap();
        }
        w.finish().unwrap().into_inner()
    }

    /// A `.shp` holding one point and nothing else.
    fn single_point_shp() -> Vec<u8> {
        let mut content = Vec::new();
        content.extend_from_slice(&1i32.to_le_bytes());
        content.extend_from_slice(&8.5f64.to_le_bytes());
        content.extend_from_slice(&47.4f64.to_le_bytes());

        let file_len = 100 + 8 + content.len();
        let mut out = Vec::new();
        out.extend_from_slice(&9994i32.to_be_bytes());
        out.extend_from_slice(&[0u8; 20]);
        out.extend_from_slice(&((file_len / 2) as i32).to_be_bytes());
        out.extend_from_slice(&1000i32.to_le_bytes());
        out.extend_from_slice(&1i32.to_le_bytes());
        out.extend_from_slice(&[0u8; 64]);
        out.extend_from_slice(&1i32.to_be_bytes());
        out.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        out.extend_from_slice(&content);
        out
    }

    fn upload(file: &[u8], include_geometry: bool) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"include_geometry\"\r\n\r\n{include_geometry}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload.zip\"\r\nContent-Type: application/zip\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/load")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn index_serves_upload_page() {
        let dir = tempfile::tempdir().unwrap();
        let resp = router(state(dir.path()))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_with_shapefile_returns_table() {
        let dir = tempfile::tempdir().unwrap();
        let archive = zip_of(&[("site/point.shp", &single_point_shp())]);
        let resp = router(state(dir.path()))
            .oneshot(upload(&archive, true))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"]["text"], "Data loaded successfully! Total rows: 1");
        assert_eq!(body["summary"]["rows"], 1);
        assert_eq!(body["widget"]["fields"][0]["semantic_type"], "geographic");
        assert!(body["widget"]["rows"][0]["geometry"]
            .as_str()
            .unwrap()
            .starts_with("POINT"));
    }

    #[tokio::test]
    async fn upload_without_shapefile_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let archive = zip_of(&[("notes.txt", b"hello")]);
        let resp = router(state(dir.path()))
            .oneshot(upload(&archive, false))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json_body(resp).await;
        assert_eq!(body["status"]["text"], "No valid .shp file found in the ZIP.");
        assert!(body.get("preview").is_none());
    }

    #[tokio::test]
    async fn upload_of_non_zip_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let resp = router(state(dir.path()))
            .oneshot(upload(b"definitely not a zip", false))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(resp).await;
        assert!(body["status"]["text"]
            .as_str()
            .unwrap()
            .starts_with("Error reading file:"));
    }

    #[tokio::test]
    async fn missing_file_field_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/api/load")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(format!("--{BOUNDARY}--\r\n")))
            .unwrap();
        let resp = router(state(dir.path())).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn widget_spec_is_saved_and_served() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(dir.path()));

        let resp = app
            .clone()
            .oneshot(Request::get("/api/widget-spec").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(resp).await, json!({}));

        let spec = json!({"config": [{"visId": "v1"}]});
        let resp = app
            .clone()
            .oneshot(
                Request::put("/api/widget-spec")
                    .header("content-type", "application/json")
                    .body(Body::from(spec.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app
            .oneshot(Request::get("/api/widget-spec").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(resp).await, spec);
        assert!(dir.path().join("gw_config.json").exists());
    }

    #[test]
    fn oversized_table_keeps_preview_and_reports_render_error() {
        let rs = shp_pivot_core::load(&zip_of(&[("p.shp", &single_point_shp())]), true)
            .unwrap();
        let mut config = AppConfig::default();
        config.widget.max_cells = 0;

        let (code, body) = respond_to_outcome(&rs, &config);
        assert_eq!(code, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body.preview.is_some());
        assert!(body.widget.is_none());
        let err = body.render_error.unwrap();
        assert!(err.text.starts_with("Failed to load visualization:"));
    }

    #[test]
    fn table_without_columns_is_unprocessable_without_size_hint() {
        // No .dbf and no geometry requested: rows exist but nothing to show.
        let outcome =
            shp_pivot_core::load(&zip_of(&[("p.shp", &single_point_shp())]), false).unwrap();

        let (code, body) = respond_to_outcome(&outcome, &AppConfig::default());
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.summary.as_ref().map(|s| s.rows), Some(1));
        let err = body.render_error.unwrap();
        assert!(err.text.starts_with("Failed to load visualization:"));
        assert_eq!(err.hint, None);
    }

    #[test]
    fn checkbox_values() {
        assert!(is_checked("on"));
        assert!(is_checked("True"));
        assert!(!is_checked(""));
        assert!(!is_checked("false"));
    }
}
