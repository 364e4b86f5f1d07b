//! HTTP surface: preview, export and download of rendered documents, plus the
//! writing helpers under `/api/assist`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::assist::{self, JobFit, SkillSuggestions, SkillsRequest, Summary, SummaryRequest, TailorRequest};
use crate::error::RenderError;
use crate::record::RawRecord;
use crate::render::{artifact_name, is_valid_identity, ArtifactStore, DocumentRenderer, PDF_CONTENT_TYPE};

// ============================================================================
// STATE
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<DocumentRenderer>,
    pub store: Arc<ArtifactStore>,
}

impl AppState {
    pub fn new(renderer: DocumentRenderer, store: ArtifactStore) -> Self {
        AppState { renderer: Arc::new(renderer), store: Arc::new(store) }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Handler error. Rendered as `{"error":{"code","message"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::Render(RenderError::InvalidIdentity(id)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("invalid document id {id:?}"),
            ),
            ApiError::Render(e @ RenderError::OutputIo(_)) => {
                tracing::error!("Output error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OUTPUT_ERROR",
                    "The document could not be stored".to_string(),
                )
            }
            ApiError::Render(e) => {
                tracing::error!("Render error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "The document could not be rendered".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvpress"
    }))
}

/// POST /api/cv/preview
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<RawRecord>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(record) = payload?;
    let renderer = state.renderer.clone();
    let doc = tokio::task::spawn_blocking(move || renderer.inline(&record))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (header::CONTENT_DISPOSITION, doc.disposition),
        ],
        doc.bytes,
    )
        .into_response())
}

/// POST /api/cv/:id/export
async fn export_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RawRecord>, JsonRejection>,
) -> Result<Response, ApiError> {
    validate_id(&id)?;
    let Json(record) = payload?;

    let renderer = state.renderer.clone();
    let store = state.store.clone();
    let key = id.clone();
    let (_, bytes) = tokio::task::spawn_blocking(move || renderer.export(&record, &key, &store))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    info!(id = %id, bytes = bytes.len(), "exported document");
    Ok(attachment(&id, bytes))
}

/// GET /api/cv/:id/export
async fn download_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    validate_id(&id)?;

    let store = state.store.clone();
    let key = id.clone();
    let bytes = tokio::task::spawn_blocking(move || store.read(&key))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??
        .ok_or_else(|| ApiError::NotFound(format!("no exported document for {id}")))?;

    Ok(attachment(&id, bytes))
}

/// POST /api/assist/suggest-skills
async fn suggest_skills_handler(
    payload: Result<Json<SkillsRequest>, JsonRejection>,
) -> Result<Json<SkillSuggestions>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(assist::suggest_skills(&request)))
}

/// POST /api/assist/generate-summary
async fn generate_summary_handler(
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<Summary>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(assist::generate_summary(&request)))
}

/// POST /api/assist/tailor-for-job
async fn tailor_for_job_handler(
    payload: Result<Json<TailorRequest>, JsonRejection>,
) -> Result<Json<JobFit>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(assist::tailor_for_job(&request)))
}

fn validate_id(id: &str) -> Result<(), ApiError> {
    if is_valid_identity(id) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "document id must be letters, digits, '-' or '_', got {id:?}"
        )))
    }
}

fn attachment(id: &str, bytes: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact_name(id)),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/cv/preview", post(preview_handler))
        .route("/api/cv/:id/export", post(export_handler).get(download_handler))
        .route("/api/assist/suggest-skills", post(suggest_skills_handler))
        .route("/api/assist/generate-summary", post(generate_summary_handler))
        .route("/api/assist/tailor-for-job", post(tailor_for_job_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(dir: &std::path::Path) -> Router {
        build_router(AppState::new(DocumentRenderer::default(), ArtifactStore::new(dir)))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "cvpress");
    }

    #[tokio::test]
    async fn test_preview_returns_inline_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(json_request("POST", "/api/cv/preview", json!({ "_id": "abc", "nom": "Dupont" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"cv-abc.pdf\""
        );
        assert!(body_bytes(response).await.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_then_download() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path());

        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/cv/abc123/export", json!({ "nom": "Dupont" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"cv-abc123.pdf\""
        );
        let exported = body_bytes(response).await;
        assert!(dir.path().join("cv-abc123.pdf").exists());

        let response = router
            .oneshot(Request::builder().uri("/api/cv/abc123/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, exported);
    }

    #[tokio::test]
    async fn test_error_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path());

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/api/cv/missing/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let response = router
            .oneshot(json_request("POST", "/api/cv/bad.id/export", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path());

        let request = Request::builder()
            .method("POST")
            .uri("/api/cv/preview")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let request = Request::builder()
            .method("POST")
            .uri("/api/cv/abc/export")
            .body(Body::from("{}"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(!dir.path().join("cv-abc.pdf").exists());
    }

    #[tokio::test]
    async fn test_assist_routes() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path());

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/assist/suggest-skills",
                json!({ "resume": "SQL et Python", "targetRole": "design" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            body["skills"],
            json!(["Figma", "UI/UX", "Prototypage", "Design System", "Accessibility", "Python", "SQL"])
        );

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/assist/generate-summary",
                json!({ "prenom": "Jean", "nom": "Dupont", "years": 3, "lastRole": "Dev" }),
            ))
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body["summary"].as_str().unwrap().starts_with("Jean Dupont — 3 ans"));

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/assist/tailor-for-job",
                json!({ "skills": ["Rust", "Figma"], "jobDescription": "Rust backend" }),
            ))
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["matched"], json!(["Rust"]));
        assert_eq!(body["missing"], json!(["Figma"]));
        assert_eq!(body["recommendations"], json!(["Rust"]));
    }
}
