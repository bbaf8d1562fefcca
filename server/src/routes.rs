//! HTTP handlers over the job supervisor.

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use docenrich::{QueryError, ResultView, StatusSnapshot, SubmitError};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// Error answer with a `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn no_file() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "no file provided")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        let status = match e {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::AlreadyTerminal(_) => StatusCode::CONFLICT,
        };
        Self::new(status, e.to_string())
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        let status = match e {
            SubmitError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SubmitError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/status/{job_id}", get(job_status))
        .route("/api/result/{job_id}", get(job_result))
        .route("/api/jobs/{job_id}", delete(cancel_job))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "active_jobs": state.supervisor.active_jobs(),
    }))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "Skipping form field");
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = match upload {
        Some((filename, bytes)) if !bytes.is_empty() => (filename, bytes),
        _ => return Err(ApiError::no_file()),
    };

    let job_id = state.supervisor.submit(bytes.to_vec(), &filename).map_err(|e| {
        warn!(error = %e, "Upload rejected");
        ApiError::from(e)
    })?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    Ok(Json(state.supervisor.status(&job_id)?))
}

async fn job_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let response = match state.supervisor.result(&job_id)? {
        ResultView::Done(result) => (StatusCode::OK, Json(result)).into_response(),
        ResultView::Pending { status } => (
            StatusCode::ACCEPTED,
            Json(StatusSnapshot {
                status,
                error: None,
            }),
        )
            .into_response(),
        ResultView::Failed { status, error } => (
            StatusCode::ACCEPTED,
            Json(StatusSnapshot {
                status,
                error: Some(error),
            }),
        )
            .into_response(),
    };

    Ok(response)
}

async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    Ok(Json(state.supervisor.cancel(&job_id)?))
}
