//! REST API for lesson progress.
//!
//! Endpoints:
//! - `GET /health`: health check
//! - `POST /lessons/{lesson_id}/progress`: submit a progress report
//! - `GET /lessons/{lesson_id}/progress`: stored progress for one lesson
//! - `GET /chapters/{chapter_id}/progress`: progress across a chapter
//!
//! Authentication happens upstream; the identity layer forwards the caller's
//! user id in the `x-user-id` header.


use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::progress::ProgressRecord;
use crate::services::{ProgressError, ProgressReport, ProgressService};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Start the REST server on the given address.
///
/// When the port is 0, the OS assigns an ephemeral port. The actual bound
/// port is always logged so it can be discovered.
pub async fn serve(
    service: ProgressService,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_port = listener.local_addr()?.port();
    info!(port = actual_port, "progress REST API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(service: ProgressService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/lessons/{lesson_id}/progress",
            get(get_progress).post(save_progress),
        )
        .route("/chapters/{chapter_id}/progress", get(get_chapter_progress))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn save_progress(
    State(service): State<ProgressService>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(lesson_id): Path<Uuid>,
    payload: Result<Json<ProgressReport>, JsonRejection>,
) -> Result<Json<ProgressRecord>, ApiError> {
    let Json(report) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let record = service.save_progress(user_id, lesson_id, &report).await?;
    Ok(Json(record))
}

async fn get_progress(
    State(service): State<ProgressService>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<ProgressRecord>, ApiError> {
    service
        .get_progress(user_id, lesson_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("no progress recorded for this lesson"))
}

async fn get_chapter_progress(
    State(service): State<ProgressService>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(chapter_id): Path<Uuid>,
) -> Result<Json<Vec<ProgressRecord>>, ApiError> {
    let records = service.get_chapter_progress(user_id, chapter_id).await?;
    Ok(Json(records))
}

// ============================================================================
// Authentication
// ============================================================================

/// Caller identity established by the upstream identity layer.
pub struct AuthenticatedUser(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(AuthenticatedUser)
            .ok_or(ApiError::Unauthenticated)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by the REST handlers.
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated,
    BadRequest(String),
    NotFound(&'static str),
    Progress(ProgressError),
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        ApiError::Progress(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                format!("missing or invalid {} header", USER_ID_HEADER),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message.to_string()),
            ApiError::Progress(err) => {
                let (status, kind) = match &err {
                    ProgressError::InvalidProgressReport { .. } => {
                        (StatusCode::BAD_REQUEST, "invalid_progress_report")
                    }
                    ProgressError::LessonNotFound(_) => (StatusCode::NOT_FOUND, "lesson_not_found"),
                    ProgressError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
                    ProgressError::StorageUnavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
                    }
                    ProgressError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
                };
                if status.is_server_error() {
                    error!(error = %err, "progress request failed");
                }
                (status, kind, err.to_string())
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}
