//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/captures` | Capture free text; `201` with the saved record |
//! | `GET`  | `/entries?type=&status=` | Entries of the caller, newest first |
//! | `GET`  | `/entries/{id}` | One entry |
//! | `PATCH` | `/entries/{id}/status` | Move an entry to another column |
//! | `POST` | `/entries/{id}/checklist/{index}` | Toggle one checklist item |
//! | `GET`  | `/goals` | Goals of the caller |
//! | `POST` | `/goals/{id}/progress` | Record progress on a goal |
//! | `GET`  | `/categories` | All categories |
//!
//! # Session
//!
//! The caller is identified by the `x-user-id` header. An
//! `Authorization: Bearer <token>` header, when present, is forwarded to
//! the classifier as the session's access token. Requests without a user
//! get `401`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "capture text is empty" } }
//! ```
//!
//! Error codes: `unauthenticated` (401), `bad_request` (400), `not_found` (404),
//! `save_failed` (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use capture_harness_core::models::{Category, Entry, Goal};
use capture_harness_core::store::{Store, StoreError};
use capture_harness_core::tracker;
use capture_harness_core::{capture, CaptureError, CaptureOutcome, ClassificationSource, Session};

use crate::classifier::create_classifier;
use crate::config::Config;
use crate::entries::{build_filter, parse_status};
use crate::sqlite_store::SqliteStore;

/// Shared state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    classifier: Arc<dyn ClassificationSource>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, classifier: Arc<dyn ClassificationSource>) -> Self {
        Self { store, classifier }
    }
}

/// Build the API router over the given state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/captures", post(handle_capture))
        .route("/entries", get(handle_list_entries))
        .route("/entries/{id}", get(handle_get_entry))
        .route("/entries/{id}/status", patch(handle_update_status))
        .route("/entries/{id}/checklist/{index}", post(handle_toggle_checklist))
        .route("/goals", get(handle_list_goals))
        .route("/goals/{id}/progress", post(handle_goal_progress))
        .route("/categories", get(handle_list_categories))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::open(config).await?;
    let classifier: Arc<dyn ClassificationSource> =
        Arc::from(create_classifier(&config.classifier)?);

    let app = router(AppState::new(Arc::new(store), classifier));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        bind = %config.server.bind,
        classifier = config.classifier.is_enabled(),
        "server started"
    );
    println!("Capture API listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code,
        message: message.into(),
    }
}

fn unauthenticated() -> AppError {
    app_error(
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "missing x-user-id header",
    )
}

fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn not_found(message: impl Into<String>) -> AppError {
    app_error(StatusCode::NOT_FOUND, "not_found", message)
}

fn internal(message: impl Into<String>) -> AppError {
    let message = message.into();
    error!(%message, "request failed");
    app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => not_found(err.to_string()),
            StoreError::InvalidInput(_) | StoreError::ConstraintViolation { .. } => {
                bad_request(err.to_string())
            }
            StoreError::Backend(_) => internal(err.to_string()),
        }
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Unauthenticated => unauthenticated(),
            CaptureError::EmptyContent => bad_request(err.to_string()),
            CaptureError::Persistence(_) => {
                error!(error = %err, "capture not saved");
                app_error(StatusCode::INTERNAL_SERVER_ERROR, "save_failed", err.to_string())
            }
        }
    }
}

/// The caller's session, taken from `x-user-id` and an optional bearer token.
fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    let user_id = headers
        .get("x-user-id")?
        .to_str()
        .ok()?
        .trim();
    if user_id.is_empty() {
        return None;
    }

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let session = Session::new(user_id);
    Some(match token {
        Some(token) => session.with_access_token(token),
        None => session,
    })
}

fn require_session(headers: &HeaderMap) -> Result<Session, AppError> {
    session_from_headers(headers).ok_or_else(unauthenticated)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /captures ============

#[derive(Deserialize)]
struct CaptureRequest {
    content: String,
}

async fn handle_capture(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CaptureRequest>,
) -> Result<(StatusCode, Json<CaptureOutcome>), AppError> {
    let session = session_from_headers(&headers);
    let outcome = capture(
        state.store.as_ref(),
        state.classifier.as_ref(),
        session.as_ref(),
        &req.content,
        Local::now().date_naive(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

// ============ Entries ============

#[derive(Deserialize)]
struct EntriesQuery {
    #[serde(rename = "type")]
    entry_type: Option<String>,
    status: Option<String>,
}

#[derive(Serialize)]
struct EntriesResponse {
    entries: Vec<Entry>,
}

async fn handle_list_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<EntriesResponse>, AppError> {
    let session = require_session(&headers)?;
    let filter = build_filter(query.entry_type.as_deref(), query.status.as_deref())
        .map_err(|e| bad_request(e.to_string()))?;

    let entries = state.store.list_entries(&session.user_id, &filter).await?;
    Ok(Json(EntriesResponse { entries }))
}

async fn handle_get_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Entry>, AppError> {
    let session = require_session(&headers)?;
    let entry = state
        .store
        .get_entry(&session.user_id, &id)
        .await?
        .ok_or_else(|| not_found(format!("entry not found: {}", id)))?;
    Ok(Json(entry))
}

#[derive(Deserialize)]
struct StatusRequest {
    status: String,
}

async fn handle_update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Entry>, AppError> {
    let session = require_session(&headers)?;
    let status = parse_status(&req.status).map_err(|e| bad_request(e.to_string()))?;

    let entry =
        tracker::update_entry_status(state.store.as_ref(), &session.user_id, &id, status).await?;
    Ok(Json(entry))
}

async fn handle_toggle_checklist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<Entry>, AppError> {
    let session = require_session(&headers)?;
    let entry =
        tracker::toggle_checklist_item(state.store.as_ref(), &session.user_id, &id, index).await?;
    Ok(Json(entry))
}

// ============ Goals ============

#[derive(Serialize)]
struct GoalsResponse {
    goals: Vec<Goal>,
}

async fn handle_list_goals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<GoalsResponse>, AppError> {
    let session = require_session(&headers)?;
    let goals = state.store.list_goals(&session.user_id).await?;
    Ok(Json(GoalsResponse { goals }))
}

#[derive(Deserialize)]
struct ProgressRequest {
    #[serde(default = "default_amount")]
    amount: f64,
}

fn default_amount() -> f64 {
    1.0
}

#[derive(Serialize)]
struct ProgressResponse {
    goal: Goal,
    reached: bool,
}

async fn handle_goal_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let session = require_session(&headers)?;
    let goal = tracker::record_goal_progress(
        state.store.as_ref(),
        &session.user_id,
        &id,
        req.amount,
        Local::now().date_naive(),
    )
    .await?;

    Ok(Json(ProgressResponse {
        reached: tracker::goal_reached(&goal),
        goal,
    }))
}

// ============ GET /categories ============

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<Category>,
}

async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = state.store.list_categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}
