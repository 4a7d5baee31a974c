//! Axum handlers for `/api/*` routes.
//!
//! Every error body has the shape `{ "error": <code>, "message": <text> }`.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::profile::{self, NewUser};
use crate::tutor::TutorRequest;

use super::AxumState;

const TUTOR_TIMEOUT: Duration = Duration::from_secs(120);

/// Optional identity fields used when a profile has to be created.
#[derive(Debug, Default, Deserialize)]
pub(super) struct UserQuery {
    email: Option<String>,
    name: Option<String>,
}

fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

fn error_response(e: &AppError) -> Response {
    let (status, code) = match e {
        AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        AppError::Llm(_) => (StatusCode::BAD_GATEWAY, "provider"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (status, json_error(code, e)).into_response()
}

/// GET /api/health
pub(super) async fn health(State(state): State<AxumState>) -> Response {
    let body = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.service.provider().name(),
        "store": state.service.store().store_type(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// POST /api/study-tutor
pub(super) async fn study_tutor(
    State(state): State<AxumState>,
    body: Result<Json<TutorRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => {
            warn!(channel_id = %state.channel_id, "rejected study-tutor body: {rejection}");
            return (StatusCode::BAD_REQUEST, json_error("invalid_request", rejection.body_text()))
                .into_response();
        }
    };

    match tokio::time::timeout(TUTOR_TIMEOUT, state.service.reply(req)).await {
        Ok(Ok(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(Err(e)) => {
            warn!(channel_id = %state.channel_id, error = %e, "study-tutor request failed");
            error_response(&e)
        }
        Err(_) => {
            warn!(channel_id = %state.channel_id, "study-tutor request timed out");
            (StatusCode::GATEWAY_TIMEOUT, json_error("timeout", "LLM request timed out")).into_response()
        }
    }
}

/// GET /api/profile/{user_id}
pub(super) async fn profile(
    State(state): State<AxumState>,
    Path(user_id): Path<String>,
    Query(q): Query<UserQuery>,
) -> Response {
    let user = NewUser { user_id: &user_id, email: q.email.as_deref(), name: q.name.as_deref() };
    let status = profile::load_or_create(state.service.store(), user).await;
    (StatusCode::OK, Json(status)).into_response()
}

/// GET /api/dashboard/{user_id}
pub(super) async fn dashboard(
    State(state): State<AxumState>,
    Path(user_id): Path<String>,
    Query(q): Query<UserQuery>,
) -> Response {
    let user = NewUser { user_id: &user_id, email: q.email.as_deref(), name: q.name.as_deref() };
    let today = Local::now().date_naive();
    let dash = Dashboard::build(state.service.store(), user, today).await;
    (StatusCode::OK, Json(dash)).into_response()
}

/// POST /api/mock/reset: restart the mock conversation; no-op for real models.
pub(super) async fn mock_reset(State(state): State<AxumState>) -> Response {
    let is_mock = state.service.provider().as_mock().is_some();
    state.service.reset_conversation();
    (StatusCode::OK, Json(json!({ "reset": is_mock }))).into_response()
}

pub(super) async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, json_error("not_found", "no such route")).into_response()
}
