use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ErrorCode};
use crate::handlers::ok;
use crate::models::time_entry::{CreateTimeEntryPayload, StopTimeEntryPayload};
use crate::services::time_entry::{EntryError, TimeEntryService};
use crate::AppState;

fn entry_error(err: EntryError) -> ApiError {
    match err {
        EntryError::NotFound => ApiError::new(
            StatusCode::NOT_FOUND,
            ErrorCode::TimeEntryNotFound,
            "Time entry not found.",
        ),
        EntryError::AlreadyStopped => ApiError::new(
            StatusCode::CONFLICT,
            ErrorCode::TimeEntryAlreadyStopped,
            "Time entry is already stopped.",
        ),
        EntryError::Store(e) => ApiError::from(e),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateTimeEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let description = match payload.description.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ApiError::fields_missing(vec!["description"])),
    };

    let entry = TimeEntryService::new(state.db.clone())
        .start(auth_user.id, description, payload.start_time)
        .await
        .map_err(entry_error)?;

    Ok((StatusCode::CREATED, ok(entry)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = TimeEntryService::new(state.db.clone())
        .list(auth_user.id)
        .await
        .map_err(entry_error)?;

    Ok(ok(entries))
}

/// `data` is the open entry or null.
pub async fn active(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = TimeEntryService::new(state.db.clone())
        .get_active(auth_user.id)
        .await
        .map_err(entry_error)?;

    Ok(ok(entry))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = TimeEntryService::new(state.db.clone())
        .get(id, auth_user.id)
        .await
        .map_err(entry_error)?
        .ok_or_else(|| entry_error(EntryError::NotFound))?;

    Ok(ok(entry))
}

pub async fn stop(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Option<Json<StopTimeEntryPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let end_time = payload.and_then(|Json(p)| p.end_time);

    let entry = TimeEntryService::new(state.db.clone())
        .stop(id, auth_user.id, end_time)
        .await
        .map_err(entry_error)?;

    Ok(ok(entry))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = TimeEntryService::new(state.db.clone())
        .delete(id, auth_user.id)
        .await
        .map_err(entry_error)?;

    if !deleted {
        return Err(entry_error(EntryError::NotFound));
    }

    Ok(ok(json!({ "message": "Time entry deleted successfully." })))
}
