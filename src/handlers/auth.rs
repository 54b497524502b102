use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::service::{AuthError, AuthService};
use crate::error::{ApiError, ErrorCode};
use crate::handlers::ok;
use crate::models::user::{LoginPayload, LogoutPayload, RefreshPayload, RegisterPayload};
use crate::AppState;

fn required<'a>(
    field: &'a Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> &'a str {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => {
            missing.push(name);
            ""
        }
    }
}

/// Store failures and signing failures have no client-facing detail.
fn auth_internal(err: AuthError) -> ApiError {
    match err {
        AuthError::Store(e) => ApiError::from(e),
        other => {
            tracing::error!("auth failure: {}", other);
            ApiError::internal()
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut missing = Vec::new();
    let name = required(&payload.name, "name", &mut missing);
    let email = required(&payload.email, "email", &mut missing);
    let pw = required(&payload.password, "password", &mut missing);
    if !missing.is_empty() {
        return Err(ApiError::fields_missing(missing));
    }

    let auth = AuthService::new(state.db.clone(), state.keys.clone());
    let user = auth.register(name, email, pw).await.map_err(|err| match err {
        AuthError::EmailTaken => ApiError::new(
            StatusCode::CONFLICT,
            ErrorCode::UserAlreadyExists,
            "A user with this email already exists.",
        ),
        other => auth_internal(other),
    })?;

    Ok((StatusCode::CREATED, ok(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut missing = Vec::new();
    let email = required(&payload.email, "email", &mut missing);
    let pw = required(&payload.password, "password", &mut missing);
    if !missing.is_empty() {
        return Err(ApiError::fields_missing(missing));
    }

    let auth = AuthService::new(state.db.clone(), state.keys.clone());
    let pair = auth.login(email, pw).await.map_err(|err| match err {
        AuthError::UserNotFound => ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::UserNotFound,
            "User not found.",
        ),
        AuthError::InvalidPassword => ApiError::new(
            StatusCode::FORBIDDEN,
            ErrorCode::InvalidPassword,
            "Invalid password.",
        ),
        other => auth_internal(other),
    })?;

    Ok(ok(pair))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut missing = Vec::new();
    let token = required(&payload.refresh_token, "refreshToken", &mut missing);
    if !missing.is_empty() {
        return Err(ApiError::fields_missing(missing));
    }

    let auth = AuthService::new(state.db.clone(), state.keys.clone());
    let pair = auth.refresh(token).await.map_err(|err| match err {
        AuthError::TokenInvalid => ApiError::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenInvalid,
            "Invalid or expired token.",
        ),
        // the token was valid but its user is gone
        AuthError::UserNotFound => ApiError::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::UserNotFound,
            "User not found.",
        ),
        other => auth_internal(other),
    })?;

    Ok(ok(pair))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(user_id) = payload.user_id else {
        return Err(ApiError::fields_missing(vec!["userId"]));
    };

    let auth = AuthService::new(state.db.clone(), state.keys.clone());
    auth.logout(user_id).await.map_err(auth_internal)?;

    Ok(ok(json!({ "message": "Logged out successfully." })))
}
