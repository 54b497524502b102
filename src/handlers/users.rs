use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ErrorCode};
use crate::handlers::ok;
use crate::models::user::UpdateProfilePayload;
use crate::store::users::UserStore;
use crate::AppState;

fn user_not_found() -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        ErrorCode::UserNotFound,
        "User not found.",
    )
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserStore::new(state.db.clone())
        .get_by_id(auth_user.id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(ok(user))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut missing = Vec::new();
    let name = match payload.name.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push("name");
            ""
        }
    };
    let email = match payload.email.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push("email");
            ""
        }
    };
    if !missing.is_empty() {
        return Err(ApiError::fields_missing(missing));
    }

    // a unique-violation on email surfaces as 409 via From<sqlx::Error>
    let user = UserStore::new(state.db.clone())
        .update_profile(auth_user.id, name, email)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(ok(user))
}
