use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::auth::token::TokenService;
use crate::error::{ApiError, ErrorCode};
use crate::store::revocation::RevocationStore;
use crate::AppState;

/// Trusted identity injected into request extensions for downstream
/// handlers once the bearer token has been verified.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::AuthorizationHeaderMissing,
                "Authorization header is missing.",
            )
        })?;

    let invalid_token = || {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenInvalid,
            "Invalid or expired token.",
        )
    };

    let token = header.strip_prefix("Bearer ").ok_or_else(invalid_token)?;
    let tokens = TokenService::new(state.keys.clone(), RevocationStore::new(state.db.clone()));
    let identity = tokens
        .verify_access_token(token)
        .map_err(|_| invalid_token())?;

    request.extensions_mut().insert(AuthUser {
        id: identity.user_id,
        name: identity.name,
    });
    Ok(next.run(request).await)
}
