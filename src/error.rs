use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Stable error codes surfaced in the response envelope. Clients match on
/// these, not on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FieldsMissing,
    UserNotFound,
    InvalidPassword,
    UserAlreadyExists,
    AuthorizationHeaderMissing,
    TokenInvalid,
    TimeEntryNotFound,
    TimeEntryAlreadyStopped,
    InternalServerError,
}

/// Boundary error: an HTTP status plus the envelope body. Domain errors are
/// converted into this at the handler layer, never below it.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn fields_missing(missing: Vec<&'static str>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            code: ErrorCode::FieldsMissing,
            message: "Required fields are missing.".into(),
            details: Some(json!({ "missing": missing })),
        }
    }

    pub fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            "Internal server error",
        )
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ApiError::new(
                    StatusCode::CONFLICT,
                    ErrorCode::UserAlreadyExists,
                    "A user with this email already exists.",
                );
            }
        }
        tracing::error!("database error: {}", err);
        ApiError::internal()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(details) = self.details {
            error["details"] = details;
        }
        let body = Json(json!({
            "success": false,
            "error": error,
        }));
        (self.status, body).into_response()
    }
}
