use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use escrow_core::{ErrorKind, EscrowError};
use serde_json::json;

/// Wraps [`EscrowError`] so every handler can return it directly via `?` and
/// get the right status code and `{success: false, ...}` body for free.
pub struct ApiError(pub EscrowError);

impl From<EscrowError> for ApiError {
    fn from(e: EscrowError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let EscrowError::InvalidTransition { from, to: _, allowed } = &self.0 {
            let body = json!({
                "success": false,
                "error": self.0.to_string(),
                "current_status": from.to_string(),
                "allowed_transitions": allowed.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }

        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::External => StatusCode::BAD_GATEWAY,
            ErrorKind::Config | ErrorKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "success": false, "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
