//! # API Error Type
//!
//! What a failed request returns, built from [`EngineError`].
//!
//! ## Status Mapping
//! ```text
//! ┌──────────────────┬────────┬──────────────────────────────────────────┐
//! │ Engine kind      │ Status │ code                                     │
//! ├──────────────────┼────────┼──────────────────────────────────────────┤
//! │ Validation       │ 400    │ VALIDATION_ERROR  (+ errors[])           │
//! │ Conflict         │ 409    │ CONFLICT                                 │
//! │ NotFound         │ 404    │ NOT_FOUND                                │
//! │ External         │ 502    │ GATEWAY_ERROR                            │
//! │   bad signature  │ 401    │ INVALID_SIGNATURE                        │
//! │ Integrity        │ 409    │ INTEGRITY_ERROR                          │
//! │ Internal         │ 500    │ INTERNAL                                 │
//! │ no x-cashier-id  │ 401    │ UNAUTHORIZED                             │
//! └──────────────────┴────────┴──────────────────────────────────────────┘
//! ```
//!
//! ## Body
//! ```json
//! {
//!   "code": "VALIDATION_ERROR",
//!   "message": "tendered_amount is required",
//!   "errors": [{ "field": "tendered_amount", "message": "tendered_amount is required" }]
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kasir_engine::{EngineError, ErrorKind};
use serde::Serialize;
use tracing::error;

/// Result type for route handlers.
pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Conflict,
    NotFound,
    Unauthorized,
    InvalidSignature,
    GatewayError,
    IntegrityError,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict | ErrorCode::IntegrityError => StatusCode::CONFLICT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized | ErrorCode::InvalidSignature => StatusCode::UNAUTHORIZED,
            ErrorCode::GatewayError => StatusCode::BAD_GATEWAY,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error body returned by every route.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let code = match err.kind() {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::External if err.is_invalid_signature() => ErrorCode::InvalidSignature,
            ErrorKind::External => ErrorCode::GatewayError,
            ErrorKind::Integrity => ErrorCode::IntegrityError,
            ErrorKind::Internal => {
                error!(error = %err, "Request failed");
                return ApiError::new(ErrorCode::Internal, "Internal server error");
            }
        };

        ApiError {
            code,
            message: err.to_string(),
            errors: err
                .field_errors()
                .into_iter()
                .map(|(field, message)| FieldError { field, message })
                .collect(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasir_core::{CoreError, ValidationError};
    use kasir_db::DbError;
    use kasir_gateway::GatewayError;

    #[test]
    fn test_engine_errors_map_to_status() {
        let cases: Vec<(EngineError, StatusCode)> = vec![
            (CoreError::EmptyCart.into(), StatusCode::BAD_REQUEST),
            (
                CoreError::OutOfStock {
                    sku: "X".to_string(),
                    available: 0,
                    requested: 1,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (CoreError::HoldNotFound("h1".to_string()).into(), StatusCode::NOT_FOUND),
            (GatewayError::Timeout { seconds: 10 }.into(), StatusCode::BAD_GATEWAY),
            (GatewayError::InvalidSignature.into(), StatusCode::UNAUTHORIZED),
            (EngineError::Integrity("dup".to_string()), StatusCode::CONFLICT),
            (DbError::Busy.into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code.status(), status);
        }
    }

    #[test]
    fn test_validation_carries_field_errors() {
        let err: EngineError = ValidationError::Required {
            field: "tendered_amount".to_string(),
        }
        .into();
        let api = ApiError::from(err);

        assert_eq!(api.code, ErrorCode::ValidationError);
        assert_eq!(api.errors.len(), 1);
        assert_eq!(api.errors[0].field, "tendered_amount");

        let body = serde_json::to_value(&api).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let api = ApiError::from(EngineError::Internal("pool poisoned".to_string()));
        assert_eq!(api.message, "Internal server error");

        let body = serde_json::to_value(&api).unwrap();
        assert!(body.get("errors").is_none());
    }
}
