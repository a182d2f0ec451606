//! HTTP error envelope.
//!
//! Every failure renders as `{ "message", "success": false, "code" }` with
//! the status derived from its `ErrorCode`.

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use inotebook_core::{ErrorCode, ServiceError};
use log::{error, warn};
use serde_json::json;
use std::fmt::Display;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: status_for(code),
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Logs `detail` and hides it from the caller.
    pub fn internal(detail: impl Display) -> Self {
        error!("event=request_failed module=http status=error error={detail}");
        Self::new(ErrorCode::StorageFailure, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

/// Maps a failure code onto its HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::AuthMalformed | ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::AuthMissing
        | ErrorCode::AuthInvalidSignature
        | ErrorCode::AuthExpired
        | ErrorCode::AuthStaleEpoch
        | ErrorCode::CredentialMismatch => StatusCode::UNAUTHORIZED,
        ErrorCode::AuthAccountNotFound | ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict | ErrorCode::InvalidTransition => StatusCode::CONFLICT,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        let code = value.code();
        match code {
            ErrorCode::StorageFailure => {
                error!("event=request_failed module=http status=error code={code} error={value}");
            }
            _ => warn!("event=request_rejected module=http status=rejected code={code}"),
        }
        Self::new(code, value.public_message())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::validation(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::validation(value.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(value: MultipartRejection) -> Self {
        Self::validation(value.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        if value.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(ErrorCode::PayloadTooLarge, "File too large");
        }
        Self::validation(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "message": self.message,
            "success": false,
            "code": self.code,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inotebook_core::AuthError;

    #[test]
    fn auth_failures_map_to_client_statuses() {
        assert_eq!(status_for(ErrorCode::AuthMissing), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorCode::AuthStaleEpoch), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorCode::AuthMalformed), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failures_hide_details() {
        let err = ApiError::from(ServiceError::Storage("disk on fire".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn service_codes_are_preserved() {
        let err = ApiError::from(ServiceError::from(AuthError::Expired));
        assert_eq!(err.code(), ErrorCode::AuthExpired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
