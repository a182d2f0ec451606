//! Success envelope: `{ "message", "success": true, ...payload }`.

use crate::error::ApiError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Map<String, Value>,
}

impl ApiResponse {
    pub fn ok(message: &str) -> Self {
        Self::with_status(StatusCode::OK, message)
    }

    pub fn created(message: &str) -> Self {
        Self::with_status(StatusCode::CREATED, message)
    }

    fn with_status(status: StatusCode, message: &str) -> Self {
        let mut body = Map::new();
        body.insert("message".to_string(), Value::from(message));
        body.insert("success".to_string(), Value::Bool(true));
        Self { status, body }
    }

    /// Adds one payload field next to `message` and `success`.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value).map_err(ApiError::internal)?;
        self.body.insert(key.to_string(), value);
        Ok(self)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}
