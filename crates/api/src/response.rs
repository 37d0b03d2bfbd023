//! Shared response envelope for API handlers.
//!
//! Every JSON body — success and error alike — is wrapped as
//! `{ "status", "code", "message", "data" }`. Use [`ApiResponse`] instead of
//! ad-hoc `serde_json::json!` so the envelope stays consistent and the HTTP
//! status always matches the `code` field. Error envelopes are produced by
//! `AppError` in `error.rs`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Standard success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 envelope with a payload.
    pub fn success(data: T) -> Self {
        Self::with_code(StatusCode::OK, "success", data)
    }

    /// 200 envelope with a payload and a custom message.
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 201 envelope for newly created resources.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            code: StatusCode::CREATED.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 207 envelope for partially-applied batches (some entries skipped).
    pub fn multi_status(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            code: StatusCode::MULTI_STATUS.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 200 envelope with `data = null`.
    ///
    /// Absence of work (an empty backlog) is a success, not an error.
    pub fn none(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: None,
        }
    }

    fn with_code(code: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            code: code.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
