//! The JSON envelope shared by every v1 endpoint.
//!
//! Exactly one of `data` and `error` is present:
//!
//! ```json
//! {
//!   "data": { "requestId": "...", "text": "..." }
//! }
//! ```
//!
//! ```json
//! {
//!   "error": { "code": "invalid_image", "message": "..." }
//! }
//! ```
//!
//! Extraction is all-or-nothing: an error response never carries partial text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::KtpOcrError;

/// Stable error identifier, sent as a snake_case string such as
/// `"invalid_image"`. [`ErrorCode::status`] fixes the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unparseable body, missing field, or failed validation. HTTP 400.
    InvalidRequest,
    /// The payload could not be interpreted as an image. HTTP 400.
    InvalidImage,
    /// No bearer key, or one not in `API_KEYS`. HTTP 401.
    Unauthorized,
    /// The upload exceeds the configured size limit. HTTP 413.
    PayloadTooLarge,
    /// An unexpected server-side error occurred, including OCR engine
    /// failures. Internal details are never leaked to the client. HTTP 500.
    InternalError,
    /// No OCR engine could be initialised. HTTP 503.
    ServiceUnavailable,
    /// The OCR engine did not finish in time. HTTP 504.
    Timeout,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest | Self::InvalidImage => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::InvalidImage => write!(f, "invalid_image"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// The `error` member of a failed response, e.g.
/// `{ "code": "invalid_image", "message": "payload is application/pdf, not an image" }`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Shown to the caller; never carries engine internals.
    pub message: String,
}

/// A v1 response body plus the HTTP status it is sent with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    // kept out of the JSON body
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<KtpOcrError> for ApiResponse<T> {
    /// Convert a [`KtpOcrError`] into a v1 [`ApiResponse`].
    ///
    /// Engine and internal failures are logged via `tracing::error!` and
    /// replaced with a generic message.
    fn from(err: KtpOcrError) -> Self {
        match err {
            KtpOcrError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            KtpOcrError::Decode(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidImage, msg.clone())
            }

            KtpOcrError::PayloadTooLarge { .. } | KtpOcrError::BodyTooLarge(_) => {
                ApiResponse::error(ErrorCode::PayloadTooLarge, err.to_string())
            }

            KtpOcrError::Unavailable(ref msg) => {
                ApiResponse::error(ErrorCode::ServiceUnavailable, msg.clone())
            }

            KtpOcrError::Timeout { .. } => ApiResponse::error(ErrorCode::Timeout, err.to_string()),

            ref internal @ (KtpOcrError::Engine(_)
            | KtpOcrError::Io(_)
            | KtpOcrError::Internal(_)) => {
                tracing::error!(error = %internal, "OCR request failed internally");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}
