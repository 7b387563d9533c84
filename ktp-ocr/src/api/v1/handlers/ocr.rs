//! OCR handlers.
//!
//! Both endpoints hand the raw image bytes to `OcrProvider::extract` and wrap
//! the result in the v1 envelope. Every request gets a `requestId` that is
//! returned to the caller and attached to the request's log lines.

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{OcrRequest, OcrResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::error::KtpOcrError;
use crate::ocr::decode_base64_image;

/// `POST /api/v1/ocr`
///
/// Accepts `{"image": "<base64>"}` and returns the recognised text.
#[utoipa::path(
    post,
    path = "/api/v1/ocr",
    tag = "ocr",
    operation_id = "ocr.extract",
    request_body = OcrRequest,
    responses(
        (status = 200, description = "Text extracted", body = OcrResponse),
        (status = 400, description = "Invalid request or not an image", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 413, description = "Image exceeds the size limit", body = ApiError),
        (status = 500, description = "OCR engine failure", body = ApiError),
        (status = 503, description = "OCR engine not available", body = ApiError),
        (status = 504, description = "OCR timed out", body = ApiError),
    )
)]
pub async fn extract_text(
    State(state): State<AppState>,
    AppJson(req): AppJson<OcrRequest>,
) -> ApiResponse<OcrResponse> {
    // `image` is the only field, so a failed check means an empty payload.
    if req.validate().is_err() {
        return KtpOcrError::Decode("image payload is empty".to_string()).into();
    }

    let bytes = match decode_base64_image(&req.image) {
        Ok(bytes) => bytes,
        Err(e) => return e.into(),
    };

    run_extraction(&state, bytes).await
}

/// `POST /api/v1/ocr:upload`
///
/// Accepts a multipart form whose `file` part holds the image. Other parts
/// are ignored.
#[utoipa::path(
    post,
    path = "/api/v1/ocr:upload",
    tag = "ocr",
    operation_id = "ocr.upload",
    request_body(content_type = "multipart/form-data", content = String, description = "Image file in the `file` field"),
    responses(
        (status = 200, description = "Text extracted", body = OcrResponse),
        (status = 400, description = "Missing file or not an image", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 413, description = "Image exceeds the size limit", body = ApiError),
        (status = 500, description = "OCR engine failure", body = ApiError),
        (status = 503, description = "OCR engine not available", body = ApiError),
        (status = 504, description = "OCR timed out", body = ApiError),
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse<OcrResponse> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => return KtpOcrError::Validation(rejection.body_text()).into(),
    };

    let mut file_bytes: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return map_multipart_error(e).into(),
        };

        if field.name() != Some("file") {
            continue;
        }

        if let Some(name) = field.file_name() {
            debug!(file_name = %name, "Receiving upload");
        }

        match field.bytes().await {
            Ok(bytes) => file_bytes = Some(bytes.to_vec()),
            Err(e) => return map_multipart_error(e).into(),
        }
    }

    let Some(bytes) = file_bytes else {
        return KtpOcrError::Validation("Missing required field: file".to_string()).into();
    };

    if bytes.is_empty() {
        return KtpOcrError::Decode("image payload is empty".to_string()).into();
    }

    run_extraction(&state, bytes).await
}

async fn run_extraction(state: &AppState, bytes: Vec<u8>) -> ApiResponse<OcrResponse> {
    let request_id = Uuid::new_v4();
    debug!(request_id = %request_id, size = bytes.len(), "OCR request received");

    match state.ocr.extract(&bytes).await {
        Ok(result) => {
            info!(
                request_id = %request_id,
                chars = result.text.chars().count(),
                elapsed_ms = result.elapsed.as_millis() as u64,
                "OCR request completed"
            );
            ApiResponse::success(OcrResponse::from_result(request_id, result))
        }
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "OCR request failed");
            e.into()
        }
    }
}

fn map_multipart_error(err: MultipartError) -> KtpOcrError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        KtpOcrError::BodyTooLarge(err.body_text())
    } else {
        KtpOcrError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}
