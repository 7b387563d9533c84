use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::ocr::OcrResult;

/// Request body for `POST /api/v1/ocr`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct OcrRequest {
    /// Base64-encoded image (PNG, JPEG, BMP, TIFF, WebP, GIF). A
    /// `data:image/...;base64,` prefix is accepted.
    #[validate(length(min = 1, message = "image must not be empty"))]
    pub image: String,
}

/// Text extracted from one image.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    /// Unique per request; also logged server-side.
    #[schema(value_type = String, format = Uuid)]
    pub request_id: Uuid,
    /// Recognised text, trimmed. Empty when the image holds no text.
    pub text: String,
    /// Tesseract language pack used, e.g. `ind`.
    pub language: String,
    pub engine: String,
    pub width: u32,
    pub height: u32,
    /// MIME type of the uploaded image.
    pub format: String,
    pub duration_ms: u64,
}

impl OcrResponse {
    pub fn from_result(request_id: Uuid, result: OcrResult) -> Self {
        Self {
            request_id,
            format: result.format.to_mime_type().to_string(),
            duration_ms: result.elapsed.as_millis() as u64,
            text: result.text,
            language: result.language,
            engine: result.engine.to_string(),
            width: result.width,
            height: result.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_ocr_request_requires_image() {
        let request: OcrRequest = serde_json::from_str(r#"{"image": ""}"#).unwrap();
        assert!(request.validate().is_err());

        let request: OcrRequest = serde_json::from_str(r#"{"image": "aGVsbG8="}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_ocr_request_missing_field_fails_to_parse() {
        let result: Result<OcrRequest, _> = serde_json::from_str(r#"{"file": "abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_ocr_response_serializes_camel_case() {
        let request_id = Uuid::nil();
        let response = OcrResponse::from_result(
            request_id,
            OcrResult {
                text: "NIK : 1234567890123456".to_string(),
                language: "ind".to_string(),
                engine: "tesseract",
                width: 1000,
                height: 630,
                format: ImageFormat::Jpeg,
                elapsed: Duration::from_millis(812),
            },
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "requestId": "00000000-0000-0000-0000-000000000000",
                "text": "NIK : 1234567890123456",
                "language": "ind",
                "engine": "tesseract",
                "width": 1000,
                "height": 630,
                "format": "image/jpeg",
                "durationMs": 812
            })
        );
    }
}
