use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{GenericImageView, ImageError, ImageFormat, ImageReader, Limits};

use crate::config::OcrConfig;
use crate::error::{KtpOcrError, Result};

/// An upload that decoded into a raster image within the configured limits.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// PNG encoding of the image, handed to the OCR engine.
    pub png: Vec<u8>,
}

impl DecodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Decode the `image` field of a JSON request.
///
/// Accepts bare base64 or a `data:<mime>;base64,<payload>` URL. ASCII
/// whitespace is ignored so line-wrapped base64 decodes as well.
pub fn decode_base64_image(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest.split_once(',').ok_or_else(|| {
                KtpOcrError::Decode("data URL is missing its ',' separator".to_string())
            })?;
            if !meta.ends_with(";base64") {
                return Err(KtpOcrError::Decode(
                    "data URL must be base64-encoded".to_string(),
                ));
            }
            data
        }
        None => trimmed,
    };

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(KtpOcrError::Decode("image payload is empty".to_string()));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| KtpOcrError::Decode(format!("image is not valid base64: {e}")))
}

/// Validate raw upload bytes and turn them into something the engine reads.
///
/// Checks, in order: byte size, file signature, raster decode (with the
/// decoder's dimension limits set to `max_image_dimension`), minimum
/// dimensions. Non-PNG sources are re-encoded as PNG; pixels are untouched.
pub fn decode_image(bytes: &[u8], config: &OcrConfig) -> Result<DecodedImage> {
    if bytes.is_empty() {
        return Err(KtpOcrError::Decode("image payload is empty".to_string()));
    }

    if bytes.len() > config.max_image_bytes {
        return Err(KtpOcrError::PayloadTooLarge {
            size: bytes.len(),
            max: config.max_image_bytes,
        });
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(KtpOcrError::Decode(format!(
                "payload is {}, not an image",
                kind.mime_type()
            )));
        }
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| KtpOcrError::Decode(format!("Failed to read image: {e}")))?;

    let format = reader
        .format()
        .ok_or_else(|| KtpOcrError::Decode("unrecognised image format".to_string()))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_image_dimension);
    limits.max_image_height = Some(config.max_image_dimension);
    reader.limits(limits);

    let img = reader.decode().map_err(|e| match e {
        ImageError::Limits(_) => KtpOcrError::Validation(format!(
            "Image too large: maximum {}x{}",
            config.max_image_dimension, config.max_image_dimension
        )),
        other => KtpOcrError::Decode(format!("Failed to decode image: {other}")),
    })?;

    let (width, height) = img.dimensions();
    if width < config.min_image_dimension || height < config.min_image_dimension {
        return Err(KtpOcrError::Validation(format!(
            "Image too small: {}x{}, minimum {}x{}",
            width, height, config.min_image_dimension, config.min_image_dimension
        )));
    }
    if width > config.max_image_dimension || height > config.max_image_dimension {
        return Err(KtpOcrError::Validation(format!(
            "Image too large: {}x{}, maximum {}x{}",
            width, height, config.max_image_dimension, config.max_image_dimension
        )));
    }

    let png = if format == ImageFormat::Png {
        bytes.to_vec()
    } else {
        let mut output = Vec::new();
        img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| KtpOcrError::Internal(format!("Failed to encode image: {e}")))?;
        output
    };

    Ok(DecodedImage {
        width,
        height,
        format,
        png,
    })
}
