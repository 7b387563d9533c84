//! Shared fixtures for the integration tests.
//!
//! Images are generated in memory with the `image` crate (text is drawn
//! with `imageproc` and a bundled DejaVu font); engines are small
//! `OcrEngine` fakes so the HTTP path can be exercised without Tesseract.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::Router;
use base64::Engine as _;
use ab_glyph::{FontRef, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use ktp_ocr::api::{create_router, AppState};
use ktp_ocr::config::{Config, LogConfig, LogFormat, OcrConfig, ServerConfig};
use ktp_ocr::ocr::{OcrEngine, OcrProvider};
use ktp_ocr::{KtpOcrError, Result};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A card-shaped image: white background with dark horizontal bars
/// standing in for printed lines.
pub fn card_image(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let bar_height = (height / 10).max(1);
    for row in 0..4 {
        let top = bar_height * (2 * row + 1);
        for y in top..(top + bar_height).min(height) {
            for x in width / 10..width * 8 / 10 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
    }
    img
}

/// A KTP header rendered with a real font, so Tesseract has glyphs to read.
/// The NIK line reads `NIK : 1234567890123456`.
pub fn ktp_text_image() -> RgbImage {
    let font = FontRef::try_from_slice(include_bytes!("../fixtures/fonts/DejaVuSans.ttf"))
        .expect("bundled font parses");
    let scale = PxScale::from(48.0);
    let ink = Rgb([0, 0, 0]);

    let mut img = blank_image(1100, 320);
    draw_text_mut(&mut img, ink, 40, 40, scale, &font, "PROVINSI JAWA BARAT");
    draw_text_mut(&mut img, ink, 40, 130, scale, &font, "KABUPATEN BANDUNG");
    draw_text_mut(&mut img, ink, 40, 220, scale, &font, "NIK : 1234567890123456");
    img
}

pub fn blank_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

pub fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .unwrap_or_else(|e| panic!("Failed to encode {format:?} fixture: {e}"));
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&card_image(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&card_image(width, height), ImageFormat::Jpeg)
}

pub fn to_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Echoes the dimensions of the PNG it receives, so every distinct input
/// yields a distinct, predictable text.
pub struct DimensionEngine {
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl DimensionEngine {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for DimensionEngine {
    fn name(&self) -> &'static str {
        "dimension"
    }

    fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let img = image::load_from_memory_with_format(image, ImageFormat::Png)
            .map_err(|e| KtpOcrError::Engine(format!("engine received non-PNG input: {e}")))?;
        Ok(format!(
            "NIK : {:08}{:08}\nlang={language}\n",
            img.width(),
            img.height()
        ))
    }
}

/// Returns only whitespace, as Tesseract does for an image without text.
pub struct BlankEngine;

impl OcrEngine for BlankEngine {
    fn name(&self) -> &'static str {
        "blank"
    }

    fn recognize(&self, _image: &[u8], _language: &str) -> Result<String> {
        Ok(" \n\n".to_string())
    }
}

pub struct FailingEngine;

impl OcrEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn recognize(&self, _image: &[u8], _language: &str) -> Result<String> {
        Err(KtpOcrError::Engine(
            "Failed loading language 'ind' from /usr/share/tessdata".to_string(),
        ))
    }
}

pub fn test_ocr_config() -> OcrConfig {
    OcrConfig {
        timeout_secs: 5,
        max_concurrency: 4,
        max_image_bytes: 512 * 1024,
        ..OcrConfig::default()
    }
}

pub fn test_config(ocr: OcrConfig, api_keys: Vec<String>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            api_keys,
            max_body_bytes: ocr.default_body_limit(),
        },
        log: LogConfig {
            format: LogFormat::Text,
        },
        ocr,
    }
}

/// Router backed by `engine`, with no API keys configured.
pub fn app_with_engine(engine: Arc<dyn OcrEngine>) -> Router {
    app_with_engine_and_config(engine, test_ocr_config())
}

pub fn app_with_engine_and_config(engine: Arc<dyn OcrEngine>, ocr_config: OcrConfig) -> Router {
    let config = test_config(ocr_config, vec![]);
    let ocr = OcrProvider::with_engine(engine, config.ocr.clone());
    create_router(AppState::new(config, ocr))
}

pub fn unavailable_app() -> Router {
    let config = test_config(test_ocr_config(), vec![]);
    let ocr = OcrProvider::unavailable(
        "Tesseract not available: tesseract binary not found",
        config.ocr.clone(),
    );
    create_router(AppState::new(config, ocr))
}

pub const BOUNDARY: &str = "ktp-ocr-test-boundary";

/// Builds a multipart body with one part per `(name, filename, bytes)`.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
