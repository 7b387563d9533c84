//! KTP OCR service.
//!
//! Accepts an image of an Indonesian identity card (KTP), runs it through
//! Tesseract, and returns the recognised text. The HTTP surface lives in
//! [`api`]; the engine integration and request handling in [`ocr`].

pub mod api;
pub mod config;
pub mod error;
pub mod ocr;

pub use config::Config;
pub use error::{KtpOcrError, Result};
pub use ocr::{OcrProvider, OcrResult};
