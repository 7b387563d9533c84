//! OCR (Optical Character Recognition) Module
//!
//! Turns an uploaded identity-card image into text through Tesseract.
//!
//! # Architecture
//!
//! - `OcrEngine` trait is the one seam between this service and the engine
//! - `TesseractEngine` implements it in-process via leptess
//! - `TesseractCliEngine` implements it by driving the `tesseract` binary
//! - `OcrProvider` is the request handler: boundary decoding, timeout,
//!   concurrency limit, and graceful degradation when no engine loads
//!
//! The image is handed to the engine as-is (normalised to PNG). There is no
//! enhancement step and no parsing of the recognised text into KTP fields.
//!
//! # Configuration
//!
//! Controlled via `OcrConfig` (see `config.rs`):
//! - `engine`: `library` or `cli`
//! - `language`: Tesseract language code(s), default `ind`
//! - `engine_path` / `tessdata_path`: explicit binary and traineddata locations
//! - `timeout_secs`, `max_concurrency`: per-call and process-wide bounds
//! - `max_image_bytes`, `max/min_image_dimension`: input limits
//!
//! # Usage
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr);
//! let result = ocr.extract(&image_bytes).await?;
//! println!("{}", result.text);
//! ```

mod cli;
mod decode;
mod engine;
mod provider;

pub use cli::TesseractCliEngine;
pub use decode::{decode_base64_image, decode_image, DecodedImage};
pub use engine::{OcrEngine, TesseractEngine};
pub use provider::{OcrProvider, OcrResult};
