//! v1 API Data Transfer Objects.
//!
//! Wire types for the v1 REST API, kept separate from `ocr::OcrResult` so the
//! engine side can change without breaking clients.

pub mod ocr;

pub use ocr::*;
