use std::sync::Arc;
use std::time::{Duration, Instant};

use image::ImageFormat;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::{EngineKind, OcrConfig};
use crate::error::{KtpOcrError, Result};

use super::cli::TesseractCliEngine;
use super::decode::decode_image;
use super::engine::{OcrEngine, TesseractEngine};

/// Outcome of one successful extraction.
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub language: String,
    pub engine: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub elapsed: Duration,
}

#[derive(Clone)]
enum OcrBackend {
    Ready { engine: Arc<dyn OcrEngine> },
    Unavailable { reason: String },
}

#[derive(Clone)]
pub struct OcrProvider {
    backend: OcrBackend,
    config: Arc<OcrConfig>,
    permits: Arc<Semaphore>,
}

impl OcrProvider {
    /// Build the engine selected by `config.engine`.
    ///
    /// A missing library, binary, or language pack does not fail startup;
    /// the provider reports itself unavailable and every extraction returns
    /// `KtpOcrError::Unavailable`.
    pub fn new(config: &OcrConfig) -> Self {
        let engine: Result<Arc<dyn OcrEngine>> = match config.engine {
            EngineKind::Library => {
                TesseractEngine::new(config).map(|e| Arc::new(e) as Arc<dyn OcrEngine>)
            }
            EngineKind::Cli => {
                TesseractCliEngine::new(config).map(|e| Arc::new(e) as Arc<dyn OcrEngine>)
            }
        };

        match engine {
            Ok(engine) => {
                info!(
                    engine = engine.name(),
                    language = %config.language,
                    max_concurrency = config.max_concurrency,
                    "Tesseract OCR initialized"
                );
                Self::with_engine(engine, config.clone())
            }
            Err(e) => {
                let reason = format!("Tesseract not available: {e}");
                warn!("{}", reason);
                Self::unavailable(reason, config.clone())
            }
        }
    }

    /// Wrap an arbitrary engine implementation.
    pub fn with_engine(engine: Arc<dyn OcrEngine>, config: OcrConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            backend: OcrBackend::Ready { engine },
            config: Arc::new(config),
            permits,
        }
    }

    pub fn unavailable(reason: impl Into<String>, config: OcrConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            backend: OcrBackend::Unavailable {
                reason: reason.into(),
            },
            config: Arc::new(config),
            permits,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            OcrBackend::Unavailable { reason } => Some(reason),
            OcrBackend::Ready { .. } => None,
        }
    }

    pub fn engine_name(&self) -> Option<&'static str> {
        match &self.backend {
            OcrBackend::Ready { engine } => Some(engine.name()),
            OcrBackend::Unavailable { .. } => None,
        }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Recognise the text in one uploaded image.
    ///
    /// Decoding and recognition both run on the blocking pool while holding
    /// a concurrency permit. The permit moves into the blocking task, so a
    /// call that outlives its timeout keeps counting against the limit until
    /// the engine returns.
    pub async fn extract(&self, image_bytes: &[u8]) -> Result<OcrResult> {
        let engine = match &self.backend {
            OcrBackend::Ready { engine } => Arc::clone(engine),
            OcrBackend::Unavailable { reason } => {
                return Err(KtpOcrError::Unavailable(reason.clone()))
            }
        };

        if image_bytes.len() > self.config.max_image_bytes {
            return Err(KtpOcrError::PayloadTooLarge {
                size: image_bytes.len(),
                max: self.config.max_image_bytes,
            });
        }

        let started = Instant::now();
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        let work = async {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|_| KtpOcrError::Internal("OCR limiter closed".to_string()))?;

            let bytes = image_bytes.to_vec();
            let config = Arc::clone(&self.config);
            let engine = Arc::clone(&engine);

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let decoded = decode_image(&bytes, &config)?;
                let text = engine.recognize(&decoded.png, &config.language)?;
                Ok::<_, KtpOcrError>((decoded, text))
            })
            .await
            .map_err(|e| KtpOcrError::Engine(format!("OCR task panicked: {e}")))?
        };

        let (decoded, text) = match tokio::time::timeout(timeout_duration, work).await {
            Ok(inner_result) => inner_result?,
            Err(_) => {
                warn!(
                    timeout_secs = self.config.timeout_secs,
                    "OCR operation timed out"
                );
                return Err(KtpOcrError::Timeout {
                    secs: self.config.timeout_secs,
                });
            }
        };

        let elapsed = started.elapsed();
        debug!(
            engine = engine.name(),
            width = decoded.width,
            height = decoded.height,
            elapsed_ms = elapsed.as_millis() as u64,
            "OCR completed"
        );

        Ok(OcrResult {
            text: text.trim().to_string(),
            language: self.config.language.clone(),
            engine: engine.name(),
            width: decoded.width,
            height: decoded.height,
            format: decoded.format,
            elapsed,
        })
    }
}
