use leptess::{LepTess, Variable};

use crate::config::OcrConfig;
use crate::error::{KtpOcrError, Result};

/// Synchronous text recognition over an encoded image.
///
/// Implementations block the calling thread; `OcrProvider` runs them on the
/// blocking pool. An implementation must be safe to call from several
/// threads at once.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &[u8], language: &str) -> Result<String>;
}

/// libtesseract through leptess.
///
/// A `LepTess` handle is not reentrant, so every call initialises its own.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    tessdata_path: Option<String>,
    page_seg_mode: u8,
}

impl TesseractEngine {
    /// Build the engine and prove that `config.language` loads.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let tessdata_path = match &config.tessdata_path {
            Some(path) => Some(
                path.to_str()
                    .ok_or_else(|| {
                        KtpOcrError::Engine(format!(
                            "tessdata path is not valid UTF-8: {}",
                            path.display()
                        ))
                    })?
                    .to_string(),
            ),
            None => None,
        };

        let engine = Self {
            tessdata_path,
            page_seg_mode: config.page_seg_mode,
        };
        engine.init(&config.language)?;
        Ok(engine)
    }

    fn init(&self, language: &str) -> Result<LepTess> {
        let mut lt = LepTess::new(self.tessdata_path.as_deref(), language).map_err(|e| {
            KtpOcrError::Engine(format!(
                "Failed to initialise Tesseract for '{language}': {e}"
            ))
        })?;
        lt.set_variable(
            Variable::TesseditPagesegMode,
            &self.page_seg_mode.to_string(),
        )
        .map_err(|e| KtpOcrError::Engine(format!("Failed to set page segmentation mode: {e}")))?;
        Ok(lt)
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        let mut lt = self.init(language)?;
        lt.set_image_from_mem(image)
            .map_err(|e| KtpOcrError::Engine(format!("Failed to set image: {e}")))?;
        lt.get_utf8_text()
            .map_err(|e| KtpOcrError::Engine(format!("Failed to extract text: {e}")))
    }
}
