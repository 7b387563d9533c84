use serde::Deserialize;
use std::env;
use std::path::PathBuf;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Highest page segmentation mode Tesseract accepts (`--psm 0..=13`).
const MAX_PAGE_SEG_MODE: u8 = 13;

fn page_seg_mode_from_env() -> u8 {
    let mode: u8 = parse_env_or("OCR_PAGE_SEG_MODE", 6);
    if mode > MAX_PAGE_SEG_MODE {
        tracing::warn!(
            "Invalid value '{}' for OCR_PAGE_SEG_MODE: must be 0-{}. Using default.",
            mode,
            MAX_PAGE_SEG_MODE
        );
        6
    } else {
        mode
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    /// Upper bound on a request body, covering the base64 inflation of
    /// `OcrConfig::max_image_bytes` plus JSON or multipart framing.
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected text or json")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
}

/// Which Tesseract integration backs the OCR provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// libtesseract linked in-process through leptess.
    Library,
    /// The `tesseract` executable, one child process per call.
    Cli,
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "library" | "lib" | "leptess" => Ok(Self::Library),
            "cli" | "binary" | "tesseract" => Ok(Self::Cli),
            other => Err(format!("unknown OCR engine '{other}', expected library or cli")),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub engine: EngineKind,
    /// Tesseract language code(s), `+`-joined, e.g. `ind` or `ind+eng`.
    pub language: String,
    /// Explicit `tesseract` binary for the cli engine.
    pub engine_path: Option<PathBuf>,
    /// Directory holding `*.traineddata`.
    pub tessdata_path: Option<PathBuf>,
    pub page_seg_mode: u8,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    pub max_image_bytes: usize,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Library,
            language: "ind".to_string(),
            engine_path: None,
            tessdata_path: None,
            page_seg_mode: 6,
            timeout_secs: 60,
            max_concurrency: default_concurrency(),
            max_image_bytes: 10 * 1024 * 1024,
            max_image_dimension: 8000,
            min_image_dimension: 16,
        }
    }
}

impl OcrConfig {
    /// Body size needed to carry a maximal image as base64 inside JSON.
    pub fn default_body_limit(&self) -> usize {
        self.max_image_bytes / 3 * 4 + 4 + 64 * 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        let ocr = OcrConfig {
            engine: parse_env_or("OCR_ENGINE", EngineKind::Library),
            language: env::var("OCR_LANGUAGE")
                .ok()
                .filter(|lang| !lang.trim().is_empty())
                .unwrap_or_else(|| "ind".to_string()),
            engine_path: env_path("OCR_ENGINE_PATH"),
            tessdata_path: env_path("OCR_TESSDATA_PATH").or_else(|| env_path("TESSDATA_PREFIX")),
            page_seg_mode: page_seg_mode_from_env(),
            timeout_secs: parse_env_or::<u64>("OCR_TIMEOUT", 60).max(1),
            max_concurrency: parse_env_or("OCR_MAX_CONCURRENCY", default_concurrency()).max(1),
            max_image_bytes: parse_env_or("OCR_MAX_IMAGE_BYTES", 10 * 1024 * 1024),
            max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 8000),
            min_image_dimension: parse_env_or("OCR_MIN_DIMENSION", 16),
        };

        Self {
            server: ServerConfig {
                host: env::var("KTP_OCR_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("KTP_OCR_PORT", 5000),
                api_keys: env::var("API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                max_body_bytes: parse_env_opt("SERVER_MAX_BODY_BYTES")
                    .unwrap_or_else(|| ocr.default_body_limit()),
            },
            log: LogConfig {
                format: parse_env_or("LOG_FORMAT", LogFormat::Text),
            },
            ocr,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
