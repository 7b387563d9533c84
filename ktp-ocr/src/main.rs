use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ktp_ocr::api::{create_router, AppState};
use ktp_ocr::config::{Config, LogFormat};
use ktp_ocr::ocr::OcrProvider;

#[derive(Parser)]
#[command(name = "ktp-ocr")]
#[command(about = "Extracts the text of Indonesian identity card (KTP) images with Tesseract")]
struct Args {
    /// Run OCR on one local image, print the text, and exit instead of serving HTTP
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Tesseract language code(s), overriding OCR_LANGUAGE
    #[arg(long, value_name = "LANG")]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    init_tracing();

    let mut config = Config::from_env();
    if let Some(language) = args.language {
        config.ocr.language = language;
    }

    tracing::info!(
        "Initializing OCR provider: {} ({})...",
        config.ocr.engine,
        config.ocr.language
    );
    let ocr = OcrProvider::new(&config.ocr);
    if !ocr.is_available() {
        tracing::warn!("OCR unavailable - extraction requests will return 503");
    }

    if let Some(path) = args.image {
        return run_once(&ocr, &path).await;
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!("API_KEYS is not set - OCR endpoints accept unauthenticated requests");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_router(AppState::new(config, ocr));

    tracing::info!("KTP OCR starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    // Config::from_env logs parse warnings, so the format is resolved first.
    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or(LogFormat::Text);

    let (json_layer, text_layer) = match format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ktp_ocr=info,tower_http=debug".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run_once(ocr: &OcrProvider, path: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let result = ocr
        .extract(&bytes)
        .await
        .with_context(|| format!("OCR failed for {}", path.display()))?;

    tracing::info!(
        width = result.width,
        height = result.height,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "OCR completed"
    );
    println!("{}", result.text);

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests...");
}
