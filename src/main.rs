use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use lingosync::adapters::{DocumentAdapter, ImageAdapter, SpeechAdapter};
use lingosync::config::Config;
use lingosync::document::PdfFont;
use lingosync::engine::{EngineHandle, HttpEngineLoader};
use lingosync::i18n::{LanguageDetector, WhatlangDetector};
use lingosync::ocr::HttpOcrEngine;
use lingosync::server::{self, AppState, HttpOptions};
use lingosync::speech::{HttpSpeechRecognizer, HttpSpeechSynthesizer};
use lingosync::translation::ChunkedTranslator;
use lingosync::uploads::UploadDir;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingosync=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!("Starting LingoSync gateway ({})", config.environment);

    let uploads = UploadDir::new(&config.upload_dir);
    uploads
        .ensure()
        .with_context(|| format!("Failed to create upload dir {}", config.upload_dir.display()))?;

    // The engine is loaded before the server accepts traffic
    let engine = Arc::new(EngineHandle::new(Arc::new(HttpEngineLoader::from_config(
        &config,
    )?)));
    engine
        .get()
        .await
        .context("Translation engine failed to start")?;

    let translator = Arc::new(
        ChunkedTranslator::new(engine)
            .with_max_chunk_chars(config.max_chunk_chars)
            .with_max_length(config.engine_max_length),
    );
    let detector: Arc<dyn LanguageDetector> = Arc::new(WhatlangDetector::new());

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")?;

    let pdf_font = match &config.pdf_font_path {
        Some(path) => {
            info!("Rendering PDFs with {}", path.display());
            PdfFont::from_file(path)?
        }
        None => PdfFont::bundled(),
    };

    let documents = DocumentAdapter::new(translator.clone(), detector.clone(), uploads.clone())
        .with_font(pdf_font);
    let images = ImageAdapter::new(
        translator.clone(),
        detector.clone(),
        Arc::new(HttpOcrEngine::new(client.clone(), &config.ocr_url)),
        uploads.clone(),
    );
    let speech = SpeechAdapter::new(
        translator.clone(),
        detector,
        Arc::new(HttpSpeechRecognizer::new(client.clone(), &config.stt_url)),
        Arc::new(HttpSpeechSynthesizer::new(client, &config.tts_url)),
        uploads,
    )
    .with_language_hint(config.stt_language_hint);

    let state = AppState::new(translator, documents, images, speech)
        .with_api_key(config.api_key.clone());
    let app = server::router(state, &HttpOptions::from_config(&config));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("✓ Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
