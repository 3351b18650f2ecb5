//! HTTP surface of the gateway.
//!
//! Every route delegates to the chunked translator or one of the modality
//! adapters; failures are rendered by `GatewayError` as `{"error": "..."}`.

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::adapters::{
    DocumentAdapter, ImageAdapter, ImageTranslation, SpeechAdapter, SpeechTranslation, Upload,
};
use crate::config::Config;
use crate::error::GatewayError;
use crate::i18n::{Language, LanguageRegistry, MetricsReport, Scheme, TranslationMetrics};
use crate::security;
use crate::translation::ChunkedTranslator;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    translator: Arc<ChunkedTranslator>,
    documents: Arc<DocumentAdapter>,
    images: Arc<ImageAdapter>,
    speech: Arc<SpeechAdapter>,
    metrics: &'static TranslationMetrics,
    api_key: Option<String>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        translator: Arc<ChunkedTranslator>,
        documents: DocumentAdapter,
        images: ImageAdapter,
        speech: SpeechAdapter,
    ) -> Self {
        Self {
            translator,
            documents: Arc::new(documents),
            images: Arc::new(images),
            speech: Arc::new(speech),
            metrics: TranslationMetrics::global(),
            api_key: None,
            started_at: Utc::now(),
        }
    }

    /// Require `X-API-Key` on operational endpoints.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_metrics(mut self, metrics: &'static TranslationMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Transport settings for the router.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl HttpOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cors_origins: config.cors_origins.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

pub fn router(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/languages", get(languages))
        .route("/api/metrics", get(metrics))
        .route("/api/translate/translate", post(translate_text))
        .route("/api/documents/translate_document", post(translate_document))
        .route("/api/images/image-translate", post(translate_image))
        .route("/api/speech/speech-translate", post(translate_speech))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(cors_layer(&options.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ==================== Operational ====================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.translator.engine().is_loaded() {
        "ok"
    } else {
        "starting"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub key: String,
    pub name: String,
    pub code: String,
    pub iso_639_1: Option<String>,
    pub tts: Option<String>,
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    let languages = LanguageRegistry::get()
        .entries()
        .iter()
        .map(|entry| LanguageInfo {
            key: entry.key.to_string(),
            name: entry.name.to_string(),
            code: entry.bos.to_string(),
            iso_639_1: entry.code(Scheme::Iso6391).map(str::to_string),
            tts: entry.code(Scheme::Tts).map(str::to_string),
        })
        .collect();
    Json(languages)
}

async fn metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MetricsReport>, GatewayError> {
    if !security::is_authorized(state.api_key.as_deref(), &headers) {
        return Err(GatewayError::Unauthorized);
    }
    Ok(Json(state.metrics.report()))
}

// ==================== Text ====================

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

async fn translate_text(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;

    let source = Language::from_identifier(&request.source_lang)?;
    let target = Language::from_identifier(&request.target_lang)?;
    info!(
        "Text translation: {} chars, {} -> {}",
        request.text.chars().count(),
        source.code(),
        target.code()
    );

    let translated_text = state
        .translator
        .translate(&request.text, source.code(), target.code())
        .await?;

    Ok(Json(TranslateResponse { translated_text }))
}

// ==================== Uploads ====================

/// Fields of the multipart form shared by the upload endpoints.
#[derive(Debug)]
struct UploadForm {
    upload: Upload,
    target_lang: String,
}

async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadForm, GatewayError> {
    let mut multipart = multipart.map_err(|e| GatewayError::InvalidUpload(e.body_text()))?;
    let mut upload = None;
    let mut target_lang = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(upload_error)?;
                upload = Some(Upload::new(file_name, bytes.to_vec()));
            }
            Some("target_lang") => {
                let value = field.text().await.map_err(upload_error)?;
                target_lang = Some(value);
            }
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| GatewayError::InvalidUpload("missing file field".to_string()))?;
    let target_lang = target_lang
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| GatewayError::InvalidUpload("missing target_lang field".to_string()))?;

    Ok(UploadForm {
        upload,
        target_lang,
    })
}

/// Body limit overruns become 413, anything else a malformed form.
fn upload_error(error: MultipartError) -> GatewayError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::UploadTooLarge(error.body_text())
    } else {
        GatewayError::InvalidUpload(error.body_text())
    }
}

async fn translate_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let form = read_upload_form(multipart).await?;
    info!(
        "Document upload {} ({} bytes) -> {}",
        form.upload.file_name,
        form.upload.bytes.len(),
        form.target_lang
    );

    let document = state
        .documents
        .translate(form.upload, &form.target_lang)
        .await?;
    info!("✓ Document rendered to {}", document.path.display());

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name),
        ),
    ];
    Ok((headers, document.bytes))
}

async fn translate_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageTranslation>, GatewayError> {
    let form = read_upload_form(multipart).await?;
    info!(
        "Image upload {} ({} bytes) -> {}",
        form.upload.file_name,
        form.upload.bytes.len(),
        form.target_lang
    );

    let result = state.images.translate(form.upload, &form.target_lang).await?;
    Ok(Json(result))
}

async fn translate_speech(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SpeechTranslation>, GatewayError> {
    let form = read_upload_form(multipart).await?;
    info!(
        "Speech upload {} ({} bytes) -> {}",
        form.upload.file_name,
        form.upload.bytes.len(),
        form.target_lang
    );

    let result = state.speech.translate(form.upload, &form.target_lang).await?;
    Ok(Json(result))
}
