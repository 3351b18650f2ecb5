//! Error taxonomy shared by the translator, the adapters and the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::i18n::Scheme;

/// Every failure a gateway request can end with.
///
/// Chunk-level translation failures are not represented here: they are
/// absorbed by the chunked translator, logged and counted in the metrics.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Input text cannot be empty")]
    EmptyInput,

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("No {scheme} code for {language}")]
    MissingCodeForScheme { language: String, scheme: Scheme },

    #[error("Language not supported: {0}")]
    UnsupportedTargetLanguage(String),

    #[error("Source and target languages are the same")]
    SameLanguage,

    #[error("Low confidence in detected language: {language} ({confidence:.2})")]
    LowConfidenceDetection { language: String, confidence: f64 },

    #[error("No text detected in image")]
    NoTextDetected,

    #[error("Could not detect language of the extracted text")]
    LanguageDetectionFailed,

    #[error("Only PDF and DOCX files are supported")]
    UnsupportedFormat,

    #[error("Could not understand audio")]
    TranscriptionFailed,

    #[error("Speech recognition service error: {0}")]
    SpeechServiceUnavailable(String),

    #[error("TTS not supported for {0}")]
    TtsUnavailable(String),

    #[error("Translation engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Translation error: {0}")]
    TranslationFailed(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Translated text cannot be rendered to PDF: {0}")]
    UnrenderableText(String),

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large: {0}")]
    UploadTooLarge(String),

    #[error("Missing or invalid API key")]
    Unauthorized,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status class for this error.
    ///
    /// Invalid requests map to 400, a failing speech service to 502 and a
    /// translation engine that could not be loaded to 503.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::EmptyInput
            | GatewayError::UnsupportedLanguage(_)
            | GatewayError::MissingCodeForScheme { .. }
            | GatewayError::UnsupportedTargetLanguage(_)
            | GatewayError::SameLanguage
            | GatewayError::LowConfidenceDetection { .. }
            | GatewayError::NoTextDetected
            | GatewayError::LanguageDetectionFailed
            | GatewayError::UnsupportedFormat
            | GatewayError::TranscriptionFailed
            | GatewayError::TtsUnavailable(_)
            | GatewayError::InvalidUpload(_)
            | GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UnrenderableText(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::SpeechServiceUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::TranslationFailed(_)
            | GatewayError::ExtractionFailed(_)
            | GatewayError::SynthesisFailed(_)
            | GatewayError::Io(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body sent with every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
