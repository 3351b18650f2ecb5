//! Speech-to-text and text-to-speech service clients.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a transcription failed.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The service worked but could not make out any speech
    #[error("audio could not be understood")]
    Unintelligible,

    /// The service itself failed or could not be reached
    #[error("{0}")]
    Service(String),
}

/// Transcribes recorded speech.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// `language_hint` is an ISO 639-1 code the service may use to bias recognition.
    async fn transcribe(
        &self,
        audio: &Path,
        language_hint: Option<&str>,
    ) -> Result<String, RecognitionError>;
}

/// Turns text into speech audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voice tags the service can speak, mapped to their display names.
    async fn supported_languages(&self) -> Result<HashMap<String, String>>;

    /// Synthesized audio (MP3) for `text` spoken in `language`.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

// ==================== HTTP speech-to-text ====================

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    transcript: String,
}

pub struct HttpSpeechRecognizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechRecognizer {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn transcribe(
        &self,
        audio: &Path,
        language_hint: Option<&str>,
    ) -> Result<String, RecognitionError> {
        let bytes = tokio::fs::read(audio).await.map_err(|e| {
            RecognitionError::Service(format!("failed to read audio {}: {}", audio.display(), e))
        })?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        let mut form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        if let Some(language) = language_hint {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(format!("{}/recognize", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::Service(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(RecognitionError::Unintelligible);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Service(format!("{} {}", status, body)));
        }

        let recognized: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Service(format!("invalid response: {}", e)))?;

        let transcript = recognized.transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(RecognitionError::Unintelligible);
        }
        Ok(transcript)
    }
}

// ==================== HTTP text-to-speech ====================

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    lang: &'a str,
    slow: bool,
}

pub struct HttpSpeechSynthesizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechSynthesizer {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn supported_languages(&self) -> Result<HashMap<String, String>> {
        let response = self
            .client
            .get(format!("{}/languages", self.base_url))
            .send()
            .await
            .context("Failed to send request to TTS service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("TTS service error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse TTS language list")
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let request = SynthesizeRequest {
            text,
            lang: language,
            slow: false,
        };

        let response = self
            .client
            .post(format!("{}/synthesize", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to TTS service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("TTS service error ({}): {}", status, body);
        }

        let audio = response
            .bytes()
            .await
            .context("Failed to read synthesized audio")?;
        Ok(audio.to_vec())
    }
}
