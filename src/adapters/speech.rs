use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing::{debug, info};

use super::Upload;
use crate::error::GatewayError;
use crate::i18n::{Language, LanguageDetector, LanguageRegistry, Scheme};
use crate::speech::{RecognitionError, SpeechRecognizer, SpeechSynthesizer};
use crate::translation::ChunkedTranslator;
use crate::uploads::UploadDir;

/// Minimum detector confidence accepted for a transcription
pub const MIN_DETECTION_CONFIDENCE: f64 = 0.70;

#[derive(Debug, Serialize)]
pub struct SpeechTranslation {
    pub transcription: String,
    pub detected_language: String,
    pub translated_text: String,
    /// Synthesized MP3 of the translation, base64 (standard alphabet)
    pub audio_base64: String,
}

/// Speech to translated speech.
///
/// Transcribes the recording, checks which language was spoken, translates
/// the transcription and speaks the translation back in the target language.
pub struct SpeechAdapter {
    translator: Arc<ChunkedTranslator>,
    detector: Arc<dyn LanguageDetector>,
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    uploads: UploadDir,
    language_hint: bool,
}

impl SpeechAdapter {
    pub fn new(
        translator: Arc<ChunkedTranslator>,
        detector: Arc<dyn LanguageDetector>,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        uploads: UploadDir,
    ) -> Self {
        Self {
            translator,
            detector,
            recognizer,
            synthesizer,
            uploads,
            language_hint: false,
        }
    }

    /// Pass the target's ISO 639-1 code to the recognizer as a hint.
    pub fn with_language_hint(mut self, enabled: bool) -> Self {
        self.language_hint = enabled;
        self
    }

    pub async fn translate(
        &self,
        upload: Upload,
        target: &str,
    ) -> Result<SpeechTranslation, GatewayError> {
        if !LanguageRegistry::get().is_supported(target) {
            return Err(GatewayError::UnsupportedTargetLanguage(target.to_string()));
        }

        let stored = self.uploads.persist(&upload.file_name, upload.bytes).await?;

        let hint = if self.language_hint {
            LanguageRegistry::get().resolve(target, Scheme::Iso6391).ok()
        } else {
            None
        };
        let transcription = self
            .recognizer
            .transcribe(stored.path(), hint)
            .await
            .map_err(|e| match e {
                RecognitionError::Unintelligible => GatewayError::TranscriptionFailed,
                RecognitionError::Service(message) => {
                    GatewayError::SpeechServiceUnavailable(message)
                }
            })?;
        drop(stored);
        debug!("Transcribed {} chars", transcription.chars().count());

        let candidate = self
            .detector
            .detect_top(&transcription)
            .map_err(|_| GatewayError::LanguageDetectionFailed)?;
        if candidate.confidence < MIN_DETECTION_CONFIDENCE {
            return Err(GatewayError::LowConfidenceDetection {
                language: candidate.code,
                confidence: candidate.confidence,
            });
        }

        let source = Language::from_detected(&candidate.code)?;
        let target_language = Language::from_identifier(target)?;
        let tts_code = target_language.code_for(Scheme::Tts)?;

        if source == target_language {
            return Err(GatewayError::SameLanguage);
        }

        let voices = self
            .synthesizer
            .supported_languages()
            .await
            .map_err(|e| GatewayError::SynthesisFailed(format!("{:#}", e)))?;
        if !voices.contains_key(tts_code) {
            return Err(GatewayError::TtsUnavailable(target.to_string()));
        }

        info!(
            "Speech: {} -> {} (voice {})",
            source.code(),
            target_language.code(),
            tts_code
        );

        let translated_text = self
            .translator
            .translate(&transcription, source.code(), target_language.code())
            .await?;

        let audio = self
            .synthesizer
            .synthesize(&translated_text, tts_code)
            .await
            .map_err(|e| GatewayError::SynthesisFailed(format!("{:#}", e)))?;

        Ok(SpeechTranslation {
            transcription,
            detected_language: source
                .code_for(Scheme::Iso6391)
                .map(str::to_string)
                .unwrap_or(candidate.code),
            translated_text,
            audio_base64: STANDARD.encode(audio),
        })
    }
}
