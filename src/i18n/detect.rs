//! Language detection for extracted text, transcriptions and documents.

use thiserror::Error;
use whatlang::Lang;

/// A detected language with the detector's confidence in it.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageCandidate {
    /// Identifier the registry can resolve (ISO 639-3 for the default detector)
    pub code: String,

    /// Confidence in the range 0.0..=1.0
    pub confidence: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum DetectionError {
    #[error("No language could be detected")]
    NoFeatures,
}

/// Detects the language of a piece of text.
pub trait LanguageDetector: Send + Sync {
    /// Candidates ordered by confidence, most likely first. Never empty on success.
    fn detect(&self, text: &str) -> Result<Vec<LanguageCandidate>, DetectionError>;

    /// The most likely candidate.
    fn detect_top(&self, text: &str) -> Result<LanguageCandidate, DetectionError> {
        self.detect(text)?
            .into_iter()
            .next()
            .ok_or(DetectionError::NoFeatures)
    }
}

/// Trigram-based detector backed by `whatlang`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl WhatlangDetector {
    pub fn new() -> Self {
        Self
    }
}

/// Registry identifier for a whatlang language.
///
/// whatlang reports Mandarin as `cmn`; the registry files it under the
/// Chinese macrolanguage.
fn registry_identifier(lang: Lang) -> &'static str {
    match lang {
        Lang::Cmn => "zho",
        other => other.code(),
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<Vec<LanguageCandidate>, DetectionError> {
        let info = whatlang::detect(text).ok_or(DetectionError::NoFeatures)?;

        Ok(vec![LanguageCandidate {
            code: registry_identifier(info.lang()).to_string(),
            confidence: info.confidence(),
        }])
    }
}
