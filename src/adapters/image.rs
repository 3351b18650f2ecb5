use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::Upload;
use crate::error::GatewayError;
use crate::i18n::{Language, LanguageDetector, Scheme};
use crate::ocr::OcrEngine;
use crate::translation::ChunkedTranslator;
use crate::uploads::UploadDir;

#[derive(Debug, Serialize)]
pub struct ImageTranslation {
    pub extracted_text: String,
    pub detected_language: String,
    pub translated_text: String,
}

/// OCR, detect, translate.
pub struct ImageAdapter {
    translator: Arc<ChunkedTranslator>,
    detector: Arc<dyn LanguageDetector>,
    ocr: Arc<dyn OcrEngine>,
    uploads: UploadDir,
}

impl ImageAdapter {
    pub fn new(
        translator: Arc<ChunkedTranslator>,
        detector: Arc<dyn LanguageDetector>,
        ocr: Arc<dyn OcrEngine>,
        uploads: UploadDir,
    ) -> Self {
        Self {
            translator,
            detector,
            ocr,
            uploads,
        }
    }

    pub async fn translate(
        &self,
        upload: Upload,
        target: &str,
    ) -> Result<ImageTranslation, GatewayError> {
        let stored = self.uploads.persist(&upload.file_name, upload.bytes).await?;
        let lines = self
            .ocr
            .recognize(stored.path())
            .await
            .map_err(|e| GatewayError::ExtractionFailed(format!("{:#}", e)))?;
        drop(stored);

        let extracted_text = lines.join("\n");
        if extracted_text.trim().is_empty() {
            return Err(GatewayError::NoTextDetected);
        }

        let candidate = self
            .detector
            .detect_top(&extracted_text)
            .map_err(|_| GatewayError::LanguageDetectionFailed)?;
        let source = Language::from_detected(&candidate.code)?;
        let target = Language::from_identifier(target)?;

        info!(
            "Image text: {} lines, detected {} ({:.2})",
            lines.len(),
            candidate.code,
            candidate.confidence
        );

        let translated_text = self
            .translator
            .translate(&extracted_text, source.code(), target.code())
            .await?;

        Ok(ImageTranslation {
            extracted_text,
            detected_language: source
                .code_for(Scheme::Iso6391)
                .map(str::to_string)
                .unwrap_or(candidate.code),
            translated_text,
        })
    }
}
