use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::Upload;
use crate::document::{self, DocumentFormat, PdfFont, RenderError};
use crate::error::GatewayError;
use crate::i18n::{Language, LanguageDetector};
use crate::translation::ChunkedTranslator;
use crate::uploads::{sanitize_file_name, UploadDir};

/// A translated document rendered as PDF.
#[derive(Debug)]
pub struct TranslatedDocument {
    /// Download name, `translated_<stem>.pdf`
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Where the rendered PDF was kept in the uploads directory
    pub path: PathBuf,
}

pub struct DocumentAdapter {
    translator: Arc<ChunkedTranslator>,
    detector: Arc<dyn LanguageDetector>,
    uploads: UploadDir,
    font: Arc<PdfFont>,
}

impl DocumentAdapter {
    pub fn new(
        translator: Arc<ChunkedTranslator>,
        detector: Arc<dyn LanguageDetector>,
        uploads: UploadDir,
    ) -> Self {
        Self {
            translator,
            detector,
            uploads,
            font: Arc::new(PdfFont::bundled()),
        }
    }

    /// Render translations with `font` instead of the bundled one.
    pub fn with_font(mut self, font: PdfFont) -> Self {
        self.font = Arc::new(font);
        self
    }

    /// Translate a PDF or DOCX upload into `target` and render the result as PDF.
    pub async fn translate(
        &self,
        upload: Upload,
        target: &str,
    ) -> Result<TranslatedDocument, GatewayError> {
        let format =
            DocumentFormat::from_file_name(&upload.file_name).ok_or(GatewayError::UnsupportedFormat)?;
        let target = Language::from_identifier(target)?;

        let stored = self.uploads.persist(&upload.file_name, upload.bytes).await?;
        let path = stored.path().to_path_buf();
        let text = tokio::task::spawn_blocking(move || document::extract_text(&path, format))
            .await
            .map_err(|e| GatewayError::Internal(format!("Extraction task failed: {}", e)))?
            .map_err(|e| GatewayError::ExtractionFailed(format!("{:#}", e)))?;
        drop(stored);

        let source = self.detect_source(&text);
        info!(
            "Translating {} ({} chars) from {} to {}",
            upload.file_name,
            text.chars().count(),
            source.code(),
            target.code()
        );

        let translated = self
            .translator
            .translate(&text, source.code(), target.code())
            .await?;

        let font = self.font.clone();
        let bytes = tokio::task::spawn_blocking(move || document::render_pdf(&translated, &font))
            .await
            .map_err(|e| GatewayError::Internal(format!("Rendering task failed: {}", e)))?
            .map_err(|e| match e {
                RenderError::MissingGlyphs(_) => GatewayError::UnrenderableText(e.to_string()),
                RenderError::Pdf(e) => {
                    GatewayError::Internal(format!("PDF rendering failed: {:#}", e))
                }
            })?;

        let file_name = output_file_name(&upload.file_name);
        let path = self.uploads.write_output(&file_name, &bytes).await?;

        Ok(TranslatedDocument {
            file_name,
            bytes,
            path,
        })
    }

    /// Detected source language, English when detection gives nothing usable.
    fn detect_source(&self, text: &str) -> Language {
        match self.detector.detect_top(text) {
            Ok(candidate) => Language::from_detected(&candidate.code).unwrap_or_else(|e| {
                warn!(
                    "Detected language {} is not usable ({}), assuming English",
                    candidate.code, e
                );
                Language::ENGLISH
            }),
            Err(e) => {
                warn!("Language detection failed ({}), assuming English", e);
                Language::ENGLISH
            }
        }
    }
}

fn output_file_name(upload_name: &str) -> String {
    let stem = Path::new(&sanitize_file_name(upload_name))
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();
    format!("translated_{}.pdf", stem)
}
