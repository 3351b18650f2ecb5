use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::{EngineHandle, TranslationEngine};
use crate::error::GatewayError;
use crate::i18n::TranslationMetrics;
use crate::segmenter::{FixedSizeSegmenter, Segmenter};

/// Default generation length cap passed to the engine
pub const DEFAULT_MAX_LENGTH: u32 = 600;

/// Translates text of any length through the shared engine.
///
/// Text longer than the chunk threshold is split by the segmenter and each
/// chunk is translated on its own, in order. A chunk the engine fails on is
/// kept in its original language so one bad chunk never fails the request.
pub struct ChunkedTranslator {
    engine: Arc<EngineHandle>,
    segmenter: Box<dyn Segmenter>,
    max_chunk_chars: Option<usize>,
    max_length: u32,
    metrics: &'static TranslationMetrics,
}

impl ChunkedTranslator {
    pub fn new(engine: Arc<EngineHandle>) -> Self {
        Self {
            engine,
            segmenter: Box::new(FixedSizeSegmenter),
            max_chunk_chars: None,
            max_length: DEFAULT_MAX_LENGTH,
            metrics: TranslationMetrics::global(),
        }
    }

    /// Use a fixed chunk size instead of the engine profile's.
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: Option<usize>) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_segmenter(mut self, segmenter: Box<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn with_metrics(mut self, metrics: &'static TranslationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Translate `text` from `source` to `target` (both canonical engine tags).
    ///
    /// # Errors
    /// * `EmptyInput` for empty or whitespace-only text
    /// * `EngineUnavailable` if the engine cannot be loaded
    /// * `TranslationFailed` if the engine fails on text that was not chunked
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::EmptyInput);
        }

        let engine = self.engine.get().await?;
        self.metrics.record_request();

        let threshold = self
            .max_chunk_chars
            .unwrap_or_else(|| engine.profile().chunk_threshold());

        if text.chars().count() <= threshold {
            return self.translate_single(engine.as_ref(), text, source, target).await;
        }

        let chunks = self.segmenter.segment(text, threshold);
        debug!(
            "Translating {} chars in {} chunks of at most {}",
            text.chars().count(),
            chunks.len(),
            threshold
        );

        let mut translations = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            match self.translate_chunk(engine.as_ref(), chunk, source, target).await {
                Ok(translated) => translations.push(translated),
                Err(e) => {
                    warn!(
                        "Chunk {}/{} translation failed, keeping original text: {}",
                        index + 1,
                        chunks.len(),
                        e
                    );
                    self.metrics.record_degraded_chunk();
                    translations.push(chunk.to_string());
                }
            }
        }

        Ok(translations.join(" "))
    }

    /// One chunk goes through the same contract as a whole request.
    async fn translate_chunk(
        &self,
        engine: &dyn TranslationEngine,
        chunk: &str,
        source: &str,
        target: &str,
    ) -> Result<String, GatewayError> {
        if chunk.trim().is_empty() {
            return Err(GatewayError::EmptyInput);
        }
        self.translate_single(engine, chunk, source, target).await
    }

    async fn translate_single(
        &self,
        engine: &dyn TranslationEngine,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, GatewayError> {
        self.metrics.record_engine_call();
        engine
            .translate(text, source, target, self.max_length)
            .await
            .map_err(|e| {
                self.metrics.record_engine_failure();
                GatewayError::TranslationFailed(format!("{:#}", e))
            })
    }
}
