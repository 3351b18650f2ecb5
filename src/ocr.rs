use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Recognizes text lines in an image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    lines: Vec<OcrLine>,
}

#[derive(Debug, Deserialize)]
struct OcrLine {
    text: String,
}

/// OCR service reached over HTTP.
pub struct HttpOcrEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOcrEngine {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for HttpOcrEngine {
    async fn recognize(&self, image: &Path) -> Result<Vec<String>> {
        let bytes = tokio::fs::read(image)
            .await
            .with_context(|| format!("Failed to read image {}", image.display()))?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/ocr", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("Failed to send request to OCR service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OCR service error ({}): {}", status, body);
        }

        let ocr: OcrResponse = response
            .json()
            .await
            .context("Failed to parse OCR response")?;

        Ok(ocr.lines.into_iter().map(|line| line.text).collect())
    }
}
