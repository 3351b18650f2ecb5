//! Translation engine client and its lazily initialized shared handle.
//!
//! The engine is an external inference server speaking JSON over HTTP. It is
//! loaded once per process: the first caller triggers the load, concurrent
//! callers wait for that same load, and a loaded engine is never replaced.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::Config;
use crate::error::GatewayError;

/// Execution environment of the engine, which bounds how much text it can
/// take per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceProfile {
    /// GPU or other accelerator with constrained memory
    #[serde(alias = "cuda", alias = "gpu")]
    Accelerated,
    /// CPU execution
    #[serde(alias = "cpu")]
    Standard,
}

impl ResourceProfile {
    /// Maximum characters sent to the engine in one call.
    pub fn chunk_threshold(&self) -> usize {
        match self {
            ResourceProfile::Accelerated => 250,
            ResourceProfile::Standard => 500,
        }
    }
}

/// Black-box translator: text + source tag + target tag -> translated text.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        max_length: u32,
    ) -> Result<String>;

    fn profile(&self) -> ResourceProfile;
}

/// Produces a ready engine. Called at most once per successful load.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TranslationEngine>>;
}

/// Shared, lazily loaded engine.
pub struct EngineHandle {
    loader: Arc<dyn EngineLoader>,
    engine: OnceCell<Arc<dyn TranslationEngine>>,
}

impl EngineHandle {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            engine: OnceCell::new(),
        }
    }

    /// Handle around an engine that is already loaded.
    pub fn ready(engine: Arc<dyn TranslationEngine>) -> Self {
        Self {
            loader: Arc::new(AlreadyLoaded(engine.clone())),
            engine: OnceCell::new_with(Some(engine)),
        }
    }

    /// The loaded engine, loading it first if needed.
    ///
    /// A failed load leaves the handle empty so a later call can try again.
    pub async fn get(&self) -> Result<Arc<dyn TranslationEngine>, GatewayError> {
        self.engine
            .get_or_try_init(|| async {
                info!("Loading translation engine...");
                match self.loader.load().await {
                    Ok(engine) => {
                        info!("✓ Translation engine ready ({:?} profile)", engine.profile());
                        Ok(engine)
                    }
                    Err(e) => {
                        error!("Translation engine initialization failed: {:#}", e);
                        Err(GatewayError::EngineUnavailable(format!("{:#}", e)))
                    }
                }
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }
}

struct AlreadyLoaded(Arc<dyn TranslationEngine>);

#[async_trait]
impl EngineLoader for AlreadyLoaded {
    async fn load(&self) -> Result<Arc<dyn TranslationEngine>> {
        Ok(self.0.clone())
    }
}

// ==================== HTTP engine ====================

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    src_lang: &'a str,
    tgt_lang: &'a str,
    max_length: u32,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation_text: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    device: ResourceProfile,
    #[serde(default)]
    model: Option<String>,
}

/// Engine served by an HTTP inference server.
pub struct HttpTranslationEngine {
    client: reqwest::Client,
    base_url: String,
    profile: ResourceProfile,
}

impl HttpTranslationEngine {
    pub fn new(client: reqwest::Client, base_url: &str, profile: ResourceProfile) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile,
        }
    }
}

#[async_trait]
impl TranslationEngine for HttpTranslationEngine {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        max_length: u32,
    ) -> Result<String> {
        let request = TranslateRequest {
            text,
            src_lang: source,
            tgt_lang: target,
            max_length,
        };

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to translation engine")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Translation engine error ({}): {}", status, body);
        }

        let translated: TranslateResponse = response
            .json()
            .await
            .context("Failed to parse translation engine response")?;

        Ok(translated.translation_text)
    }

    fn profile(&self) -> ResourceProfile {
        self.profile
    }
}

/// Loads the HTTP engine by asking the inference server to report ready.
pub struct HttpEngineLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEngineLoader {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self::new(client, &config.engine_url))
    }
}

#[async_trait]
impl EngineLoader for HttpEngineLoader {
    async fn load(&self) -> Result<Arc<dyn TranslationEngine>> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Failed to reach translation engine")?;

        if !response.status().is_success() {
            anyhow::bail!("Translation engine not ready ({})", response.status());
        }

        let health: HealthResponse = response
            .json()
            .await
            .context("Failed to parse translation engine health response")?;

        if health.status != "ready" {
            anyhow::bail!("Translation engine reported status '{}'", health.status);
        }

        info!(
            "Engine model {} on {:?} hardware",
            health.model.as_deref().unwrap_or("<unknown>"),
            health.device
        );

        Ok(Arc::new(HttpTranslationEngine::new(
            self.client.clone(),
            &self.base_url,
            health.device,
        )))
    }
}
