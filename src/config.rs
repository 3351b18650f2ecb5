use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,

    // Server
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub upload_dir: PathBuf,
    /// TrueType font for rendered PDFs; the bundled font when unset
    pub pdf_font_path: Option<PathBuf>,

    // Translation engine
    pub engine_url: String,
    pub engine_max_length: u32,
    /// Overrides the chunk size the engine's resource profile implies
    pub max_chunk_chars: Option<usize>,

    // Collaborating services
    pub ocr_url: String,
    pub stt_url: String,
    pub tts_url: String,
    pub stt_language_hint: bool,
    pub http_timeout: Duration,

    // Protects operational endpoints such as /api/metrics
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            // Server
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| default_cors_origins()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(25 * 1024 * 1024),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
            pdf_font_path: std::env::var("PDF_FONT_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),

            // Translation engine
            engine_url: std::env::var("ENGINE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            engine_max_length: std::env::var("ENGINE_MAX_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            max_chunk_chars: match std::env::var("MAX_CHUNK_CHARS") {
                Ok(v) => Some(
                    v.parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .context("MAX_CHUNK_CHARS must be a positive integer")?,
                ),
                Err(_) => None,
            },

            // Collaborating services
            ocr_url: std::env::var("OCR_URL")
                .unwrap_or_else(|_| "http://localhost:5001".to_string()),
            stt_url: std::env::var("STT_URL")
                .unwrap_or_else(|_| "http://localhost:5002".to_string()),
            tts_url: std::env::var("TTS_URL")
                .unwrap_or_else(|_| "http://localhost:5003".to_string()),
            stt_language_hint: std::env::var("STT_LANGUAGE_HINT")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
            ),

            api_key: std::env::var("API_KEY").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
        "http://localhost:8000".to_string(),
    ]
}
