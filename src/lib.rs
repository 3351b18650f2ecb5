pub mod adapters;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod i18n;
pub mod ocr;
pub mod security;
pub mod segmenter;
pub mod server;
pub mod speech;
pub mod translation;
pub mod uploads;
