//! Modality adapters: turn a document, image or recording into text, detect
//! its language and hand it to the chunked translator.

pub mod document;
pub mod image;
pub mod speech;

pub use document::{DocumentAdapter, TranslatedDocument};
pub use image::{ImageAdapter, ImageTranslation};
pub use speech::{SpeechAdapter, SpeechTranslation};

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}
