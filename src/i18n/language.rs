//! Language type: validated, canonical language representation.
//!
//! A `Language` can only be built through the registry, so holding one means
//! the engine tag it carries is known to the registry.

use crate::error::GatewayError;
use crate::i18n::{LanguageEntry, LanguageRegistry, Scheme};

/// A language validated against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// Canonical engine tag (e.g., "eng_Latn")
    code: &'static str,
}

impl Language {
    /// English, also the fallback source language for documents.
    pub const ENGLISH: Language = Language { code: "eng_Latn" };

    /// Create a Language from an identifier in any scheme.
    ///
    /// Accepts display names, ISO codes, engine tags and TTS tags.
    ///
    /// # Example
    /// ```ignore
    /// let french = Language::from_identifier("fr")?;
    /// assert_eq!(french.code(), "fra_Latn");
    /// ```
    pub fn from_identifier(identifier: &str) -> Result<Language, GatewayError> {
        let code = LanguageRegistry::get().resolve(identifier, Scheme::CANONICAL)?;
        Ok(Language { code })
    }

    /// Create a Language from a code reported by a language detector.
    ///
    /// Detector codes must match a registered key or code exactly: a detected
    /// language the registry lacks, such as Latin (`lat`), is rejected rather
    /// than matched inside a longer tag like `eng_Latn`.
    pub fn from_detected(code: &str) -> Result<Language, GatewayError> {
        let registry = LanguageRegistry::get();
        let entry = registry
            .find_exact(code)
            .ok_or_else(|| GatewayError::UnsupportedLanguage(code.trim().to_lowercase()))?;
        let code = entry
            .code(Scheme::CANONICAL)
            .ok_or_else(|| GatewayError::MissingCodeForScheme {
                language: entry.key.to_string(),
                scheme: Scheme::CANONICAL,
            })?;
        Ok(Language { code })
    }

    /// The canonical engine tag.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The registry entry for this language.
    ///
    /// # Panics
    /// Panics if the code is not in the registry, which cannot happen for a
    /// Language built through `from_identifier` or the constants.
    pub fn entry(&self) -> &'static LanguageEntry {
        LanguageRegistry::get()
            .entries()
            .iter()
            .find(|entry| entry.bos == self.code)
            .expect("Language code should always be registered")
    }

    /// English name of the language.
    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// This language's code in another scheme.
    pub fn code_for(&self, scheme: Scheme) -> Result<&'static str, GatewayError> {
        let entry = self.entry();
        entry
            .code(scheme)
            .ok_or_else(|| GatewayError::MissingCodeForScheme {
                language: entry.key.to_string(),
                scheme,
            })
    }
}
