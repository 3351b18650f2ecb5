//! Language handling: registry, code resolution, detection and metrics.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for supported languages and their
//!   codes in every naming scheme
//! - `language`: Type-safe canonical `Language` built through the registry
//! - `detect`: Language detection for text of unknown origin
//! - `metrics`: Translation observability counters
//!
//! # Example
//!
//! ```rust,ignore
//! use lingosync::i18n::{LanguageRegistry, Scheme};
//!
//! let registry = LanguageRegistry::get();
//! assert_eq!(registry.resolve("French", Scheme::Bos)?, "fra_Latn");
//! assert_eq!(registry.resolve("fra_Latn", Scheme::Tts)?, "fr");
//! ```

mod detect;
mod language;
mod metrics;
mod registry;

pub use detect::{DetectionError, LanguageCandidate, LanguageDetector, WhatlangDetector};
pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageEntry, LanguageRegistry, Scheme};
