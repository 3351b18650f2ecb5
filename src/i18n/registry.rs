//! Language registry: Single source of truth for all supported languages.
//!
//! Every language the gateway accepts is listed here once, together with the
//! code it goes by in each naming scheme (ISO 639-1, ISO 639-3, the engine's
//! BOS tag and the text-to-speech engine's tag). The registry uses a
//! singleton pattern with `OnceLock` and is immutable after initialization.

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::GatewayError;

/// A language naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// Two-letter ISO 639-1 code (e.g., "en")
    Iso6391,
    /// Three-letter ISO 639-3 code (e.g., "eng")
    Iso6393,
    /// Translation engine tag, three letters plus script (e.g., "eng_Latn")
    Bos,
    /// Text-to-speech engine tag (e.g., "en", "zh-CN")
    Tts,
}

impl Scheme {
    /// The scheme every adapter hands to the translator.
    pub const CANONICAL: Scheme = Scheme::Bos;

    pub const ALL: [Scheme; 4] = [Scheme::Iso6391, Scheme::Iso6393, Scheme::Bos, Scheme::Tts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Iso6391 => "iso_639_1",
            Scheme::Iso6393 => "iso_639_3",
            Scheme::Bos => "bos",
            Scheme::Tts => "tts",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One supported language and its codes across schemes.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageEntry {
    /// Canonical key: lowercase English name (e.g., "english")
    pub key: &'static str,

    /// English display name (e.g., "English")
    pub name: &'static str,

    /// ISO 639-1 code, when the language has one
    pub iso_639_1: Option<&'static str>,

    /// ISO 639-3 code
    pub iso_639_3: Option<&'static str>,

    /// Translation engine tag; always present
    pub bos: &'static str,

    /// Text-to-speech tag, when the TTS engine has a voice for the language
    pub tts: Option<&'static str>,
}

impl LanguageEntry {
    /// Code registered for `scheme`, if any.
    pub fn code(&self, scheme: Scheme) -> Option<&'static str> {
        match scheme {
            Scheme::Iso6391 => self.iso_639_1,
            Scheme::Iso6393 => self.iso_639_3,
            Scheme::Bos => Some(self.bos),
            Scheme::Tts => self.tts,
        }
    }

    /// All registered codes, in scheme order.
    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        Scheme::ALL.iter().filter_map(|scheme| self.code(*scheme))
    }

    fn matches_exactly(&self, needle: &str) -> bool {
        self.key == needle || self.codes().any(|code| code.to_lowercase() == needle)
    }

    fn matches_partially(&self, needle: &str) -> bool {
        self.codes().any(|code| code.to_lowercase().contains(needle))
    }
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageEntry>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// All registered languages in registry order.
    pub fn entries(&self) -> &[LanguageEntry] {
        &self.languages
    }

    /// Get a language entry by its canonical key (e.g., "french").
    pub fn get_by_key(&self, key: &str) -> Option<&LanguageEntry> {
        self.languages.iter().find(|lang| lang.key == key)
    }

    /// Find the entry an identifier in any scheme refers to.
    ///
    /// Exact matches (key or any code, case-insensitive, trimmed) win over
    /// partial ones, where the identifier only has to appear inside one of an
    /// entry's codes. Within each pass the first entry in registry order wins.
    pub fn find(&self, identifier: &str) -> Option<&LanguageEntry> {
        let needle = identifier.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.languages
            .iter()
            .find(|lang| lang.matches_exactly(&needle))
            .or_else(|| {
                self.languages
                    .iter()
                    .find(|lang| lang.matches_partially(&needle))
            })
    }

    /// Find the entry whose key or one of whose codes equals the identifier,
    /// without falling back to partial matches.
    pub fn find_exact(&self, identifier: &str) -> Option<&LanguageEntry> {
        let needle = identifier.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.languages
            .iter()
            .find(|lang| lang.matches_exactly(&needle))
    }

    /// Resolve an identifier given in any scheme to its code in `scheme`.
    ///
    /// # Errors
    /// * `UnsupportedLanguage` if no entry matches the identifier
    /// * `MissingCodeForScheme` if the matched entry has no code for `scheme`
    pub fn resolve(&self, identifier: &str, scheme: Scheme) -> Result<&'static str, GatewayError> {
        let entry = self
            .find(identifier)
            .ok_or_else(|| GatewayError::UnsupportedLanguage(identifier.trim().to_lowercase()))?;

        entry
            .code(scheme)
            .ok_or_else(|| GatewayError::MissingCodeForScheme {
                language: entry.key.to_string(),
                scheme,
            })
    }

    /// Whether the identifier resolves to a canonical (engine) code.
    pub fn is_supported(&self, identifier: &str) -> bool {
        self.resolve(identifier, Scheme::CANONICAL).is_ok()
    }
}

fn lang(
    key: &'static str,
    name: &'static str,
    iso_639_1: Option<&'static str>,
    iso_639_3: &'static str,
    bos: &'static str,
    tts: Option<&'static str>,
) -> LanguageEntry {
    LanguageEntry {
        key,
        name,
        iso_639_1,
        iso_639_3: Some(iso_639_3),
        bos,
        tts,
    }
}

/// Default language table.
///
/// Engine tags follow the FLORES-200 naming used by NLLB models. TTS tags
/// are the identifiers Google Translate's speech voices use.
fn default_languages() -> Vec<LanguageEntry> {
    vec![
        lang("english", "English", Some("en"), "eng", "eng_Latn", Some("en")),
        lang("afrikaans", "Afrikaans", Some("af"), "afr", "afr_Latn", Some("af")),
        lang("amharic", "Amharic", Some("am"), "amh", "amh_Ethi", Some("am")),
        lang("arabic", "Arabic", Some("ar"), "ara", "arb_Arab", Some("ar")),
        lang("armenian", "Armenian", Some("hy"), "hye", "hye_Armn", None),
        lang("azerbaijani", "Azerbaijani", Some("az"), "aze", "azj_Latn", None),
        lang("basque", "Basque", Some("eu"), "eus", "eus_Latn", Some("eu")),
        lang("belarusian", "Belarusian", Some("be"), "bel", "bel_Cyrl", None),
        lang("bemba", "Bemba", None, "bem", "bem_Latn", None),
        lang("bengali", "Bengali", Some("bn"), "ben", "ben_Beng", Some("bn")),
        lang("bosnian", "Bosnian", Some("bs"), "bos", "bos_Latn", Some("bs")),
        lang("bulgarian", "Bulgarian", Some("bg"), "bul", "bul_Cyrl", Some("bg")),
        lang("burmese", "Burmese", Some("my"), "mya", "mya_Mymr", Some("my")),
        lang("catalan", "Catalan", Some("ca"), "cat", "cat_Latn", Some("ca")),
        lang("cebuano", "Cebuano", None, "ceb", "ceb_Latn", None),
        lang("chinese", "Chinese (Simplified)", Some("zh"), "zho", "zho_Hans", Some("zh-CN")),
        lang("croatian", "Croatian", Some("hr"), "hrv", "hrv_Latn", Some("hr")),
        lang("czech", "Czech", Some("cs"), "ces", "ces_Latn", Some("cs")),
        lang("danish", "Danish", Some("da"), "dan", "dan_Latn", Some("da")),
        lang("dutch", "Dutch", Some("nl"), "nld", "nld_Latn", Some("nl")),
        lang("estonian", "Estonian", Some("et"), "est", "est_Latn", Some("et")),
        lang("finnish", "Finnish", Some("fi"), "fin", "fin_Latn", Some("fi")),
        lang("french", "French", Some("fr"), "fra", "fra_Latn", Some("fr")),
        lang("galician", "Galician", Some("gl"), "glg", "glg_Latn", Some("gl")),
        lang("georgian", "Georgian", Some("ka"), "kat", "kat_Geor", None),
        lang("german", "German", Some("de"), "deu", "deu_Latn", Some("de")),
        lang("greek", "Greek", Some("el"), "ell", "ell_Grek", Some("el")),
        lang("gujarati", "Gujarati", Some("gu"), "guj", "guj_Gujr", Some("gu")),
        lang("haitian creole", "Haitian Creole", Some("ht"), "hat", "hat_Latn", None),
        lang("hausa", "Hausa", Some("ha"), "hau", "hau_Latn", Some("ha")),
        lang("hebrew", "Hebrew", Some("he"), "heb", "heb_Hebr", Some("iw")),
        lang("hindi", "Hindi", Some("hi"), "hin", "hin_Deva", Some("hi")),
        lang("hungarian", "Hungarian", Some("hu"), "hun", "hun_Latn", Some("hu")),
        lang("icelandic", "Icelandic", Some("is"), "isl", "isl_Latn", Some("is")),
        lang("igbo", "Igbo", Some("ig"), "ibo", "ibo_Latn", None),
        lang("indonesian", "Indonesian", Some("id"), "ind", "ind_Latn", Some("id")),
        lang("italian", "Italian", Some("it"), "ita", "ita_Latn", Some("it")),
        lang("japanese", "Japanese", Some("ja"), "jpn", "jpn_Jpan", Some("ja")),
        lang("javanese", "Javanese", Some("jv"), "jav", "jav_Latn", Some("jw")),
        lang("kannada", "Kannada", Some("kn"), "kan", "kan_Knda", Some("kn")),
        lang("kazakh", "Kazakh", Some("kk"), "kaz", "kaz_Cyrl", None),
        lang("khmer", "Khmer", Some("km"), "khm", "khm_Khmr", Some("km")),
        lang("korean", "Korean", Some("ko"), "kor", "kor_Hang", Some("ko")),
        lang("kyrgyz", "Kyrgyz", Some("ky"), "kir", "kir_Cyrl", None),
        lang("lao", "Lao", Some("lo"), "lao", "lao_Laoo", None),
        lang("latvian", "Latvian", Some("lv"), "lav", "lvs_Latn", Some("lv")),
        lang("lithuanian", "Lithuanian", Some("lt"), "lit", "lit_Latn", Some("lt")),
        lang("luxembourgish", "Luxembourgish", Some("lb"), "ltz", "ltz_Latn", None),
        lang("macedonian", "Macedonian", Some("mk"), "mkd", "mkd_Cyrl", None),
        lang("malagasy", "Malagasy", Some("mg"), "mlg", "plt_Latn", None),
        lang("malay", "Malay", Some("ms"), "msa", "zsm_Latn", Some("ms")),
        lang("malayalam", "Malayalam", Some("ml"), "mal", "mal_Mlym", Some("ml")),
        lang("maltese", "Maltese", Some("mt"), "mlt", "mlt_Latn", None),
        lang("marathi", "Marathi", Some("mr"), "mar", "mar_Deva", Some("mr")),
        lang("mongolian", "Mongolian", Some("mn"), "mon", "khk_Cyrl", None),
        lang("nepali", "Nepali", Some("ne"), "nep", "npi_Deva", Some("ne")),
        lang("norwegian", "Norwegian", Some("nb"), "nob", "nob_Latn", Some("no")),
        lang("oriya", "Oriya", Some("or"), "ori", "ory_Orya", None),
        lang("pashto", "Pashto", Some("ps"), "pus", "pbt_Arab", None),
        lang("persian", "Persian", Some("fa"), "fas", "pes_Arab", None),
        lang("polish", "Polish", Some("pl"), "pol", "pol_Latn", Some("pl")),
        lang("portuguese", "Portuguese", Some("pt"), "por", "por_Latn", Some("pt")),
        lang("punjabi", "Punjabi", Some("pa"), "pan", "pan_Guru", Some("pa")),
        lang("romanian", "Romanian", Some("ro"), "ron", "ron_Latn", Some("ro")),
        lang("russian", "Russian", Some("ru"), "rus", "rus_Cyrl", Some("ru")),
        lang("serbian", "Serbian", Some("sr"), "srp", "srp_Cyrl", Some("sr")),
        lang("shona", "Shona", Some("sn"), "sna", "sna_Latn", None),
        lang("sindhi", "Sindhi", Some("sd"), "snd", "snd_Arab", None),
        lang("sinhala", "Sinhala", Some("si"), "sin", "sin_Sinh", Some("si")),
        lang("slovak", "Slovak", Some("sk"), "slk", "slk_Latn", Some("sk")),
        lang("slovenian", "Slovenian", Some("sl"), "slv", "slv_Latn", None),
        lang("somali", "Somali", Some("so"), "som", "som_Latn", None),
        lang("sorani kurdish", "Sorani Kurdish", None, "ckb", "ckb_Arab", None),
        lang("spanish", "Spanish", Some("es"), "spa", "spa_Latn", Some("es")),
        lang("sundanese", "Sundanese", Some("su"), "sun", "sun_Latn", Some("su")),
        lang("swahili", "Swahili", Some("sw"), "swa", "swh_Latn", Some("sw")),
        lang("swedish", "Swedish", Some("sv"), "swe", "swe_Latn", Some("sv")),
        lang("tagalog", "Tagalog", Some("tl"), "tgl", "tgl_Latn", Some("tl")),
        lang("tamil", "Tamil", Some("ta"), "tam", "tam_Taml", Some("ta")),
        lang("telugu", "Telugu", Some("te"), "tel", "tel_Telu", Some("te")),
        lang("thai", "Thai", Some("th"), "tha", "tha_Thai", Some("th")),
        lang("turkish", "Turkish", Some("tr"), "tur", "tur_Latn", Some("tr")),
        lang("ukrainian", "Ukrainian", Some("uk"), "ukr", "ukr_Cyrl", Some("uk")),
        lang("urdu", "Urdu", Some("ur"), "urd", "urd_Arab", Some("ur")),
        lang("uzbek", "Uzbek", Some("uz"), "uzb", "uzn_Latn", None),
        lang("vietnamese", "Vietnamese", Some("vi"), "vie", "vie_Latn", Some("vi")),
        lang("welsh", "Welsh", Some("cy"), "cym", "cym_Latn", Some("cy")),
        lang("yoruba", "Yoruba", Some("yo"), "yor", "yor_Latn", None),
        lang("zulu", "Zulu", Some("zu"), "zul", "zul_Latn", None),
    ]
}
