//! Model-backed language detection, normalized against a fixed name table.

use crate::completion::{CallOptions, CompletionClient};
use crate::error::Result;
use crate::util::truncate_chars;

/// Returned without a model call for texts too short to classify
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Trimmed texts shorter than this are not sent for detection
pub const MIN_DETECT_CHARS: usize = 10;

/// Only this many leading characters are sent for detection
pub const DETECT_SAMPLE_CHARS: usize = 500;

const DETECT_SYSTEM_MESSAGE: &str =
    "You are a language detection expert. Respond with only the language name.";

/// Canonical language names with their ISO 639 codes
pub const LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese", "pt"),
    ("Russian", "ru"),
    ("Japanese", "ja"),
    ("Chinese", "zh"),
    ("Korean", "ko"),
    ("Arabic", "ar"),
    ("Hindi", "hi"),
    ("Vietnamese", "vi"),
    ("Thai", "th"),
    ("Dutch", "nl"),
    ("Greek", "el"),
    ("Turkish", "tr"),
    ("Polish", "pl"),
    ("Swedish", "sv"),
    ("Danish", "da"),
    ("Finnish", "fi"),
    ("Norwegian", "no"),
    ("Hungarian", "hu"),
    ("Czech", "cs"),
    ("Romanian", "ro"),
    ("Bulgarian", "bg"),
    ("Ukrainian", "uk"),
    ("Hebrew", "he"),
    ("Indonesian", "id"),
    ("Malay", "ms"),
    ("Urdu", "ur"),
    ("Persian", "fa"),
    ("Bengali", "bn"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("Marathi", "mr"),
    ("Gujarati", "gu"),
    ("Kannada", "kn"),
    ("Malayalam", "ml"),
    ("Punjabi", "pa"),
    ("Sinhala", "si"),
    ("Nepali", "ne"),
    ("Khmer", "km"),
    ("Lao", "lo"),
    ("Myanmar", "my"),
    ("Amharic", "am"),
    ("Swahili", "sw"),
    ("Zulu", "zu"),
    ("Afrikaans", "af"),
    ("Albanian", "sq"),
    ("Armenian", "hy"),
    ("Azerbaijani", "az"),
    ("Basque", "eu"),
    ("Belarusian", "be"),
    ("Bosnian", "bs"),
    ("Catalan", "ca"),
    ("Croatian", "hr"),
    ("Estonian", "et"),
    ("Filipino", "fil"),
    ("Galician", "gl"),
    ("Georgian", "ka"),
    ("Icelandic", "is"),
    ("Irish", "ga"),
    ("Latvian", "lv"),
    ("Lithuanian", "lt"),
    ("Luxembourgish", "lb"),
    ("Macedonian", "mk"),
    ("Maltese", "mt"),
    ("Mongolian", "mn"),
    ("Montenegrin", "me"),
    ("Serbian", "sr"),
    ("Slovak", "sk"),
    ("Slovenian", "sl"),
    ("Welsh", "cy"),
    ("Yiddish", "yi"),
];

/// ISO code for a canonical language name
pub fn language_code(name: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(_, code)| *code)
}

/// Map a raw model answer onto a canonical name.
///
/// Tries an exact match, then a case-insensitive substring match in either
/// direction; returns the raw (trimmed) answer when nothing matches.
pub fn normalize_language(raw: &str) -> String {
    let raw = raw.trim();
    if let Some((name, _)) = LANGUAGES.iter().find(|(name, _)| *name == raw) {
        return (*name).to_string();
    }

    let lowered = raw.to_lowercase();
    if !lowered.is_empty()
        && let Some((name, _)) = LANGUAGES.iter().find(|(name, _)| {
            let name = name.to_lowercase();
            lowered.contains(&name) || name.contains(&lowered)
        })
    {
        return (*name).to_string();
    }

    raw.to_string()
}

/// Classifies text by asking the completion model for the language name.
#[derive(Clone)]
pub struct LanguageDetector {
    client: CompletionClient,
}

impl LanguageDetector {
    pub const fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    fn prompt(text: &str) -> String {
        format!(
            "Detect the language of the following text.\n\
             Return ONLY the language name in English (e.g., \"English\", \"Spanish\", \"French\").\n\
             Do not include any explanation or additional text.\n\n\
             Text: {}",
            truncate_chars(text, DETECT_SAMPLE_CHARS)
        )
    }

    /// Detect the language of `text`.
    ///
    /// Texts under [`MIN_DETECT_CHARS`] return [`UNKNOWN_LANGUAGE`] without a call.
    pub async fn detect(&self, text: &str) -> Result<String> {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_DETECT_CHARS {
            return Ok(UNKNOWN_LANGUAGE.to_string());
        }

        let options = CallOptions {
            temperature: Some(0.1),
            json_mode: Some(false),
            ..CallOptions::default()
        };
        let raw = self
            .client
            .complete_with(&Self::prompt(trimmed), DETECT_SYSTEM_MESSAGE, options)
            .await?;

        let language = normalize_language(&raw);
        tracing::debug!("Detected '{}' (raw answer '{}')", language, raw.trim());
        Ok(language)
    }
}
