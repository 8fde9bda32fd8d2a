use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::style::Style;

/// A language as the user names it ("English", "Vietnamese", ...).
///
/// Names are free-form and are not validated against the language table;
/// comparisons between languages are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against another language name
    pub fn matches(&self, other: &str) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.trim())
    }
}

// Serde default functions for common languages
fn default_source_lang() -> Lang {
    Lang::new("English")
}

fn default_target_lang() -> Lang {
    Lang::new("Spanish")
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Completion providers the client knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    #[default]
    OpenAi,
    Groq,
    Gemini,
    TogetherAi,
    Ollama,
    /// Any OpenAI-compatible server; requires an explicit base URL
    Custom,
}

impl Endpoint {
    pub const ALL: [Self; 6] = [
        Self::OpenAi,
        Self::Groq,
        Self::Gemini,
        Self::TogetherAi,
        Self::Ollama,
        Self::Custom,
    ];

    /// Display name, also the stem of the credential variable
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Groq => "Groq",
            Self::Gemini => "Gemini",
            Self::TogetherAi => "TogetherAI",
            Self::Ollama => "Ollama",
            Self::Custom => "CUSTOM",
        }
    }

    pub const fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Self::TogetherAi => Some("https://api.together.xyz/v1"),
            Self::Ollama => Some("http://localhost:11434/v1"),
            Self::Custom => None,
        }
    }

    /// Recommended model when none is configured
    pub const fn default_model(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("gpt-4o"),
            Self::Groq => Some("llama3-70b-8192"),
            Self::Gemini => Some("gemini-2.5-flash-preview-04-17"),
            Self::TogetherAi => Some("Qwen/Qwen2-72B-Instruct"),
            Self::Ollama => Some("llama3"),
            Self::Custom => None,
        }
    }

    /// Environment variable holding the API key: `{NAME}_API_KEY`
    pub fn api_key_env(self) -> String {
        format!("{}_API_KEY", self.name().to_uppercase())
    }

    /// Local servers accept any key
    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama | Self::Custom)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownEndpoint(wanted.to_string()))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Endpoint> for String {
    fn from(e: Endpoint) -> Self {
        e.name().to_string()
    }
}

/// Completion provider configuration.
///
/// Constructed once per job and handed to the client; nothing here is
/// process-global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub endpoint: Endpoint,
    /// Falls back to the endpoint's default model
    #[serde(default)]
    pub model: Option<String>,
    /// Explicit API key; falls back to `{ENDPOINT}_API_KEY`
    pub api_key: Option<String>,
    /// Required for the custom endpoint, overrides the default otherwise
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Requests per minute across every completion call
    #[serde(default = "default_rpm")]
    pub rpm: u32,
    #[serde(default)]
    pub json_mode: bool,
}

/// Sampling temperature when none is configured
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Requests per minute when none is configured
pub const DEFAULT_RPM: NonZeroU32 = match NonZeroU32::new(60) {
    Some(rpm) => rpm,
    None => unreachable!(),
};

const fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

const fn default_rpm() -> u32 {
    DEFAULT_RPM.get()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            rpm: default_rpm(),
            json_mode: false,
        }
    }
}

/// Provider settings after validation and credential lookup
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub endpoint: Endpoint,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub rpm: u32,
    pub json_mode: bool,
}

impl ProviderConfig {
    pub fn new(endpoint: Endpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: Some(model.into()),
            ..Self::default()
        }
    }

    /// Validate and resolve credentials from the process environment.
    pub fn resolve(&self) -> Result<ResolvedProvider> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Validate and resolve credentials using `lookup` for environment variables.
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ResolvedProvider> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::ConfigInvalid {
                field: "temperature".to_string(),
                reason: format!("{} is outside [0, 1]", self.temperature),
            });
        }
        if self.rpm == 0 {
            return Err(Error::ConfigInvalid {
                field: "rpm".to_string(),
                reason: "must be at least 1 request per minute".to_string(),
            });
        }

        let base_url = self
            .base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.endpoint.default_base_url().map(str::to_string))
            .ok_or_else(|| {
                Error::ConfigMissing(format!("base_url (required for {} endpoint)", self.endpoint))
            })?;

        let model = match self.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) => model.to_string(),
            None => self
                .endpoint
                .default_model()
                .map(str::to_string)
                .ok_or_else(|| Error::ConfigMissing(format!("model (required for {} endpoint)", self.endpoint)))?,
        };

        let api_key = match self.endpoint {
            Endpoint::Ollama => Some("ollama".to_string()),
            endpoint => {
                let key = self
                    .api_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
                    .or_else(|| lookup(&endpoint.api_key_env()));
                if key.is_none() && endpoint.requires_api_key() {
                    return Err(Error::ConfigMissing(format!(
                        "API key (pass one explicitly or set {})",
                        endpoint.api_key_env()
                    )));
                }
                key
            }
        };

        Ok(ResolvedProvider {
            endpoint: self.endpoint,
            base_url,
            api_key,
            model,
            temperature: self.temperature,
            rpm: self.rpm,
            json_mode: self.json_mode,
        })
    }
}

/// Per-job translation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettings {
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Adapt wording to the language as spoken in this country
    pub country: Option<String>,

    /// Style key; unknown keys fall back to General
    #[serde(default)]
    pub style: String,

    pub custom_style_instructions: Option<String>,

    /// `source=target` glossary file
    pub terminology_file: Option<PathBuf>,

    /// Texts above this many tokens are chunked
    #[serde(default = "default_max_tokens_per_chunk")]
    pub max_tokens_per_chunk: usize,

    /// Fragments per batched completion call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Group document fragments by detected language
    #[serde(default = "default_true")]
    pub detect_languages: bool,

    /// Delimiter joining batched fragments
    #[serde(default = "default_separator")]
    pub separator: String,
}

const fn default_max_tokens_per_chunk() -> usize {
    1000
}

const fn default_batch_size() -> usize {
    100
}

const fn default_true() -> bool {
    true
}

fn default_separator() -> String {
    crate::batch::DEFAULT_SEPARATOR.to_string()
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            country: None,
            style: Style::General.key().to_string(),
            custom_style_instructions: None,
            terminology_file: None,
            max_tokens_per_chunk: default_max_tokens_per_chunk(),
            batch_size: default_batch_size(),
            detect_languages: true,
            separator: default_separator(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Separate provider for the reflection and improvement passes
    #[serde(default)]
    pub reviewer: Option<ProviderConfig>,

    /// Translation defaults
    #[serde(default)]
    pub translation: TranslationSettings,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations (~/.config/ai-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("ai-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}
