use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;

/// Unified error type for ai-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Configuration (loading, validation, provider selection)
/// - Completion provider calls (network, auth, malformed responses)
/// - Terminology file loading
/// - Document extraction and write-back
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    /// Missing required configuration field
    #[error("missing required config field: {0}")]
    ConfigMissing(String),

    /// Endpoint name that is not one of the known providers
    #[error("unknown endpoint '{0}' (expected OpenAI, Groq, Gemini, TogetherAI, Ollama or CUSTOM)")]
    UnknownEndpoint(String),

    // ==========================================================================
    // Provider Errors
    // ==========================================================================
    /// Request to the completion provider failed before a response arrived
    #[error("completion request failed: {0}")]
    ProviderRequest(String),

    /// Provider answered with a non-success HTTP status
    #[error("completion provider returned HTTP {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    /// Provider response could not be decoded
    #[error("invalid completion response: {0}")]
    ProviderInvalidResponse(String),

    /// Provider response decoded but carried no content
    #[error("completion response contained no content")]
    ProviderEmptyResponse,

    // ==========================================================================
    // Pipeline Errors
    // ==========================================================================
    /// A pipeline stage aborted; carries the stage for diagnosis
    #[error("translation pipeline aborted during {stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    // ==========================================================================
    // Terminology Errors
    // ==========================================================================
    /// Terminology file could not be read
    #[error("failed to load terminology from {}: {reason}", path.display())]
    TerminologyLoad { path: PathBuf, reason: String },

    // ==========================================================================
    // Document Errors
    // ==========================================================================
    /// Failed to open or parse a document
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    /// Failed to extract text from a document
    #[error("failed to extract text: {0}")]
    DocumentExtraction(String),

    /// Failed to save a translated document
    #[error("failed to save document: {0}")]
    DocumentSave(String),

    /// A locator kind the adapter cannot resolve
    #[error("locator {0} is not supported by this document")]
    UnsupportedLocator(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an error with the pipeline stage it aborted.
    pub fn at_stage(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// True for missing or invalid provider setup.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::ConfigLoad(_)
            | Self::ConfigInvalid { .. }
            | Self::ConfigMissing(_)
            | Self::UnknownEndpoint(_) => true,
            Self::Stage { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    /// True for network, auth, or API failures from the completion provider.
    pub fn is_provider(&self) -> bool {
        match self {
            Self::ProviderRequest(_)
            | Self::ProviderStatus { .. }
            | Self::ProviderInvalidResponse(_)
            | Self::ProviderEmptyResponse => true,
            Self::Stage { source, .. } => source.is_provider(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
