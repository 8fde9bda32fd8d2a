//! AI Translator Core Library
//!
//! This library provides the core of an LLM translation workflow:
//! - Rate-limited calls to OpenAI-compatible chat-completion endpoints
//! - Token-bounded chunking of long text
//! - The translate → reflect → improve pipeline
//! - Batched translation of many short fragments in one call
//! - Language detection and per-language grouping
//! - Text, PDF and Excel document adapters

pub mod batch;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod job;
pub mod language;
pub mod pipeline;
pub mod prompts;
pub mod style;
pub mod terminology;
pub mod util;

pub use batch::{BatchOutcome, BatchStatus, BatchTranslator, DEFAULT_SEPARATOR};
pub use chunk::{Chunker, TiktokenCounter, TokenCounter};
pub use completion::{
    CallOptions, ClientSettings, CompletionClient, CompletionProvider, CompletionRequest, OpenAiProvider,
    ProviderInfo, RateLimiter,
};
pub use config::{AppConfig, Endpoint, Lang, ProviderConfig, ResolvedProvider, TranslationSettings};
pub use document::{DocumentAdapter, Fragment, Locator, PdfDocument, TextDocument, Workbook};
pub use error::{Error, Result};
pub use filter::{clean_text, should_translate};
pub use job::{DirectoryReport, DocumentJob, JobReport, ProgressCallback};
pub use language::{LanguageDetector, normalize_language};
pub use pipeline::{PipelineResult, Stage, TranslationPipeline, TranslationRequest};
pub use style::Style;
pub use terminology::Terminology;
