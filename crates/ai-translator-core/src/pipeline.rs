//! Translate → reflect → improve.
//!
//! The pipeline always produces an initial draft. When the caller asks for
//! the full response it then has the model critique the draft and revise it
//! against that critique. A completion failure aborts the pipeline in the
//! stage where it happened; nothing computed earlier is returned.

use std::fmt;

use crate::chunk::Chunker;
use crate::completion::{CompletionClient, DEFAULT_SYSTEM_MESSAGE};
use crate::config::{Lang, TranslationSettings};
use crate::error::Result;
use crate::prompts;
use crate::style::Style;
use crate::terminology::Terminology;

/// Where the pipeline is (or where it stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    InitialDraft,
    Reflecting,
    Improving,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InitialDraft => "initial draft",
            Self::Reflecting => "reflecting",
            Self::Improving => "improving",
            Self::Done => "done",
        })
    }
}

/// Everything one pipeline or batch invocation needs to know about the job.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub source_lang: Lang,
    pub target_lang: Lang,
    pub country: Option<String>,
    pub style: Style,
    pub custom_style_instructions: Option<String>,
    pub terminology: Terminology,
    pub max_tokens_per_chunk: usize,
}

impl TranslationRequest {
    pub fn new(source_lang: impl Into<Lang>, target_lang: impl Into<Lang>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            country: None,
            style: Style::General,
            custom_style_instructions: None,
            terminology: Terminology::new(),
            max_tokens_per_chunk: 1000,
        }
    }

    /// Build from job settings, loading the terminology file if one is named.
    pub fn from_settings(settings: &TranslationSettings) -> Result<Self> {
        let terminology = match settings.terminology_file {
            Some(ref path) => Terminology::from_file(path)?,
            None => Terminology::new(),
        };

        Ok(Self {
            source_lang: settings.source_lang.clone(),
            target_lang: settings.target_lang.clone(),
            country: settings.country.clone(),
            style: Style::from_key(&settings.style),
            custom_style_instructions: settings.custom_style_instructions.clone(),
            terminology,
            max_tokens_per_chunk: settings.max_tokens_per_chunk.max(1),
        })
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_custom_style(mut self, instructions: impl Into<String>) -> Self {
        self.custom_style_instructions = Some(instructions.into());
        self
    }

    #[must_use]
    pub fn with_terminology(mut self, terminology: Terminology) -> Self {
        self.terminology = terminology;
        self
    }

    #[must_use]
    pub fn with_max_tokens_per_chunk(mut self, max_tokens: usize) -> Self {
        self.max_tokens_per_chunk = max_tokens.max(1);
        self
    }

    /// Style instructions plus any custom instructions
    pub fn style_prompt(&self) -> String {
        self.style.prompt(self.custom_style_instructions.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub initial_translation: String,
    pub reflection: Option<String>,
    pub final_translation: Option<String>,
}

impl PipelineResult {
    /// The improved translation when one was produced, else the draft.
    pub fn best(&self) -> &str {
        self.final_translation
            .as_deref()
            .unwrap_or(&self.initial_translation)
    }
}

#[derive(Clone)]
pub struct TranslationPipeline {
    client: CompletionClient,
    /// Runs reflection and improvement when set
    reviewer: Option<CompletionClient>,
    chunker: Chunker,
}

impl TranslationPipeline {
    pub const fn new(client: CompletionClient, chunker: Chunker) -> Self {
        Self {
            client,
            reviewer: None,
            chunker,
        }
    }

    /// Pipeline that measures chunks with the `cl100k_base` tokenizer.
    pub fn with_cl100k(client: CompletionClient) -> Result<Self> {
        Ok(Self::new(client, Chunker::cl100k()?))
    }

    /// Send the reflection and improvement passes to a second provider.
    #[must_use]
    pub fn with_reviewer(mut self, reviewer: CompletionClient) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub const fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Client for the review passes: the reviewer if one is set.
    pub fn reviewer(&self) -> &CompletionClient {
        self.reviewer.as_ref().unwrap_or(&self.client)
    }

    /// First-draft translation.
    ///
    /// Texts over the chunk limit are split and each chunk is translated on
    /// its own; chunk translations are joined with a single space.
    pub async fn initial_translation(&self, req: &TranslationRequest, text: &str) -> Result<String> {
        let chunks = self.chunker.split(text, req.max_tokens_per_chunk);
        if chunks.len() > 1 {
            tracing::info!("Translating {} chunks", chunks.len());
        }

        let mut translated = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }
            tracing::debug!("Translating chunk {}/{}", i + 1, chunks.len());
            let output = self
                .client
                .complete(&prompts::initial_translation(req, chunk), DEFAULT_SYSTEM_MESSAGE)
                .await
                .map_err(|e| e.at_stage(Stage::InitialDraft))?;
            translated.push(output.trim().to_string());
        }

        Ok(translated.join(" "))
    }

    /// Critique of `draft`; suggestions only, never a rewritten translation.
    pub async fn reflect(&self, req: &TranslationRequest, source_text: &str, draft: &str) -> Result<String> {
        let output = self
            .reviewer()
            .complete(
                &prompts::reflection(req, source_text, draft),
                &prompts::reflection_system(req),
            )
            .await
            .map_err(|e| e.at_stage(Stage::Reflecting))?;
        Ok(output.trim().to_string())
    }

    /// Revised translation that applies `reflection` to `draft`.
    pub async fn improve(
        &self,
        req: &TranslationRequest,
        source_text: &str,
        draft: &str,
        reflection: &str,
    ) -> Result<String> {
        let output = self
            .reviewer()
            .complete(
                &prompts::improve(req, source_text, draft, reflection),
                &prompts::improve_system(req),
            )
            .await
            .map_err(|e| e.at_stage(Stage::Improving))?;
        Ok(output.trim().to_string())
    }

    /// Run the pipeline. Without `full_response` it stops after the draft.
    pub async fn run(&self, req: &TranslationRequest, text: &str, full_response: bool) -> Result<PipelineResult> {
        let mut stage = Stage::InitialDraft;
        tracing::debug!("Pipeline entering {}", stage);
        let initial_translation = self.initial_translation(req, text).await?;

        if !full_response {
            tracing::debug!("Pipeline {} after initial draft", Stage::Done);
            return Ok(PipelineResult {
                initial_translation,
                reflection: None,
                final_translation: None,
            });
        }

        stage = Stage::Reflecting;
        tracing::debug!("Pipeline entering {} with {}", stage, self.reviewer().provider_name());
        let reflection = self.reflect(req, text, &initial_translation).await?;

        stage = Stage::Improving;
        tracing::debug!("Pipeline entering {}", stage);
        let final_translation = self
            .improve(req, text, &initial_translation, &reflection)
            .await?;

        tracing::debug!("Pipeline {}", Stage::Done);
        Ok(PipelineResult {
            initial_translation,
            reflection: Some(reflection),
            final_translation: Some(final_translation),
        })
    }
}
