//! Many short fragments, one completion call.
//!
//! Fragments are joined with a separator, translated together and split
//! back apart. The result always has one entry per input fragment: a short
//! answer is padded with the untranslated originals, a long one is cut, and
//! an outright call failure hands the originals back. The [`BatchStatus`]
//! says which of those happened.

use crate::completion::CompletionClient;
use crate::pipeline::TranslationRequest;
use crate::prompts;

/// Delimiter between batched fragments
pub const DEFAULT_SEPARATOR: &str = "|||";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every fragment got a translation
    Translated,
    /// Some fragments came back as their untranslated originals
    Degraded { untranslated: usize, total: usize },
    /// The call failed; every fragment is its original
    Failed { error: String },
}

impl BatchStatus {
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Same length and order as the input; blank inputs map to ""
    pub translations: Vec<String>,
    pub status: BatchStatus,
}

impl BatchOutcome {
    /// Number of non-blank fragments left untranslated
    pub fn untranslated(&self, sent: usize) -> usize {
        match self.status {
            BatchStatus::Translated => 0,
            BatchStatus::Degraded { untranslated, .. } => untranslated,
            BatchStatus::Failed { .. } => sent,
        }
    }
}

#[derive(Clone)]
pub struct BatchTranslator {
    client: CompletionClient,
    separator: String,
}

impl BatchTranslator {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            client,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Use a different delimiter; blank separators are ignored.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        if separator.trim().is_empty() {
            tracing::warn!("Ignoring blank batch separator, keeping '{}'", self.separator);
        } else {
            self.separator = separator;
        }
        self
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub const fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Translate `fragments` in one call.
    ///
    /// Never fails: provider errors are logged and reported through
    /// [`BatchStatus::Failed`] with the originals in place.
    pub async fn translate_batch(&self, fragments: &[String], req: &TranslationRequest) -> BatchOutcome {
        let mut translations = vec![String::new(); fragments.len()];
        let positions: Vec<usize> = fragments
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, _)| i)
            .collect();

        if positions.is_empty() {
            return BatchOutcome {
                translations,
                status: BatchStatus::Translated,
            };
        }

        let kept: Vec<&str> = positions.iter().map(|&i| fragments[i].as_str()).collect();
        let combined = kept.join(self.separator.as_str());
        tracing::debug!(
            "Batch of {} fragments ({} chars) from {} to {}",
            kept.len(),
            combined.len(),
            req.source_lang,
            req.target_lang
        );

        let response = self
            .client
            .complete(
                &prompts::batch_user(req, &self.separator, &combined),
                &prompts::batch_system(req, &self.separator),
            )
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Batch translation failed, keeping {} originals: {}", kept.len(), e);
                for (&i, original) in positions.iter().zip(&kept) {
                    translations[i] = (*original).to_string();
                }
                return BatchOutcome {
                    translations,
                    status: BatchStatus::Failed { error: e.to_string() },
                };
            }
        };

        let (segments, untranslated) = self.reconcile(&response, &kept);
        for (&i, segment) in positions.iter().zip(segments) {
            translations[i] = segment;
        }

        let status = if untranslated == 0 {
            BatchStatus::Translated
        } else {
            BatchStatus::Degraded {
                untranslated,
                total: kept.len(),
            }
        };
        BatchOutcome { translations, status }
    }

    /// Split a response and force it to `originals.len()` segments.
    ///
    /// Returns the segments and how many of them are untranslated originals.
    fn reconcile(&self, response: &str, originals: &[&str]) -> (Vec<String>, usize) {
        let mut segments: Vec<String> = response
            .split(self.separator.as_str())
            .map(|s| s.trim().to_string())
            .collect();
        let expected = originals.len();

        if segments.len() != expected {
            tracing::warn!(
                "Batch returned {} segments for {} fragments; {}",
                segments.len(),
                expected,
                if segments.len() < expected {
                    "padding with originals"
                } else {
                    "discarding extras"
                }
            );
        }
        segments.truncate(expected);

        let returned = segments.len();
        let mut untranslated = expected - returned;
        segments.extend(originals[returned..].iter().map(|s| (*s).to_string()));

        for (segment, original) in segments.iter_mut().zip(originals) {
            if segment.is_empty() {
                *segment = (*original).to_string();
                untranslated += 1;
            }
        }

        (segments, untranslated)
    }
}
