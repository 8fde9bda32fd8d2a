//! End-to-end document translation.
//!
//! A job filters a document's fragments, optionally groups them by detected
//! language, translates each group in batches and writes the results back.
//! Fragments that are filtered out or already in the target language are
//! never sent and keep their original text.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::batch::{BatchStatus, BatchTranslator};
use crate::completion::CompletionClient;
use crate::config::{Lang, TranslationSettings};
use crate::document::{DocumentAdapter, Workbook};
use crate::error::{Error, Result};
use crate::filter::{clean_text, should_translate};
use crate::language::{LanguageDetector, UNKNOWN_LANGUAGE};
use crate::pipeline::TranslationRequest;
use crate::util::translated_path;

/// Called with `(done_batches, total_batches)` after every batch
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// What a job did with each fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub fragments_total: usize,
    /// Filtered out or already in the target language
    pub fragments_skipped: usize,
    pub fragments_translated: usize,
    /// Sent but left untranslated by a degraded or failed batch
    pub fragments_degraded: usize,
    /// Source language and fragment count per group, in first-seen order
    pub groups: Vec<(String, usize)>,
    pub batches: Vec<BatchStatus>,
}

impl JobReport {
    /// True when batches ran and every one of them failed.
    pub fn all_batches_failed(&self) -> bool {
        !self.batches.is_empty() && self.batches.iter().all(BatchStatus::is_failed)
    }

    pub fn failed_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.is_failed()).count()
    }
}

/// Outcome of translating every workbook in a directory
#[derive(Debug, Default)]
pub struct DirectoryReport {
    /// `(input, output, report)` per translated workbook
    pub translated: Vec<(PathBuf, PathBuf, JobReport)>,
    /// `(input, error)` per workbook that could not be processed
    pub failed: Vec<(PathBuf, String)>,
}

/// One language group awaiting translation
struct Group {
    language: Lang,
    items: Vec<(usize, String)>,
}

pub struct DocumentJob {
    translator: BatchTranslator,
    detector: Option<LanguageDetector>,
    request: TranslationRequest,
    batch_size: usize,
}

impl DocumentJob {
    /// Job with language detection on and batches of 100.
    pub fn new(client: CompletionClient, request: TranslationRequest) -> Self {
        Self {
            translator: BatchTranslator::new(client.clone()),
            detector: Some(LanguageDetector::new(client)),
            request,
            batch_size: 100,
        }
    }

    /// Job configured from settings, loading any terminology file.
    pub fn from_settings(client: CompletionClient, settings: &TranslationSettings) -> Result<Self> {
        let request = TranslationRequest::from_settings(settings)?;
        Ok(Self::new(client, request)
            .with_batch_size(settings.batch_size)
            .with_language_detection(settings.detect_languages)
            .with_separator(settings.separator.clone()))
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_language_detection(mut self, enabled: bool) -> Self {
        if !enabled {
            self.detector = None;
        } else if self.detector.is_none() {
            self.detector = Some(LanguageDetector::new(self.translator_client()));
        }
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.translator = self.translator.with_separator(separator);
        self
    }

    fn translator_client(&self) -> CompletionClient {
        self.translator.client().clone()
    }

    pub const fn request(&self) -> &TranslationRequest {
        &self.request
    }

    /// Translate `doc` in place. Save it afterwards with [`DocumentAdapter::save`].
    pub async fn translate_document<D: DocumentAdapter + ?Sized>(
        &self,
        doc: &mut D,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<JobReport> {
        let fragments = doc.extract_fragments()?;
        let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();

        let (results, report) = self.translate_indexed(&texts, progress_callback.as_ref()).await;

        for (fragment, result) in fragments.iter().zip(results) {
            if let Some(translated) = result {
                doc.write_back(&fragment.locator, &translated)?;
            }
        }

        info!(
            "Translated {}/{} fragments ({} skipped, {} degraded)",
            report.fragments_translated, report.fragments_total, report.fragments_skipped, report.fragments_degraded
        );
        Ok(report)
    }

    /// Translate a bare list of strings.
    ///
    /// The result has one entry per input; anything not translated comes
    /// back unchanged.
    pub async fn translate_texts(&self, texts: &[String]) -> (Vec<String>, JobReport) {
        let (results, report) = self.translate_indexed(texts, None).await;
        let output = texts
            .iter()
            .zip(results)
            .map(|(original, result)| result.unwrap_or_else(|| original.clone()))
            .collect();
        (output, report)
    }

    /// Translate every `.xlsx` in `dir`, writing `<stem>-<target>.xlsx`
    /// into `out_dir` (or next to each input).
    ///
    /// Office lock files (`~$...`) are ignored. A workbook that fails is
    /// recorded and the rest still run.
    pub async fn translate_directory(&self, dir: &Path, out_dir: Option<&Path>) -> Result<DirectoryReport> {
        let mut inputs: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_workbook(path))
            .collect();
        inputs.sort();

        if let Some(out_dir) = out_dir {
            std::fs::create_dir_all(out_dir)?;
        }

        info!("Found {} workbooks in {}", inputs.len(), dir.display());
        let mut report = DirectoryReport::default();

        for input in inputs {
            let output = translated_path(&input, self.request.target_lang.as_str(), "xlsx", out_dir);
            match self.translate_workbook(&input, &output).await {
                Ok(job_report) => report.translated.push((input, output, job_report)),
                Err(e) => {
                    warn!("Failed to translate {}: {}", input.display(), e);
                    report.failed.push((input, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn translate_workbook(&self, input: &Path, output: &Path) -> Result<JobReport> {
        info!("Translating {}", input.display());
        let mut workbook = Workbook::open(input)?;
        let report = self.translate_document(&mut workbook, None).await?;
        if report.all_batches_failed() {
            return Err(Error::DocumentSave(format!(
                "every batch failed for {}; not writing output",
                input.display()
            )));
        }
        workbook.save(output)?;
        Ok(report)
    }

    /// Shared core: returns `Some(translation)` for every fragment whose
    /// batch produced output, `None` for fragments that were never sent or
    /// whose batch failed.
    async fn translate_indexed(
        &self,
        texts: &[String],
        progress_callback: Option<&ProgressCallback>,
    ) -> (Vec<Option<String>>, JobReport) {
        let mut report = JobReport {
            fragments_total: texts.len(),
            ..JobReport::default()
        };
        let mut results = vec![None; texts.len()];

        let mut candidates = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            if should_translate(text) {
                candidates.push((i, clean_text(text)));
            } else {
                report.fragments_skipped += 1;
            }
        }

        let groups = self.group_by_language(candidates, &mut report).await;
        report.groups = groups
            .iter()
            .map(|g| (g.language.to_string(), g.items.len()))
            .collect();

        let total_batches: usize = groups.iter().map(|g| g.items.len().div_ceil(self.batch_size)).sum();
        let mut done_batches = 0;

        for group in &groups {
            let request = TranslationRequest {
                source_lang: group.language.clone(),
                ..self.request.clone()
            };
            debug!("Translating {} fragments from {}", group.items.len(), group.language);

            for batch in group.items.chunks(self.batch_size) {
                let batch_texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
                let outcome = self.translator.translate_batch(&batch_texts, &request).await;

                let untranslated = outcome.untranslated(batch.len());
                report.fragments_degraded += untranslated;
                report.fragments_translated += batch.len() - untranslated;

                if !outcome.status.is_failed() {
                    for ((index, _), translation) in batch.iter().zip(outcome.translations) {
                        results[*index] = Some(translation);
                    }
                }
                report.batches.push(outcome.status);

                done_batches += 1;
                if let Some(callback) = progress_callback {
                    callback(done_batches, total_batches);
                }
            }
        }

        (results, report)
    }

    async fn group_by_language(&self, candidates: Vec<(usize, String)>, report: &mut JobReport) -> Vec<Group> {
        let source = &self.request.source_lang;
        let target = &self.request.target_lang;

        let Some(ref detector) = self.detector else {
            if candidates.is_empty() {
                return Vec::new();
            }
            return vec![Group {
                language: source.clone(),
                items: candidates,
            }];
        };

        let mut groups: Vec<Group> = Vec::new();
        for (index, text) in candidates {
            let language = match detector.detect(&text).await {
                Ok(detected) if detected == UNKNOWN_LANGUAGE => source.clone(),
                Ok(detected) => Lang::new(detected),
                Err(e) => {
                    warn!("Language detection failed, assuming {}: {}", source, e);
                    source.clone()
                }
            };

            if target.matches(language.as_str()) {
                debug!("Skipping fragment {} already in {}", index, target);
                report.fragments_skipped += 1;
                continue;
            }

            match groups.iter_mut().find(|g| g.language.matches(language.as_str())) {
                Some(group) => group.items.push((index, text)),
                None => groups.push(Group {
                    language,
                    items: vec![(index, text)],
                }),
            }
        }
        groups
    }
}

fn is_workbook(path: &Path) -> bool {
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    let is_lock_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"));
    is_xlsx && !is_lock_file && path.is_file()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_batches_failed() {
        let mut report = JobReport::default();
        assert!(!report.all_batches_failed());

        report.batches.push(BatchStatus::Failed { error: "x".into() });
        assert!(report.all_batches_failed());

        report.batches.push(BatchStatus::Translated);
        assert!(!report.all_batches_failed());
        assert_eq!(report.failed_batches(), 1);
    }

    #[test]
    fn test_is_workbook() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.xlsx", "B.XLSX", "~$a.xlsx", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let mut found: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| is_workbook(p))
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        found.sort();
        assert_eq!(found, vec!["B.XLSX", "a.xlsx"]);
    }
}
