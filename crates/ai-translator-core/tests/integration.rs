//! Integration tests for ai-translator-core
//!
//! These tests drive the public API end to end against a scripted
//! completion backend (no network):
//! - Batch translation through the job runner, including degraded batches
//! - Language detection and per-language grouping
//! - The translate → reflect → improve pipeline
//! - Document adapters (text and workbook) with write-back
//! - Rate limiting shared by detection and translation calls

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_translator_core::{
    ClientSettings, CompletionClient, CompletionProvider, CompletionRequest, DocumentAdapter, DocumentJob, Endpoint,
    Error, Locator, ProviderConfig, ProviderInfo, RateLimiter, Result, Stage, Terminology, TextDocument,
    TranslationPipeline, TranslationRequest, Workbook,
};
use async_trait::async_trait;

// =============================================================================
// Scripted Provider for Testing
// =============================================================================

type Script = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;

/// A completion backend that answers from a script and records every request.
struct ScriptedProvider {
    script: Script,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(script: impl Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with the same text
    fn fixed(answer: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(answer.to_string()))
    }

    fn failing() -> Arc<Self> {
        Self::new(|_| Err(Error::ProviderRequest("connection refused".into())))
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn batch_requests(&self) -> Vec<CompletionRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !is_detection(r))
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "scripted",
            requires_api_key: false,
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(request)
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

fn client(provider: Arc<ScriptedProvider>) -> CompletionClient {
    let settings = ClientSettings {
        model: "test-model".into(),
        rpm: NonZeroU32::new(600_000).unwrap(),
        ..ClientSettings::default()
    };
    CompletionClient::new(provider, settings).with_rate_limiter(Arc::new(RateLimiter::new()))
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn is_detection(request: &CompletionRequest) -> bool {
    request.system_message.contains("language detection expert")
}

/// The separator-joined payload at the end of a batch prompt
fn batch_payload(request: &CompletionRequest) -> &str {
    request.prompt.rsplit_once("\n\n").map_or("", |(_, payload)| payload)
}

/// Detects by keyword and "translates" by tagging every segment.
fn multilingual_script(request: &CompletionRequest) -> Result<String> {
    if is_detection(request) {
        let language = if request.prompt.contains("Hola") {
            "Spanish"
        } else if request.prompt.contains("Bonjour") {
            "The text is French."
        } else {
            "english"
        };
        return Ok(language.to_string());
    }
    Ok(batch_payload(request)
        .split("|||")
        .map(|segment| format!("[es] {segment}"))
        .collect::<Vec<_>>()
        .join("|||"))
}

// =============================================================================
// Batch Translation Tests
// =============================================================================

#[tokio::test]
async fn test_numbers_pass_through_unsent() {
    let provider = ScriptedProvider::fixed("Hola|||Mundo");
    let job = DocumentJob::new(client(Arc::clone(&provider)), TranslationRequest::new("English", "Spanish"))
        .with_language_detection(false);

    let (output, report) = job.translate_texts(&texts(&["Hello", "World", "123"])).await;

    assert_eq!(output, texts(&["Hola", "Mundo", "123"]));
    assert_eq!(report.fragments_skipped, 1);
    assert_eq!(report.fragments_translated, 2);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1, "one batched call for both fragments");
    assert_eq!(batch_payload(&requests[0]), "Hello|||World");
}

#[tokio::test]
async fn test_short_batch_response_keeps_originals() {
    let provider = ScriptedProvider::fixed("Uno");
    let job = DocumentJob::new(client(provider), TranslationRequest::new("English", "Spanish"))
        .with_language_detection(false);

    let (output, report) = job.translate_texts(&texts(&["One", "Two", "Three"])).await;

    assert_eq!(output, texts(&["Uno", "Two", "Three"]));
    assert_eq!(report.fragments_translated, 1);
    assert_eq!(report.fragments_degraded, 2);
}

#[tokio::test]
async fn test_long_batch_response_is_truncated() {
    let provider = ScriptedProvider::fixed("Uno|||Dos|||Tres|||Cuatro");
    let job = DocumentJob::new(client(provider), TranslationRequest::new("English", "Spanish"))
        .with_language_detection(false);

    let (output, report) = job.translate_texts(&texts(&["One", "Two"])).await;

    assert_eq!(output, texts(&["Uno", "Dos"]));
    assert_eq!(report.fragments_degraded, 0);
}

#[tokio::test]
async fn test_failed_batches_return_originals() {
    let provider = ScriptedProvider::failing();
    let job = DocumentJob::new(client(provider), TranslationRequest::new("English", "Spanish"))
        .with_language_detection(false)
        .with_batch_size(1);

    let input = texts(&["Good morning", "Good night"]);
    let (output, report) = job.translate_texts(&input).await;

    assert_eq!(output, input);
    assert_eq!(report.batches.len(), 2);
    assert!(report.all_batches_failed());
    assert_eq!(report.fragments_degraded, 2);
}

#[tokio::test]
async fn test_batches_respect_batch_size() {
    let provider = ScriptedProvider::new(|request| Ok(batch_payload(request).to_uppercase()));
    let job = DocumentJob::new(client(Arc::clone(&provider)), TranslationRequest::new("English", "Spanish"))
        .with_language_detection(false)
        .with_batch_size(2);

    let (output, report) = job.translate_texts(&texts(&["aa", "bb", "cc", "dd", "ee"])).await;

    assert_eq!(output, texts(&["AA", "BB", "CC", "DD", "EE"]));
    assert_eq!(report.batches.len(), 3);
    assert_eq!(provider.requests().len(), 3);
}

// =============================================================================
// Language Grouping Tests
// =============================================================================

#[tokio::test]
async fn test_target_language_fragments_are_never_sent() {
    let provider = ScriptedProvider::new(multilingual_script);
    let job = DocumentJob::new(client(Arc::clone(&provider)), TranslationRequest::new("English", "Spanish"));

    let input = texts(&[
        "Good morning everyone",
        "Hola a todos los presentes",
        "Bonjour tout le monde",
        "See you tomorrow morning",
    ]);
    let (output, report) = job.translate_texts(&input).await;

    assert_eq!(output[1], input[1], "Spanish fragment stays as is");
    assert_eq!(output[0], "[es] Good morning everyone");
    assert_eq!(output[2], "[es] Bonjour tout le monde");
    assert_eq!(output[3], "[es] See you tomorrow morning");

    assert_eq!(
        report.groups,
        vec![("English".to_string(), 2), ("French".to_string(), 1)]
    );
    assert_eq!(report.fragments_skipped, 1);

    let batches = provider.batch_requests();
    assert_eq!(batches.len(), 2, "one batch per language group");
    assert!(batches.iter().all(|r| !r.prompt.contains("Hola")));
    assert_eq!(batch_payload(&batches[0]), "Good morning everyone|||See you tomorrow morning");
    assert!(batches[1].prompt.contains("from French to Spanish"));
}

#[tokio::test]
async fn test_short_fragments_use_source_language_without_detection() {
    let provider = ScriptedProvider::new(multilingual_script);
    let job = DocumentJob::new(client(Arc::clone(&provider)), TranslationRequest::new("German", "Spanish"));

    let (output, report) = job.translate_texts(&texts(&["Hi there"])).await;

    assert_eq!(output, texts(&["[es] Hi there"]));
    assert_eq!(report.groups, vec![("German".to_string(), 1)]);
    assert!(provider.requests().iter().all(|r| !is_detection(r)));
}

#[tokio::test(start_paused = true)]
async fn test_detection_and_batches_share_one_rate_budget() {
    let starts = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&starts);
    let provider = ScriptedProvider::new(move |request| {
        recorded.lock().unwrap().push(tokio::time::Instant::now());
        multilingual_script(request)
    });
    let settings = ClientSettings {
        rpm: NonZeroU32::new(60).unwrap(),
        ..ClientSettings::default()
    };
    let client = CompletionClient::new(Arc::clone(&provider), settings)
        .with_rate_limiter(Arc::new(RateLimiter::new()));
    let job = DocumentJob::new(client, TranslationRequest::new("English", "Spanish"));

    job.translate_texts(&texts(&["Good morning everyone", "See you tomorrow morning"]))
        .await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert!(is_detection(&requests[0]) && is_detection(&requests[1]));
    assert!(!is_detection(&requests[2]));

    let starts = starts.lock().unwrap();
    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_secs(1), "calls started {gap:?} apart");
        assert!(gap < Duration::from_millis(1100), "calls started {gap:?} apart");
    }
}

#[tokio::test]
async fn test_detection_uses_low_temperature_without_json_mode() {
    let provider = ScriptedProvider::new(multilingual_script);
    let job = DocumentJob::new(client(Arc::clone(&provider)), TranslationRequest::new("English", "Spanish"));

    job.translate_texts(&texts(&["A sentence long enough to detect"])).await;

    let detection = provider
        .requests()
        .into_iter()
        .find(is_detection)
        .expect("detection call");
    assert!((detection.temperature - 0.1).abs() < f32::EPSILON);
    assert!(!detection.json_mode);
}

// =============================================================================
// Translation Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_full_pipeline_runs_three_stages() {
    let provider = ScriptedProvider::new(|request| {
        if request.prompt.starts_with("Translate the following text") {
            Ok("Hola mundo".into())
        } else if request.prompt.contains("<EXPERT_SUGGESTIONS>") {
            Ok("¡Hola, mundo!".into())
        } else {
            Ok("Add punctuation.".into())
        }
    });
    let pipeline = TranslationPipeline::with_cl100k(client(Arc::clone(&provider))).unwrap();
    let req = TranslationRequest::new("English", "Spanish");

    let result = pipeline.run(&req, "Hello world", true).await.unwrap();

    assert_eq!(result.initial_translation, "Hola mundo");
    assert_eq!(result.reflection.as_deref(), Some("Add punctuation."));
    assert_eq!(result.final_translation.as_deref(), Some("¡Hola, mundo!"));
    assert_eq!(result.best(), "¡Hola, mundo!");

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].system_message.contains("expert linguist"));
    assert!(requests[2].prompt.contains("<TRANSLATION>\nHola mundo\n</TRANSLATION>"));
}

#[tokio::test]
async fn test_partial_pipeline_stops_after_draft() {
    let provider = ScriptedProvider::fixed("Hola mundo");
    let pipeline = TranslationPipeline::with_cl100k(client(Arc::clone(&provider))).unwrap();
    let req = TranslationRequest::new("English", "Spanish");

    let result = pipeline.run(&req, "Hello world", false).await.unwrap();

    assert_eq!(result.best(), "Hola mundo");
    assert!(result.reflection.is_none());
    assert!(result.final_translation.is_none());
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn test_pipeline_failure_aborts_with_stage() {
    let pipeline = TranslationPipeline::with_cl100k(client(ScriptedProvider::failing())).unwrap();
    let req = TranslationRequest::new("English", "Spanish");

    let err = pipeline.run(&req, "Hello world", true).await.unwrap_err();

    assert!(err.is_provider());
    assert!(matches!(
        err,
        Error::Stage {
            stage: Stage::InitialDraft,
            ..
        }
    ));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_reviewer_provider_runs_reflection_and_improvement() {
    let drafter = ScriptedProvider::fixed("Hola mundo");
    let reviewer = ScriptedProvider::new(|request| {
        if request.prompt.contains("<EXPERT_SUGGESTIONS>") {
            Ok("¡Hola, mundo!".into())
        } else {
            Ok("Add punctuation.".into())
        }
    });
    let pipeline = TranslationPipeline::with_cl100k(client(Arc::clone(&drafter)))
        .unwrap()
        .with_reviewer(client(Arc::clone(&reviewer)));
    let req = TranslationRequest::new("English", "Spanish");

    let result = pipeline.run(&req, "Hello world", true).await.unwrap();

    assert_eq!(result.initial_translation, "Hola mundo");
    assert_eq!(result.best(), "¡Hola, mundo!");

    let drafts = drafter.requests();
    assert_eq!(drafts.len(), 1);
    assert!(drafts[0].prompt.starts_with("Translate the following text"));

    let reviews = reviewer.requests();
    assert_eq!(reviews.len(), 2);
    assert!(reviews[0].system_message.contains("expert linguist"));
    assert!(reviews[1].prompt.contains("<EXPERT_SUGGESTIONS>\nAdd punctuation.\n</EXPERT_SUGGESTIONS>"));
}

#[tokio::test]
async fn test_terminology_reaches_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terms.txt");
    std::fs::write(&path, "API=API\nthis line is ignored\n\nuser=usuario\n").unwrap();
    let terminology = Terminology::from_file(&path).unwrap();
    assert_eq!(terminology.len(), 2);

    let provider = ScriptedProvider::fixed("El usuario llama a la API");
    let pipeline = TranslationPipeline::with_cl100k(client(Arc::clone(&provider))).unwrap();
    let req = TranslationRequest::new("English", "Spanish").with_terminology(terminology);

    pipeline.initial_translation(&req, "The user calls the API").await.unwrap();

    let prompt = &provider.requests()[0].prompt;
    assert!(prompt.contains("- API → API\n- user → usuario"));
}

// =============================================================================
// Document Tests
// =============================================================================

#[tokio::test]
async fn test_text_document_job_with_progress() {
    let provider = ScriptedProvider::new(|request| Ok(format!("<{}>", batch_payload(request))));
    let job = DocumentJob::new(client(provider), TranslationRequest::new("English", "Spanish"))
        .with_language_detection(false)
        .with_batch_size(1);

    let mut doc = TextDocument::parse("First  paragraph\n\n42\n\nSecond\nparagraph");
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let progress = Box::new(move |done: usize, total: usize| {
        assert!(done <= total);
        counter.store(done, Ordering::SeqCst);
    });

    let report = job.translate_document(&mut doc, Some(progress)).await.unwrap();

    assert_eq!(report.fragments_total, 3);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(doc.render(), "<First paragraph>\n\n42\n\n<Second paragraph>");
}

fn sample_workbook(path: &std::path::Path) {
    let mut book = umya_spreadsheet::new_file();
    let ws = book.get_sheet_mut(&0).unwrap();
    ws.get_cell_mut((1, 1)).set_value("Product name");
    ws.get_cell_mut((2, 1)).set_value("Price");
    ws.get_cell_mut((2, 2)).set_value_number(10);
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

#[tokio::test]
async fn test_translate_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    sample_workbook(&dir.path().join("catalog.xlsx"));
    std::fs::write(dir.path().join("~$catalog.xlsx"), b"lock").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not a workbook").unwrap();

    let provider = ScriptedProvider::fixed("Nombre del producto|||Precio");
    let job = DocumentJob::new(client(provider), TranslationRequest::new("English", "Spanish"))
        .with_language_detection(false);

    let report = job.translate_directory(dir.path(), Some(&out)).await.unwrap();

    assert!(report.failed.is_empty(), "failures: {:?}", report.failed);
    assert_eq!(report.translated.len(), 1);
    let (_, output, _) = &report.translated[0];
    assert_eq!(output, &out.join("catalog-Spanish.xlsx"));

    let translated = Workbook::open(output).unwrap();
    assert_eq!(translated.cell_value("Sheet1", 1, 1).as_deref(), Some("Nombre del producto"));
    assert_eq!(translated.cell_value("Sheet1", 1, 2).as_deref(), Some("Precio"));
    assert_eq!(translated.cell_value("Sheet1", 2, 2).as_deref(), Some("10"));
}

#[tokio::test]
async fn test_translate_directory_records_unreadable_workbook() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.xlsx"), b"not a zip").unwrap();

    let job = DocumentJob::new(client(ScriptedProvider::fixed("x")), TranslationRequest::new("English", "Spanish"));
    let report = job.translate_directory(dir.path(), None).await.unwrap();

    assert!(report.translated.is_empty());
    assert_eq!(report.failed.len(), 1);
}

#[test]
fn test_workbook_rejects_missing_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    sample_workbook(&path);

    let mut workbook = Workbook::open(&path).unwrap();
    let err = workbook
        .write_back(
            &Locator::Shape {
                sheet: "Sheet1".into(),
                index: 0,
            },
            "x",
        )
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedLocator(_)));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_custom_endpoint_without_base_url_is_configuration_error() {
    let config = ProviderConfig::new(Endpoint::Custom, "local-model");
    let err = CompletionClient::from_config(&config).err().expect("should fail");
    assert!(err.is_configuration());
}

#[test]
fn test_custom_endpoint_with_base_url_builds_client() {
    let config = ProviderConfig {
        base_url: Some("http://localhost:8080/v1".into()),
        ..ProviderConfig::new(Endpoint::Custom, "local-model")
    };
    let client = CompletionClient::from_config(&config).unwrap();
    assert_eq!(client.provider_name(), "CUSTOM");
    assert_eq!(client.settings().model, "local-model");
}
