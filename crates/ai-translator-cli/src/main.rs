//! AI Translator CLI - translate text, Excel workbooks and PDFs with an LLM.

use std::io::Read;
use std::path::{Path, PathBuf};

use ai_translator_core::util::translated_path;
use ai_translator_core::{
    AppConfig, CompletionClient, DocumentAdapter, DocumentJob, Endpoint, JobReport, Lang, PdfDocument,
    ProgressCallback, ProviderConfig, TranslationPipeline, TranslationRequest, Workbook,
};
use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ai-translate")]
#[command(author, version, about = "Translate text, Excel workbooks and PDFs with an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    provider: ProviderArgs,

    #[command(flatten)]
    review: ReviewArgs,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate plain text, optionally with reflection and refinement
    Text(TextArgs),
    /// Translate the cells and text boxes of one workbook or a directory of workbooks
    Excel(ExcelArgs),
    /// Translate a PDF's text into a new PDF and a .txt file
    Pdf(PdfArgs),
}

/// Completion provider overrides
#[derive(Args, Debug)]
struct ProviderArgs {
    /// Provider: OpenAI, Groq, Gemini, TogetherAI, Ollama or CUSTOM
    #[arg(long, global = true, env = "AI_TRANSLATOR_ENDPOINT")]
    endpoint: Option<Endpoint>,

    /// Model name
    #[arg(long, global = true, env = "AI_TRANSLATOR_MODEL")]
    model: Option<String>,

    /// API key (default: <ENDPOINT>_API_KEY from the environment)
    #[arg(long, global = true, env = "AI_TRANSLATOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL, required for CUSTOM
    #[arg(long, global = true, env = "AI_TRANSLATOR_BASE_URL")]
    base_url: Option<String>,

    /// Sampling temperature in [0, 1]
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Requests per minute
    #[arg(long, global = true)]
    rpm: Option<u32>,

    /// Ask the provider for JSON-formatted responses
    #[arg(long, global = true)]
    json_mode: bool,
}

/// Second provider for the reflection and improvement passes of `text --full`
#[derive(Args, Debug)]
struct ReviewArgs {
    /// Reviewer provider (default: same as --endpoint)
    #[arg(long, global = true, env = "AI_TRANSLATOR_REVIEW_ENDPOINT")]
    review_endpoint: Option<Endpoint>,

    /// Reviewer model
    #[arg(long, global = true, env = "AI_TRANSLATOR_REVIEW_MODEL")]
    review_model: Option<String>,

    /// Reviewer API key (default: <REVIEW_ENDPOINT>_API_KEY from the environment)
    #[arg(long, global = true, env = "AI_TRANSLATOR_REVIEW_API_KEY", hide_env_values = true)]
    review_api_key: Option<String>,

    /// Reviewer base URL, required when the reviewer is CUSTOM
    #[arg(long, global = true, env = "AI_TRANSLATOR_REVIEW_BASE_URL")]
    review_base_url: Option<String>,
}

/// Settings shared by every subcommand
#[derive(Args, Debug)]
struct JobArgs {
    /// Source language (e.g. English)
    #[arg(short = 's', long)]
    source: String,

    /// Target language (e.g. Spanish)
    #[arg(short = 't', long)]
    target: String,

    /// Adapt the translation to the language as spoken in this country
    #[arg(long)]
    country: Option<String>,

    /// Style key (General, Technical, Legal, ...)
    #[arg(long)]
    style: Option<String>,

    /// Extra style instructions
    #[arg(long)]
    custom_style: Option<String>,

    /// Glossary file with one source=target pair per line
    #[arg(long)]
    terminology: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TextArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Input file (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also print the reflection and the improved translation
    #[arg(long)]
    full: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "dir"])))]
struct ExcelArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Workbook to translate
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Translate every .xlsx in this directory
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Output file (with --file) or directory (with --dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fragments per completion call
    #[arg(long)]
    batch_size: Option<usize>,

    /// Treat every cell as the source language
    #[arg(long)]
    no_detect: bool,
}

#[derive(Args, Debug)]
struct PdfArgs {
    #[command(flatten)]
    job: JobArgs,

    /// PDF to translate
    #[arg(short, long)]
    file: PathBuf,

    /// Output PDF (a .txt is written next to it; default: <stem>-<target>.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fragments per completion call
    #[arg(long)]
    batch_size: Option<usize>,

    /// Treat every paragraph as the source language
    #[arg(long)]
    no_detect: bool,
}

impl ProviderArgs {
    fn apply(&self, config: &mut AppConfig) {
        let provider = &mut config.provider;
        if let Some(endpoint) = self.endpoint {
            provider.endpoint = endpoint;
            if self.model.is_none() {
                provider.model = None;
            }
        }
        if self.model.is_some() {
            provider.model.clone_from(&self.model);
        }
        if self.api_key.is_some() {
            provider.api_key.clone_from(&self.api_key);
        }
        if self.base_url.is_some() {
            provider.base_url.clone_from(&self.base_url);
        }
        if let Some(temperature) = self.temperature {
            provider.temperature = temperature;
        }
        if let Some(rpm) = self.rpm {
            provider.rpm = rpm;
        }
        if self.json_mode {
            provider.json_mode = true;
        }
    }
}

impl ReviewArgs {
    const fn requested(&self) -> bool {
        self.review_endpoint.is_some()
            || self.review_model.is_some()
            || self.review_api_key.is_some()
            || self.review_base_url.is_some()
    }

    /// Layer the flags over the `[reviewer]` config section, or over a copy
    /// of the main provider when the config has none.
    fn apply(&self, config: &mut AppConfig) {
        if !self.requested() {
            return;
        }
        let provider = &config.provider;
        let reviewer = config.reviewer.get_or_insert_with(|| provider.clone());

        if let Some(endpoint) = self.review_endpoint.filter(|e| *e != reviewer.endpoint) {
            *reviewer = ProviderConfig {
                endpoint,
                model: None,
                api_key: None,
                base_url: None,
                ..reviewer.clone()
            };
        }
        if self.review_model.is_some() {
            reviewer.model.clone_from(&self.review_model);
        }
        if self.review_api_key.is_some() {
            reviewer.api_key.clone_from(&self.review_api_key);
        }
        if self.review_base_url.is_some() {
            reviewer.base_url.clone_from(&self.review_base_url);
        }
    }
}

impl JobArgs {
    fn apply(&self, config: &mut AppConfig) {
        let settings = &mut config.translation;
        settings.source_lang = Lang::new(&self.source);
        settings.target_lang = Lang::new(&self.target);
        if self.country.is_some() {
            settings.country.clone_from(&self.country);
        }
        if let Some(ref style) = self.style {
            settings.style.clone_from(style);
        }
        if self.custom_style.is_some() {
            settings.custom_style_instructions.clone_from(&self.custom_style);
        }
        if self.terminology.is_some() {
            settings.terminology_file.clone_from(&self.terminology);
        }
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn progress_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Box::new(move |done, total| {
        pb.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        pb.set_position(u64::try_from(done).unwrap_or(u64::MAX));
    })
}

fn check_report(report: &JobReport) -> Result<()> {
    if report.all_batches_failed() {
        bail!(
            "Every batch failed ({} batches); see the log for provider errors",
            report.batches.len()
        );
    }
    if report.fragments_degraded > 0 {
        warn!(
            "{} of {} fragments were left untranslated",
            report.fragments_degraded,
            report.fragments_total
        );
    }
    Ok(())
}

async fn run_text(args: TextArgs, config: &AppConfig) -> Result<()> {
    let text = match args.input {
        Some(ref path) => {
            std::fs::read_to_string(path).context(format!("Failed to read input: {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("Nothing to translate: input is empty");
    }

    let client = CompletionClient::from_config(&config.provider).context("Failed to configure provider")?;
    let mut pipeline = TranslationPipeline::with_cl100k(client).context("Failed to load tokenizer")?;
    if let Some(reviewer) = config.reviewer.as_ref().filter(|_| args.full) {
        let reviewer = CompletionClient::from_config(reviewer).context("Failed to configure reviewer provider")?;
        info!("Reflection and improvement run on {}", reviewer.provider_name());
        pipeline = pipeline.with_reviewer(reviewer);
    }
    let request = TranslationRequest::from_settings(&config.translation)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(if args.full {
        "Translating, reflecting and improving"
    } else {
        "Translating"
    });
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let result = pipeline.run(&request, &text, args.full).await;
    spinner.finish_and_clear();
    let result = result.context("Translation failed")?;

    if result.best().trim().is_empty() {
        bail!("Translation came back empty");
    }

    let rendered = match (args.full, &result.reflection, &result.final_translation) {
        (true, Some(reflection), Some(final_translation)) => format!(
            "Initial translation:\n{}\n\nReflection:\n{reflection}\n\nFinal translation:\n{final_translation}\n",
            result.initial_translation
        ),
        _ => format!("{}\n", result.best()),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered).context(format!("Failed to write output: {}", path.display()))?;
            info!("Translation written to {}", path.display());
        }
        // CLI output is intentional
        #[allow(clippy::print_stdout)]
        None => print!("{rendered}"),
    }
    Ok(())
}

async fn run_document<D: DocumentAdapter>(
    job: &DocumentJob,
    doc: &mut D,
    output: &Path,
) -> Result<Vec<PathBuf>> {
    let pb = progress_bar();
    let report = job
        .translate_document(doc, Some(progress_callback(&pb)))
        .await
        .context("Failed to translate document")?;
    pb.finish_and_clear();

    info!(
        "{} fragments: {} translated, {} skipped, {} batches",
        report.fragments_total,
        report.fragments_translated,
        report.fragments_skipped,
        report.batches.len()
    );
    check_report(&report)?;

    doc.save(output)
        .context(format!("Failed to save output: {}", output.display()))
}

async fn run_excel(args: ExcelArgs, config: &AppConfig) -> Result<()> {
    let client = CompletionClient::from_config(&config.provider).context("Failed to configure provider")?;
    let job = DocumentJob::from_settings(client, &config.translation)?;
    let target = config.translation.target_lang.as_str();

    if let Some(ref dir) = args.dir {
        let report = job
            .translate_directory(dir, args.output.as_deref())
            .await
            .context(format!("Failed to read directory: {}", dir.display()))?;

        // CLI output is intentional
        #[allow(clippy::print_stdout)]
        {
            for (input, output, _) in &report.translated {
                println!("{} -> {}", input.display(), output.display());
            }
            for (input, error) in &report.failed {
                println!("FAILED {}: {error}", input.display());
            }
        }

        if report.translated.is_empty() && report.failed.is_empty() {
            bail!("No .xlsx files found in {}", dir.display());
        }
        if !report.failed.is_empty() {
            bail!("{} of {} workbooks failed", report.failed.len(), report.failed.len() + report.translated.len());
        }
        return Ok(());
    }

    let Some(ref file) = args.file else {
        bail!("Pass --file or --dir");
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| translated_path(file, target, "xlsx", None));

    let mut workbook = Workbook::open(file).context(format!("Failed to open workbook: {}", file.display()))?;
    let written = run_document(&job, &mut workbook, &output).await?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        for path in written {
            println!("Translated workbook saved to: {}", path.display());
        }
    }
    Ok(())
}

async fn run_pdf(args: PdfArgs, config: &AppConfig) -> Result<()> {
    let client = CompletionClient::from_config(&config.provider).context("Failed to configure provider")?;
    let job = DocumentJob::from_settings(client, &config.translation)?;
    let target = config.translation.target_lang.as_str();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| translated_path(&args.file, target, "pdf", None));

    info!("Loading PDF: {}", args.file.display());
    let mut doc = PdfDocument::open(&args.file).context(format!("Failed to load PDF: {}", args.file.display()))?;
    if doc.paragraphs().is_empty() {
        bail!("No text found in {}", args.file.display());
    }

    let written = run_document(&job, &mut doc, &output).await?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        for path in written {
            println!("Translation saved to: {}", path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    cli.provider.apply(&mut config);
    cli.review.apply(&mut config);

    match cli.command {
        Command::Text(args) => {
            args.job.apply(&mut config);
            run_text(args, &config).await
        }
        Command::Excel(args) => {
            args.job.apply(&mut config);
            if let Some(batch_size) = args.batch_size {
                config.translation.batch_size = batch_size;
            }
            if args.no_detect {
                config.translation.detect_languages = false;
            }
            run_excel(args, &config).await
        }
        Command::Pdf(args) => {
            args.job.apply(&mut config);
            if let Some(batch_size) = args.batch_size {
                config.translation.batch_size = batch_size;
            }
            if args.no_detect {
                config.translation.detect_languages = false;
            }
            run_pdf(args, &config).await
        }
    }
}
