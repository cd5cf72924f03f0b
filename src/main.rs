use clap::{Parser, Subcommand};
use pipeline_translator::translation::SUPPORTED_LANGUAGES;
use pipeline_translator::{
    AppConfig, AudioTranslator, PipelineClient, TranslationSession, UploadKind,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "pipeline-translator",
    version,
    about = "Translate documents, text, audio and video through a remote ASR + MT pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file
    #[arg(long, global = true, value_name = "PATH", default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a .pdf or a .zip of PDFs
    Documents {
        file: PathBuf,
        #[arg(long, value_name = "LANG")]
        lang: String,
    },
    /// Translate a .txt or a .zip of text files
    Text {
        file: PathBuf,
        #[arg(long, value_name = "LANG")]
        lang: String,
    },
    /// Translate a literal piece of text
    Translate {
        text: String,
        #[arg(long, value_name = "LANG")]
        lang: String,
    },
    /// Transcribe and translate a .flac file
    Audio {
        file: PathBuf,
        #[arg(long, value_name = "LANG")]
        lang: String,
    },
    /// Transcribe and translate every .flac clip in a .zip archive
    AudioZip {
        file: PathBuf,
        #[arg(long, value_name = "LANG")]
        lang: String,
    },
    /// Transcribe and translate the audio track of an .mp4 file
    Video {
        file: PathBuf,
        #[arg(long, value_name = "LANG")]
        lang: String,
    },
    /// Delete stored chunks, translated output and stale scratch files
    Reset,
    /// List supported source languages
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Load first so the file's logging section applies, but report the
    // outcome only once the subscriber exists.
    let loaded = AppConfig::load_optional(&cli.config);
    let config = loaded
        .as_ref()
        .ok()
        .and_then(|config| config.clone())
        .unwrap_or_default()
        .with_env_overrides();
    init_tracing(&config)?;
    match loaded {
        Ok(Some(_)) => tracing::debug!(path = %cli.config, "Configuration loaded"),
        Ok(None) => tracing::info!(path = %cli.config, "No configuration file, using defaults"),
        Err(e) => {
            tracing::error!(path = %cli.config, error = %e, "Configuration file is invalid");
            return Err(e.into());
        }
    }
    config.validate()?;

    match cli.command {
        Command::Documents { file, lang } => {
            run_upload(&config, &file, UploadKind::Document, &lang).await
        }
        Command::Text { file, lang } => run_upload(&config, &file, UploadKind::Text, &lang).await,
        Command::Translate { text, lang } => {
            let session = TranslationSession::new(&config, backend(&config)?)?;
            print_json(&session.translate_text(&lang, &text).await?)
        }
        Command::Audio { file, lang } => run_media(&config, &file, UploadKind::Audio, &lang).await,
        Command::AudioZip { file, lang } => {
            let (filename, bytes) = read_upload(&file).await?;
            let translator = AudioTranslator::new(&config, backend(&config)?)?;
            print_json(&translator.translate_audio_archive(&filename, bytes, &lang).await?)
        }
        Command::Video { file, lang } => run_media(&config, &file, UploadKind::Video, &lang).await,
        Command::Reset => {
            let session = TranslationSession::new(&config, backend(&config)?)?;
            let report = session.reset()?;
            tracing::info!(
                scratch_entries_deleted = report.entries_deleted,
                "Session state cleared"
            );
            Ok(())
        }
        Command::Languages => print_json(&SUPPORTED_LANGUAGES),
    }
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("pipeline_translator={}", config.logging.level))
    })?;
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn backend(config: &AppConfig) -> anyhow::Result<Arc<PipelineClient>> {
    Ok(Arc::new(PipelineClient::new(config.backend.clone())?))
}

async fn read_upload(file: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} is not a file", file.display()))?;
    let bytes = tokio::fs::read(file).await?;
    Ok((filename, bytes))
}

async fn run_upload(
    config: &AppConfig,
    file: &Path,
    kind: UploadKind,
    lang: &str,
) -> anyhow::Result<()> {
    let (filename, bytes) = read_upload(file).await?;
    let session = TranslationSession::new(config, backend(config)?)?;
    let report = session.translate_upload(&filename, &bytes, kind, lang).await?;

    tracing::info!(
        documents = report.documents.len(),
        chunks = report.chunk_count(),
        failed_chunks = report.failed_chunk_count(),
        "Upload translated"
    );
    print_json(&report)
}

async fn run_media(
    config: &AppConfig,
    file: &Path,
    kind: UploadKind,
    lang: &str,
) -> anyhow::Result<()> {
    let (filename, bytes) = read_upload(file).await?;
    let translator = AudioTranslator::new(config, backend(config)?)?;
    let transcription = translator
        .translate_upload(&filename, bytes, kind, lang)
        .await?;
    print_json(&transcription)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
