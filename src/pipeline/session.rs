use crate::document::{
    is_zip_archive, looks_like_zip, DefaultExtractor, DocumentIngestor, DocumentKind, TextChunker,
    TextExtractor, UploadKind,
};
use crate::pipeline::orchestrator::{BatchOrchestrator, BatchReport};
use crate::store::{ChunkStore, CleanupReport, ScratchCleaner};
use crate::translation::{
    ensure_supported, TranslationBackend, TranslationDispatcher, TranslationResult,
};
use crate::utils::{has_extension, AppConfig, PipelineError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// One upload in, one report out.
///
/// Each call starts from an empty store and leaves an empty store behind,
/// so chunk keys from an earlier upload can never leak into the next one.
pub struct TranslationSession {
    store: ChunkStore,
    ingestor: DocumentIngestor,
    dispatcher: TranslationDispatcher,
    orchestrator: BatchOrchestrator,
    scratch_dir: PathBuf,
    cleaner: ScratchCleaner,
}

impl TranslationSession {
    pub fn new(config: &AppConfig, backend: Arc<dyn TranslationBackend>) -> Result<Self> {
        Self::with_extractor(config, backend, Arc::new(DefaultExtractor))
    }

    pub fn with_extractor(
        config: &AppConfig,
        backend: Arc<dyn TranslationBackend>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        let store = ChunkStore::open(&config.storage.db_path, &config.storage.processed_dir)?;
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.overlap)?;
        let ingestor = DocumentIngestor::new(
            chunker,
            extractor,
            store.clone(),
            config.workers.extraction_workers,
        );
        let dispatcher = TranslationDispatcher::new(backend, store.clone(), &config.backend);
        let orchestrator = BatchOrchestrator::new(
            dispatcher.clone(),
            store.clone(),
            config.workers.dispatch_workers,
        );

        let cleaner = ScratchCleaner::new(
            &config.storage.scratch_dir,
            config.storage.scratch_max_age_minutes,
        );
        if let Err(e) = cleaner.sweep() {
            warn!(error = %e, "Scratch cleanup failed");
        }

        Ok(Self {
            store,
            ingestor,
            dispatcher,
            orchestrator,
            scratch_dir: config.storage.scratch_dir.clone(),
            cleaner,
        })
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Empties the store and sweeps stale scratch entries.
    pub fn reset(&self) -> Result<CleanupReport> {
        self.store.clear_all()?;
        self.cleaner.sweep()
    }

    pub async fn translate_text(
        &self,
        source_language: &str,
        text: &str,
    ) -> Result<TranslationResult> {
        self.dispatcher.translate_text(source_language, text).await
    }

    /// Validates, resets, ingests, translates and resets again. The final
    /// reset runs whether or not the upload succeeded.
    pub async fn translate_upload(
        &self,
        filename: &str,
        bytes: &[u8],
        kind: UploadKind,
        source_language: &str,
    ) -> Result<BatchReport> {
        ensure_supported(source_language)?;
        kind.validate_filename(filename)?;
        let document_kind = kind.document_kind().ok_or_else(|| {
            PipelineError::InvalidInput(format!("{:?} uploads are not documents", kind))
        })?;
        if (has_extension(filename, "zip") || looks_like_zip(bytes)) && !is_zip_archive(bytes) {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not a readable archive",
                filename
            )));
        }

        self.store.clear_all()?;
        let intake_dir = self.scratch_dir.join(format!("intake_{}", Uuid::new_v4()));

        let outcome = self
            .process_upload(&intake_dir, filename, bytes, document_kind, source_language)
            .await;

        if let Err(e) = self.store.clear_all() {
            warn!(error = %e, "Failed to reset chunk store after upload");
        }
        if let Err(e) = std::fs::remove_dir_all(&intake_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    dir = %intake_dir.display(),
                    error = %e,
                    "Failed to remove intake directory"
                );
            }
        }

        outcome
    }

    async fn process_upload(
        &self,
        intake_dir: &Path,
        filename: &str,
        bytes: &[u8],
        document_kind: DocumentKind,
        source_language: &str,
    ) -> Result<BatchReport> {
        tokio::fs::create_dir_all(intake_dir).await?;
        let intake_path = intake_dir.join(filename);
        tokio::fs::write(&intake_path, bytes).await?;

        let ingest = self.ingestor.ingest_path(&intake_path, document_kind).await?;
        info!(
            filename = %filename,
            documents = ingest.collections.len(),
            skipped = ingest.skipped.len(),
            "Upload ingested"
        );

        let mut report = self.orchestrator.run(source_language).await?;
        report.skipped_files = ingest.skipped;
        Ok(report)
    }
}
