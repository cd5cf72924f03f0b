use crate::document::archive::read_members;
use crate::document::chunker::TextChunker;
use crate::document::collection::{ChunkCollection, DocumentKind};
use crate::document::extractor::TextExtractor;
use crate::document::upload::looks_like_zip;
use crate::store::ChunkStore;
use crate::utils::{base_filename, has_extension, PipelineError, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub collections: Vec<ChunkCollection>,
    pub skipped: Vec<SkippedFile>,
}

/// Turns uploads into stored chunk collections.
///
/// Archives are detected by content. Their members are extracted on a pool
/// of `workers` blocking tasks; a member that cannot be read or extracted is
/// reported in `skipped` and the rest carry on.
#[derive(Clone)]
pub struct DocumentIngestor {
    chunker: TextChunker,
    extractor: Arc<dyn TextExtractor>,
    store: ChunkStore,
    workers: usize,
}

impl DocumentIngestor {
    pub fn new(
        chunker: TextChunker,
        extractor: Arc<dyn TextExtractor>,
        store: ChunkStore,
        workers: usize,
    ) -> Self {
        Self {
            chunker,
            extractor,
            store,
            workers: workers.max(1),
        }
    }

    /// Ingests one intake file. On success the file is moved to the
    /// processed area.
    pub async fn ingest_path(&self, path: &Path, kind: DocumentKind) -> Result<IngestReport> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::FileNotFound(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let filename = base_filename(&path.to_string_lossy());

        if looks_like_zip(&bytes) {
            let report = self.ingest_archive(&filename, bytes, kind).await?;
            self.store.mark_processed(path)?;
            return Ok(report);
        }

        if has_extension(&filename, "zip") {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not a readable archive",
                filename
            )));
        }

        let report = self.ingest_single(&filename, &bytes, kind)?;
        // A document that failed extraction stays in the intake area.
        if !report.collections.is_empty() {
            self.store.mark_processed(path)?;
        }
        Ok(report)
    }

    /// Extracts and chunks one document synchronously. An extraction
    /// failure is reported as skipped, not raised.
    pub fn ingest_single(
        &self,
        filename: &str,
        bytes: &[u8],
        kind: DocumentKind,
    ) -> Result<IngestReport> {
        if !has_extension(filename, kind.extension()) {
            return Err(PipelineError::InvalidInput(format!(
                "{}: expected a .{} file",
                filename,
                kind.extension()
            )));
        }

        let mut report = IngestReport::default();
        match self.extractor.extract(kind, filename, bytes) {
            Ok(text) => {
                let collection = self.chunker.chunk_document(filename, kind, &text);
                self.store.put(&collection)?;
                info!(filename = %filename, chunks = collection.len(), "Document chunked");
                report.collections.push(collection);
            }
            Err(e) => {
                warn!(filename = %filename, error = %e, "Skipping unreadable document");
                report.skipped.push(SkippedFile {
                    filename: filename.to_string(),
                    reason: e.to_string(),
                });
            }
        }
        Ok(report)
    }

    /// Extracts every `.pdf`/`.txt` member (per `kind`) concurrently.
    pub async fn ingest_archive(
        &self,
        archive_name: &str,
        bytes: Vec<u8>,
        kind: DocumentKind,
    ) -> Result<IngestReport> {
        let extension = kind.extension();
        let (members, mut skipped) =
            tokio::task::spawn_blocking(move || read_members(bytes, extension))
                .await
                .map_err(|e| {
                    PipelineError::InvalidInput(format!("archive reader failed: {}", e))
                })??;

        info!(
            archive = %archive_name,
            members = members.len(),
            workers = self.workers,
            "Extracting archive members"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(members.len());

        for member in members {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::InvalidInput(format!("worker pool closed: {}", e)))?;
            let extractor = self.extractor.clone();
            let chunker = self.chunker;
            let filename = member.filename.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let text = extractor.extract(kind, &member.filename, &member.data)?;
                let collection = chunker.chunk_document(&member.filename, kind, &text);
                Ok::<_, PipelineError>((collection, member.data))
            });
            handles.push((filename, handle));
        }

        let mut collections = Vec::new();
        for (filename, handle) in handles {
            match handle.await {
                Ok(Ok((collection, data))) => {
                    let stored = self
                        .store
                        .write_processed(&filename, &data)
                        .and_then(|_| self.store.put(&collection));
                    match stored {
                        Ok(_) => {
                            info!(
                                filename = %filename,
                                chunks = collection.len(),
                                "Document chunked"
                            );
                            collections.push(collection);
                        }
                        Err(e) => {
                            warn!(
                                filename = %filename,
                                error = %e,
                                "Failed to store archive member"
                            );
                            skipped.push(SkippedFile {
                                filename,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(filename = %filename, error = %e, "Skipping unreadable archive member");
                    skipped.push(SkippedFile {
                        filename,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(filename = %filename, error = %e, "Extraction worker aborted");
                    skipped.push(SkippedFile {
                        filename,
                        reason: format!("extraction worker aborted: {}", e),
                    });
                }
            }
        }

        Ok(IngestReport {
            collections,
            skipped,
        })
    }
}
