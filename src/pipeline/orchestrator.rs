use crate::document::SkippedFile;
use crate::store::ChunkStore;
use crate::translation::{ensure_supported, TranslationDispatcher, TranslationResult};
use crate::utils::{PipelineError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDocument {
    pub filename: String,
    pub reason: String,
}

/// Outcome of one batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// Every chunk result, keyed `"{source_filename}_{ordinal}"`.
    pub results: BTreeMap<String, TranslationResult>,
    /// Per-document results in ordinal order.
    #[serde(skip)]
    pub documents: BTreeMap<String, Vec<TranslationResult>>,
    pub failed_documents: Vec<FailedDocument>,
    pub skipped_files: Vec<SkippedFile>,
}

impl BatchReport {
    fn add_document(&mut self, filename: String, results: Vec<TranslationResult>) {
        for result in &results {
            self.results.insert(result.chunk_key.to_string(), result.clone());
        }
        self.documents.insert(filename, results);
    }

    pub fn chunk_count(&self) -> usize {
        self.results.len()
    }

    pub fn failed_chunk_count(&self) -> usize {
        self.results.values().filter(|r| !r.is_success()).count()
    }
}

/// Translates every pending collection, one document per worker.
#[derive(Clone)]
pub struct BatchOrchestrator {
    dispatcher: TranslationDispatcher,
    store: ChunkStore,
    workers: usize,
}

impl BatchOrchestrator {
    pub fn new(dispatcher: TranslationDispatcher, store: ChunkStore, workers: usize) -> Self {
        Self {
            dispatcher,
            store,
            workers: workers.max(1),
        }
    }

    pub async fn run(&self, source_language: &str) -> Result<BatchReport> {
        ensure_supported(source_language)?;

        let pending = self.store.list_pending()?;
        info!(
            documents = pending.len(),
            workers = self.workers,
            source_language = %source_language,
            "Starting batch translation"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(pending.len());

        for filename in pending {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::InvalidInput(format!("worker pool closed: {}", e)))?;
            let dispatcher = self.dispatcher.clone();
            let store = self.store.clone();
            let language = source_language.to_string();
            let task_filename = filename.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let collection = store.get(&task_filename)?;
                let results = dispatcher.translate_document(&language, &collection).await?;
                // Translated copy is stored; the pending entry has served its purpose.
                store.remove(&task_filename)?;
                Ok::<_, PipelineError>(results)
            });
            handles.push((filename, handle));
        }

        let mut report = BatchReport::default();
        for (filename, handle) in handles {
            match handle.await {
                Ok(Ok(results)) => report.add_document(filename, results),
                Ok(Err(e)) => {
                    error!(filename = %filename, error = %e, "Document translation failed");
                    report.failed_documents.push(FailedDocument {
                        filename,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(filename = %filename, error = %e, "Document worker aborted");
                    report.failed_documents.push(FailedDocument {
                        filename,
                        reason: format!("worker aborted: {}", e),
                    });
                }
            }
        }

        info!(
            documents = report.documents.len(),
            chunks = report.chunk_count(),
            failed_chunks = report.failed_chunk_count(),
            failed_documents = report.failed_documents.len(),
            "Batch translation finished"
        );

        Ok(report)
    }
}
