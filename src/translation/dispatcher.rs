use crate::document::{Chunk, ChunkCollection, ChunkKey};
use crate::store::ChunkStore;
use crate::translation::client::TranslationBackend;
use crate::translation::languages::ensure_supported;
use crate::translation::result::TranslationResult;
use crate::utils::{BackendConfig, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Sends chunks to the backend one at a time and checkpoints every result.
#[derive(Clone)]
pub struct TranslationDispatcher {
    backend: Arc<dyn TranslationBackend>,
    store: ChunkStore,
    target_language: String,
    resume_completed: bool,
}

impl TranslationDispatcher {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        store: ChunkStore,
        config: &BackendConfig,
    ) -> Self {
        Self {
            backend,
            store,
            target_language: config.target_language.clone(),
            resume_completed: config.resume_completed,
        }
    }

    pub async fn translate_chunk(
        &self,
        source_language: &str,
        chunk_key: ChunkKey,
        text: &str,
    ) -> TranslationResult {
        let outcome = self.backend.translate(source_language, text).await;
        TranslationResult::from_outcome(chunk_key, text, outcome)
            .with_languages(source_language, &self.target_language)
    }

    /// One-off text outside any document.
    pub async fn translate_text(
        &self,
        source_language: &str,
        text: &str,
    ) -> Result<TranslationResult> {
        ensure_supported(source_language)?;
        Ok(self
            .translate_chunk(source_language, ChunkKey::new("text", 0), text)
            .await)
    }

    /// Translates every chunk in ordinal order. A failed chunk is recorded
    /// and the next one is attempted; only store failures end the document
    /// early. The translated copy goes to the output area afterwards.
    pub async fn translate_document(
        &self,
        source_language: &str,
        collection: &ChunkCollection,
    ) -> Result<Vec<TranslationResult>> {
        ensure_supported(source_language)?;

        let filename = &collection.source_filename;
        let mut chunks: Vec<&Chunk> = collection.chunks.iter().collect();
        chunks.sort_by_key(|chunk| chunk.ordinal);

        let mut results = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let key = ChunkKey::new(filename.as_str(), chunk.ordinal);

            if let Some(previous) = self.completed_result(&key, &chunk.text, source_language)? {
                info!(filename = %filename, ordinal = chunk.ordinal, "Reusing stored translation");
                results.push(previous);
                continue;
            }

            info!(filename = %filename, ordinal = chunk.ordinal, "Translating chunk");
            let result = self.translate_chunk(source_language, key, &chunk.text).await;

            if result.is_success() {
                info!(filename = %filename, ordinal = chunk.ordinal, "Chunk translated");
            } else {
                error!(
                    filename = %filename,
                    ordinal = chunk.ordinal,
                    status_code = result.status_code,
                    message = %result.message,
                    "Chunk translation failed"
                );
            }

            self.store.record_result(&result)?;
            results.push(result);
        }

        let translations: BTreeMap<usize, String> = results
            .iter()
            .map(|result| (result.chunk_key.ordinal, result.translated_text.clone()))
            .collect();
        let translated = collection.translated_copy(&translations, &self.target_language);
        let output_name = self.store.put_translated(&translated)?;

        info!(
            filename = %filename,
            output = %output_name,
            chunks = results.len(),
            failed = results.iter().filter(|r| !r.is_success()).count(),
            "Document translation finished"
        );

        Ok(results)
    }

    fn completed_result(
        &self,
        key: &ChunkKey,
        text: &str,
        source_language: &str,
    ) -> Result<Option<TranslationResult>> {
        if !self.resume_completed {
            return Ok(None);
        }
        Ok(self.store.get_result(key)?.filter(|previous| {
            previous.is_reusable_for(text, source_language, &self.target_language)
        }))
    }
}
