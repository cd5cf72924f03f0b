use crate::document::{ChunkCollection, ChunkKey};
use crate::translation::TranslationResult;
use crate::utils::errors::{db_error, serialization_error};
use crate::utils::{PipelineError, Result};
use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const PENDING_TABLE: JsonTable = TableDefinition::new("pending_collections");
const TRANSLATED_TABLE: JsonTable = TableDefinition::new("translated_collections");
const RESULTS_TABLE: JsonTable = TableDefinition::new("chunk_results");

const ALL_TABLES: [JsonTable; 3] = [PENDING_TABLE, TRANSLATED_TABLE, RESULTS_TABLE];

pub const TRANSLATED_PREFIX: &str = "english_";

pub fn translated_name(source_filename: &str) -> String {
    format!("{}{}", TRANSLATED_PREFIX, source_filename)
}

/// Durable home of chunk collections between ingestion and translation.
///
/// Three areas live in one redb file: pending collections keyed by source
/// filename, translated copies keyed by `english_{filename}`, and per-chunk
/// results keyed by `{filename}_{ordinal}`. Source documents that have been
/// chunked are moved into `processed_dir`.
#[derive(Clone)]
pub struct ChunkStore {
    db: Arc<Database>,
    processed_dir: PathBuf,
}

impl ChunkStore {
    pub fn open(db_path: &Path, processed_dir: impl Into<PathBuf>) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(db_path).map_err(db_error)?;
        let store = Self {
            db: Arc::new(db),
            processed_dir: processed_dir.into(),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(db_error)?;
        for table in ALL_TABLES {
            write_txn.open_table(table).map_err(db_error)?;
        }
        write_txn.commit().map_err(db_error)
    }

    pub fn put(&self, collection: &ChunkCollection) -> Result<()> {
        self.insert(PENDING_TABLE, &collection.source_filename, collection)?;
        tracing::debug!(
            filename = %collection.source_filename,
            chunks = collection.len(),
            "Stored chunk collection"
        );
        Ok(())
    }

    pub fn list_pending(&self) -> Result<Vec<String>> {
        self.keys(PENDING_TABLE)
    }

    pub fn get(&self, source_filename: &str) -> Result<ChunkCollection> {
        self.fetch(PENDING_TABLE, source_filename)?
            .ok_or_else(|| PipelineError::CollectionNotFound(source_filename.to_string()))
    }

    pub fn remove(&self, source_filename: &str) -> Result<bool> {
        self.delete(PENDING_TABLE, source_filename)
    }

    pub fn put_translated(&self, collection: &ChunkCollection) -> Result<String> {
        let name = translated_name(&collection.source_filename);
        self.insert(TRANSLATED_TABLE, &name, collection)?;
        Ok(name)
    }

    pub fn get_translated(&self, source_filename: &str) -> Result<Option<ChunkCollection>> {
        self.fetch(TRANSLATED_TABLE, &translated_name(source_filename))
    }

    pub fn list_translated(&self) -> Result<Vec<String>> {
        self.keys(TRANSLATED_TABLE)
    }

    /// Overwrites any earlier result for the same chunk key.
    pub fn record_result(&self, result: &TranslationResult) -> Result<()> {
        self.insert(RESULTS_TABLE, &result.chunk_key.to_string(), result)
    }

    pub fn get_result(&self, key: &ChunkKey) -> Result<Option<TranslationResult>> {
        self.fetch(RESULTS_TABLE, &key.to_string())
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Moves an intake file into the processed area.
    pub fn mark_processed(&self, source: &Path) -> Result<PathBuf> {
        let filename = source
            .file_name()
            .ok_or_else(|| PipelineError::InvalidInput(source.display().to_string()))?;
        std::fs::create_dir_all(&self.processed_dir)?;
        let target = self.processed_dir.join(filename);

        if std::fs::rename(source, &target).is_err() {
            // Different filesystem.
            std::fs::copy(source, &target)?;
            std::fs::remove_file(source)?;
        }

        tracing::debug!(from = %source.display(), to = %target.display(), "Moved to processed area");
        Ok(target)
    }

    /// Writes an archive member into the processed area.
    pub fn write_processed(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.processed_dir)?;
        let target = self.processed_dir.join(filename);
        std::fs::write(&target, bytes)?;
        Ok(target)
    }

    /// Session reset. Safe to call on an empty store.
    pub fn clear_all(&self) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(db_error)?;
        for table in ALL_TABLES {
            write_txn.delete_table(table).map_err(db_error)?;
            write_txn.open_table(table).map_err(db_error)?;
        }
        write_txn.commit().map_err(db_error)?;

        match std::fs::remove_dir_all(&self.processed_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Cleared chunk store and processed area");
        Ok(())
    }

    fn insert<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec(value).map_err(serialization_error)?;

        let write_txn = self.db.begin_write().map_err(db_error)?;
        {
            let mut table = write_txn.open_table(table).map_err(db_error)?;
            table.insert(key, data.as_slice()).map_err(db_error)?;
        }
        write_txn.commit().map_err(db_error)
    }

    fn fetch<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> Result<Option<T>> {
        let read_txn = self.db.begin_read().map_err(db_error)?;
        let table = read_txn.open_table(table).map_err(db_error)?;

        match table.get(key).map_err(db_error)? {
            Some(data) => serde_json::from_slice(data.value())
                .map(Some)
                .map_err(serialization_error),
            None => Ok(None),
        }
    }

    fn delete(&self, table: JsonTable, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write().map_err(db_error)?;
        let removed = {
            let mut table = write_txn.open_table(table).map_err(db_error)?;
            let previous = table.remove(key).map_err(db_error)?;
            previous.is_some()
        };
        write_txn.commit().map_err(db_error)?;
        Ok(removed)
    }

    fn keys(&self, table: JsonTable) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read().map_err(db_error)?;
        let table = read_txn.open_table(table).map_err(db_error)?;

        let mut keys = Vec::new();
        for entry in table.iter().map_err(db_error)? {
            let (key, _) = entry.map_err(db_error)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
