pub mod audio;
pub mod document;
pub mod pipeline;
pub mod store;
pub mod translation;
pub mod utils;

pub use audio::{AudioInput, AudioTranslator, ClipResult};
pub use document::{ChunkCollection, ChunkKey, DocumentIngestor, TextChunker, UploadKind};
pub use pipeline::{BatchOrchestrator, BatchReport, TranslationSession};
pub use store::ChunkStore;
pub use translation::{PipelineClient, TranslationDispatcher, TranslationResult};
pub use utils::{AppConfig, BackendFailure, PipelineError, Result};
