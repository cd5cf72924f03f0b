pub mod chunk_store;
pub mod cleanup;

pub use chunk_store::{translated_name, ChunkStore, TRANSLATED_PREFIX};
pub use cleanup::{CleanupReport, ScratchCleaner};
