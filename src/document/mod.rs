pub mod archive;
pub mod chunker;
pub mod collection;
pub mod extractor;
pub mod ingestor;
pub mod upload;

pub use chunker::{TextChunker, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use collection::{Chunk, ChunkCollection, ChunkKey, DocumentKind};
pub use extractor::{DefaultExtractor, TextExtractor};
pub use ingestor::{DocumentIngestor, IngestReport, SkippedFile};
pub use upload::{is_zip_archive, looks_like_zip, UploadKind};
