use crate::document::collection::{ChunkCollection, DocumentKind};
use crate::utils::{PipelineError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 4000;
pub const DEFAULT_OVERLAP: usize = 300;

/// Sliding-window splitter. Sizes count `char`s, not bytes.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(PipelineError::InvalidChunking {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Window `i` starts at `i * (chunk_size - overlap)`. Splitting stops
    /// once a window reaches the end of the text, so the tail is never
    /// emitted as a chunk already contained in its predecessor.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }

    pub fn chunk_document(
        &self,
        source_filename: &str,
        kind: DocumentKind,
        text: &str,
    ) -> ChunkCollection {
        ChunkCollection::new(source_filename, kind, self.split(text))
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}
