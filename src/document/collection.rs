use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Txt,
}

impl DocumentKind {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub ordinal: usize,
}

/// All chunks of one source document, in split order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkCollection {
    pub source_filename: String,
    pub chunks: Vec<Chunk>,
    pub metadata: BTreeMap<String, String>,
}

impl ChunkCollection {
    pub fn new(source_filename: impl Into<String>, kind: DocumentKind, texts: Vec<String>) -> Self {
        let source_filename = source_filename.into();
        let chunks: Vec<Chunk> = texts
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk { text, ordinal })
            .collect();

        let mut metadata = BTreeMap::new();
        metadata.insert("filename".to_string(), source_filename.clone());
        metadata.insert("document_kind".to_string(), kind.to_string());
        metadata.insert("chunk_count".to_string(), chunks.len().to_string());

        Self {
            source_filename,
            chunks,
            metadata,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Copy with every chunk's text replaced by the translation at the same
    /// ordinal. Missing translations become empty strings.
    pub fn translated_copy(
        &self,
        translations: &BTreeMap<usize, String>,
        target_language: &str,
    ) -> Self {
        let chunks = self
            .chunks
            .iter()
            .map(|chunk| Chunk {
                text: translations.get(&chunk.ordinal).cloned().unwrap_or_default(),
                ordinal: chunk.ordinal,
            })
            .collect();

        let mut metadata = self.metadata.clone();
        metadata.insert("translated_from".to_string(), self.source_filename.clone());
        metadata.insert("target_language".to_string(), target_language.to_string());

        Self {
            source_filename: self.source_filename.clone(),
            chunks,
            metadata,
        }
    }
}

/// Identity of one chunk across the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    pub source_filename: String,
    pub ordinal: usize,
}

impl ChunkKey {
    pub fn new(source_filename: impl Into<String>, ordinal: usize) -> Self {
        Self {
            source_filename: source_filename.into(),
            ordinal,
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.source_filename, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_contiguous_from_zero() {
        let collection = ChunkCollection::new(
            "a.txt",
            DocumentKind::Txt,
            vec!["one".into(), "two".into(), "three".into()],
        );
        let ordinals: Vec<usize> = collection.chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert_eq!(collection.metadata["chunk_count"], "3");
        assert_eq!(collection.metadata["document_kind"], "txt");
    }

    #[test]
    fn test_translated_copy_leaves_original_untouched() {
        let original =
            ChunkCollection::new("a.pdf", DocumentKind::Pdf, vec!["uno".into(), "dos".into()]);
        let translations = BTreeMap::from([(0, "one".to_string())]);
        let translated = original.translated_copy(&translations, "en");

        assert_eq!(original.chunks[0].text, "uno");
        assert_eq!(translated.chunks[0].text, "one");
        assert_eq!(translated.chunks[1].text, "");
        assert_eq!(translated.metadata["translated_from"], "a.pdf");
        assert_eq!(translated.metadata["target_language"], "en");
    }

    #[test]
    fn test_chunk_key_display() {
        assert_eq!(ChunkKey::new("report.pdf", 4).to_string(), "report.pdf_4");
    }
}
