use crate::document::ChunkKey;
use crate::utils::BackendFailure;
use serde::{Deserialize, Serialize};

pub const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub chunk_key: ChunkKey,
    pub original_text: String,
    pub translated_text: String,
    pub status_code: u16,
    pub message: String,
    /// Language pair the result was produced for; empty when unknown.
    #[serde(default)]
    pub source_language: String,
    #[serde(default)]
    pub target_language: String,
}

impl TranslationResult {
    pub fn success(chunk_key: ChunkKey, original_text: &str, translated_text: &str) -> Self {
        Self {
            chunk_key,
            original_text: original_text.to_string(),
            translated_text: translated_text.to_string(),
            status_code: STATUS_OK,
            message: "Translation successful".to_string(),
            source_language: String::new(),
            target_language: String::new(),
        }
    }

    pub fn failure(
        chunk_key: ChunkKey,
        original_text: &str,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            chunk_key,
            original_text: original_text.to_string(),
            translated_text: String::new(),
            status_code,
            message: message.into(),
            source_language: String::new(),
            target_language: String::new(),
        }
    }

    pub fn from_outcome(
        chunk_key: ChunkKey,
        original_text: &str,
        outcome: Result<String, BackendFailure>,
    ) -> Self {
        match outcome {
            Ok(translated) => Self::success(chunk_key, original_text, &translated),
            Err(failure) => {
                Self::failure(chunk_key, original_text, failure.status_code, failure.message)
            }
        }
    }

    pub fn with_languages(mut self, source_language: &str, target_language: &str) -> Self {
        self.source_language = source_language.to_string();
        self.target_language = target_language.to_string();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// Whether this result can stand in for a fresh translation of `text`
    /// between the given languages.
    pub fn is_reusable_for(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> bool {
        self.is_success()
            && self.original_text == text
            && self.source_language == source_language
            && self.target_language == target_language
    }
}
