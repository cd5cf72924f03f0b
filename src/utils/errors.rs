use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Extraction failed for {filename}: {reason}")]
    ExtractionFailed { filename: String, reason: String },

    #[error("Invalid chunking parameters: chunk_size {chunk_size}, overlap {overlap}")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Encoder error: {0}")]
    EncoderError(String),

    #[error("Backend error ({status_code}): {message}")]
    Backend { status_code: u16, message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A remote call that did not produce usable output.
///
/// Carried as a value inside per-chunk results so one failed chunk never
/// aborts the rest of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub status_code: u16,
    pub message: String,
}

impl BackendFailure {
    /// No HTTP response at all (connect/timeout).
    pub const UNREACHABLE: u16 = 503;
    /// A 2xx response whose body did not have the expected shape.
    pub const MALFORMED: u16 = 502;

    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(Self::MALFORMED, message)
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(Self::UNREACHABLE, message)
    }
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code)
    }
}

impl From<BackendFailure> for PipelineError {
    fn from(failure: BackendFailure) -> Self {
        PipelineError::Backend {
            status_code: failure.status_code,
            message: failure.message,
        }
    }
}

pub(crate) fn db_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::DatabaseError(e.to_string())
}

pub(crate) fn serialization_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::SerializationError(e.to_string())
}
