pub mod config;
pub mod errors;

pub use config::{
    AppConfig, AudioConfig, BackendConfig, ChunkingConfig, LoggingConfig, StorageConfig,
    WorkerConfig,
};
pub use errors::{BackendFailure, PipelineError, Result};

/// Final path component, falling back to the whole string.
pub fn base_filename(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

pub fn has_extension(name: &str, ext: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
