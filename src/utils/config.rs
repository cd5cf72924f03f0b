use crate::utils::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub chunking: ChunkingConfig,
    pub workers: WorkerConfig,
    pub storage: StorageConfig,
    pub audio: AudioConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub discovery_url: String,
    pub pipeline_id: String,
    pub user_id: String,
    pub api_key: String,
    pub target_language: String,
    pub timeout_seconds: u64,
    /// Reuse stored successful chunk results instead of re-sending them.
    pub resume_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub extraction_workers: usize,
    pub dispatch_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    pub processed_dir: PathBuf,
    pub scratch_dir: PathBuf,
    /// Scratch entries older than this are swept on startup and on reset.
    pub scratch_max_age_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub ffmpeg_path: PathBuf,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            discovery_url: "https://meity-auth.ulcacontrib.org/ulca/apis/v0/model/getModelsPipeline"
                .to_string(),
            pipeline_id: "64392f96daac500b55c543cd".to_string(),
            user_id: String::new(),
            api_key: String::new(),
            target_language: "en".to_string(),
            timeout_seconds: 120,
            resume_completed: true,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            overlap: 300,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            extraction_workers: 5,
            dispatch_workers: 5,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/chunks.redb"),
            processed_dir: PathBuf::from("./data/processed"),
            scratch_dir: PathBuf::from("./data/scratch"),
            scratch_max_age_minutes: 60,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            sample_rate: 16000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::ConfigError(format!("{}: {}", path, e)))?;
        toml::from_str(&content).map_err(|e| PipelineError::ConfigError(e.to_string()))
    }

    /// `Ok(None)` when the file does not exist. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load_optional(path: &str) -> Result<Option<Self>> {
        if !Path::new(path).exists() {
            return Ok(None);
        }
        Self::load_from_file(path).map(Some)
    }

    /// Credentials are kept out of the config file when the environment
    /// provides them.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(user_id) = std::env::var("PIPELINE_USER_ID") {
            self.backend.user_id = user_id;
        }
        if let Ok(api_key) = std::env::var("PIPELINE_API_KEY") {
            self.backend.api_key = api_key;
        }
        if let Ok(pipeline_id) = std::env::var("PIPELINE_PIPELINE_ID") {
            self.backend.pipeline_id = pipeline_id;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 || self.chunking.overlap >= self.chunking.chunk_size {
            return Err(PipelineError::InvalidChunking {
                chunk_size: self.chunking.chunk_size,
                overlap: self.chunking.overlap,
            });
        }
        if self.workers.extraction_workers == 0 || self.workers.dispatch_workers == 0 {
            return Err(PipelineError::ConfigError(
                "worker pools need at least one worker".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 4000);
        assert_eq!(config.chunking.overlap, 300);
        assert_eq!(config.workers.extraction_workers, 5);
        assert_eq!(config.backend.target_language, "en");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [chunking]
            chunk_size = 1000

            [backend]
            user_id = "someone"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.overlap, 300);
        assert_eq!(config.backend.user_id, "someone");
        assert_eq!(config.backend.timeout_seconds, 120);
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.chunking.chunk_size = 300;
        config.chunking.overlap = 300;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidChunking { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_worker_pool() {
        let mut config = AppConfig::default();
        config.workers.dispatch_workers = 0;
        assert!(matches!(config.validate(), Err(PipelineError::ConfigError(_))));
    }

    #[test]
    fn test_missing_file_is_none() {
        let loaded = AppConfig::load_optional("/nonexistent/config.toml").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking\nchunk_size = ").unwrap();

        let err = AppConfig::load_optional(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));
    }

    #[test]
    fn test_existing_file_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[workers]\ndispatch_workers = 2\n").unwrap();

        let config = AppConfig::load_optional(path.to_str().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(config.workers.dispatch_workers, 2);
        assert_eq!(config.chunking.chunk_size, 4000);
    }
}
