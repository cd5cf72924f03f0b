use crate::audio::normalizer::spawn_error;
use crate::utils::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

/// Re-encodes `.mp4` video into a `.flac` audio track.
pub struct VideoConverter {
    ffmpeg_path: PathBuf,
    scratch_dir: PathBuf,
}

impl VideoConverter {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    pub async fn to_flac(&self, video: &[u8]) -> Result<Vec<u8>> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let stem = format!("video_{}", Uuid::new_v4());
        let video_path = self.scratch_dir.join(format!("{}.mp4", stem));
        let flac_path = self.scratch_dir.join(format!("{}.flac", stem));

        tokio::fs::write(&video_path, video).await?;
        let converted = self.convert(&video_path, &flac_path).await;

        for path in [&video_path, &flac_path] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
                }
            }
        }

        converted
    }

    async fn convert(&self, video_path: &Path, flac_path: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(video_path)
            .arg(flac_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(&self.ffmpeg_path, e))?;

        if !output.status.success() {
            return Err(PipelineError::EncoderError(format!(
                "video conversion exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let flac = tokio::fs::read(flac_path).await?;
        info!(flac_bytes = flac.len(), "Video converted");
        Ok(flac)
    }
}
