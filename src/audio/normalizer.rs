use crate::utils::{PipelineError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Turns arbitrary audio into mono 16-bit PCM WAV at the configured rate.
#[async_trait]
pub trait AudioNormalizer: Send + Sync {
    async fn normalize(&self, audio: &[u8]) -> Result<Vec<u8>>;
}

pub struct FfmpegNormalizer {
    ffmpeg_path: PathBuf,
    sample_rate: u32,
}

impl FfmpegNormalizer {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            sample_rate,
        }
    }
}

#[async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn normalize(&self, audio: &[u8]) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-i", "pipe:0", "-ac", "1", "-ar"])
            .arg(self.sample_rate.to_string())
            .args(["-acodec", "pcm_s16le", "-f", "wav", "pipe:1"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.ffmpeg_path, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::EncoderError("encoder stdin unavailable".to_string()))?;
        let input = audio.to_vec();
        let writer = tokio::spawn(async move {
            // Encoder may exit before consuming everything; its exit status decides.
            if let Err(e) = stdin.write_all(&input).await {
                debug!(error = %e, "Encoder closed its input early");
            }
        });

        let output = child.wait_with_output().await?;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "Audio normalization failed");
            return Err(PipelineError::EncoderError(format!(
                "encoder exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(PipelineError::EncoderError(
                "encoder produced no audio".to_string(),
            ));
        }

        debug!(
            input_bytes = audio.len(),
            output_bytes = output.stdout.len(),
            "Audio normalized"
        );
        Ok(output.stdout)
    }
}

pub(crate) fn spawn_error(program: &Path, e: std::io::Error) -> PipelineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        PipelineError::EncoderError(format!("{} not found", program.display()))
    } else {
        PipelineError::EncoderError(format!("failed to start {}: {}", program.display(), e))
    }
}
