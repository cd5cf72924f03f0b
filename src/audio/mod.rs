pub mod input;
pub mod normalizer;
pub mod video;

pub use input::AudioInput;
pub use normalizer::{AudioNormalizer, FfmpegNormalizer};
pub use video::VideoConverter;

use crate::document::archive::read_members;
use crate::document::{is_zip_archive, UploadKind};
use crate::translation::{ensure_supported, AudioPayload, SpeechBackend, Transcription};
use crate::utils::{AppConfig, PipelineError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const NORMALIZED_FORMAT: &str = "wav";
const CLIP_EXTENSION: &str = "flac";

/// Outcome for one clip of an audio archive: a transcription or an error.
#[derive(Debug, Clone, Serialize)]
pub struct ClipResult {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Transcription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClipResult {
    fn failed(file_name: String, error: String) -> Self {
        Self {
            file_name,
            result: None,
            error: Some(error),
        }
    }
}

/// Audio and video front-end: resolve, normalize, then one ASR + translation
/// call per clip.
pub struct AudioTranslator {
    backend: Arc<dyn SpeechBackend>,
    normalizer: Arc<dyn AudioNormalizer>,
    video: VideoConverter,
    http: Client,
    sample_rate: u32,
}

impl AudioTranslator {
    pub fn new(config: &AppConfig, backend: Arc<dyn SpeechBackend>) -> Result<Self> {
        let normalizer = Arc::new(FfmpegNormalizer::new(
            &config.audio.ffmpeg_path,
            config.audio.sample_rate,
        ));
        Self::with_normalizer(config, backend, normalizer)
    }

    pub fn with_normalizer(
        config: &AppConfig,
        backend: Arc<dyn SpeechBackend>,
        normalizer: Arc<dyn AudioNormalizer>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_seconds))
            .build()?;

        Ok(Self {
            backend,
            normalizer,
            video: VideoConverter::new(&config.audio.ffmpeg_path, &config.storage.scratch_dir),
            http,
            sample_rate: config.audio.sample_rate,
        })
    }

    pub async fn translate_audio(
        &self,
        source_language: &str,
        input: &AudioInput,
    ) -> Result<Transcription> {
        ensure_supported(source_language)?;

        let raw = input.resolve(&self.http).await?;
        let normalized = self.normalizer.normalize(&raw).await?;
        let payload = AudioPayload {
            content_base64: STANDARD.encode(&normalized),
            format: NORMALIZED_FORMAT.to_string(),
            sampling_rate: self.sample_rate,
        };

        let transcription = self
            .backend
            .transcribe_and_translate(source_language, &payload)
            .await?;
        info!(
            source_language = %source_language,
            audio_bytes = raw.len(),
            "Audio translated"
        );
        Ok(transcription)
    }

    pub async fn translate_video(
        &self,
        source_language: &str,
        video: &[u8],
    ) -> Result<Transcription> {
        ensure_supported(source_language)?;
        let flac = self.video.to_flac(video).await?;
        self.translate_audio(source_language, &AudioInput::Stream(flac))
            .await
    }

    /// Entry point for a named `.flac` or `.mp4` upload.
    pub async fn translate_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        kind: UploadKind,
        source_language: &str,
    ) -> Result<Transcription> {
        kind.validate_filename(filename)?;
        match kind {
            UploadKind::Audio => {
                self.translate_audio(source_language, &AudioInput::Stream(bytes))
                    .await
            }
            UploadKind::Video => self.translate_video(source_language, &bytes).await,
            UploadKind::Document | UploadKind::Text | UploadKind::AudioArchive => {
                Err(PipelineError::InvalidInput(format!(
                    "{:?} uploads are not a single clip",
                    kind
                )))
            }
        }
    }

    /// Translates every `.flac` clip of a `.zip` upload, one after another.
    /// A clip that cannot be read or translated gets an error entry and the
    /// rest carry on.
    pub async fn translate_audio_archive(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        source_language: &str,
    ) -> Result<Vec<ClipResult>> {
        ensure_supported(source_language)?;
        UploadKind::AudioArchive.validate_filename(filename)?;
        if !is_zip_archive(&bytes) {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not a readable archive",
                filename
            )));
        }

        let (members, skipped) =
            tokio::task::spawn_blocking(move || read_members(bytes, CLIP_EXTENSION))
                .await
                .map_err(|e| {
                    PipelineError::InvalidInput(format!("archive reader failed: {}", e))
                })??;

        let mut clips: Vec<ClipResult> = skipped
            .into_iter()
            .map(|skip| ClipResult::failed(skip.filename, skip.reason))
            .collect();

        for member in members {
            let input = AudioInput::Stream(member.data);
            match self.translate_audio(source_language, &input).await {
                Ok(transcription) => clips.push(ClipResult {
                    file_name: member.filename,
                    result: Some(transcription),
                    error: None,
                }),
                Err(e) => {
                    warn!(file_name = %member.filename, error = %e, "Clip translation failed");
                    clips.push(ClipResult::failed(member.filename, e.to_string()));
                }
            }
        }

        info!(
            archive = %filename,
            clips = clips.len(),
            failed = clips.iter().filter(|c| c.error.is_some()).count(),
            "Audio archive translated"
        );
        Ok(clips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::BackendFailure;
    use async_trait::async_trait;
    use std::io::{Cursor, Write};
    use std::sync::Mutex;
    use zip::write::SimpleFileOptions;

    struct TaggingNormalizer;

    #[async_trait]
    impl AudioNormalizer for TaggingNormalizer {
        async fn normalize(&self, audio: &[u8]) -> Result<Vec<u8>> {
            let mut out = b"WAV:".to_vec();
            out.extend_from_slice(audio);
            Ok(out)
        }
    }

    #[derive(Default)]
    struct RecordingSpeech {
        payloads: Mutex<Vec<AudioPayload>>,
        failure: Option<u16>,
    }

    #[async_trait]
    impl SpeechBackend for RecordingSpeech {
        async fn transcribe_and_translate(
            &self,
            _source_language: &str,
            audio: &AudioPayload,
        ) -> std::result::Result<Transcription, BackendFailure> {
            self.payloads.lock().unwrap().push(audio.clone());
            if let Some(status) = self.failure {
                return Err(BackendFailure::new(status, "ASR unavailable"));
            }
            Ok(Transcription {
                transcript: Some("namaste".to_string()),
                translation: "hello".to_string(),
            })
        }
    }

    fn translator(speech: Arc<RecordingSpeech>) -> AudioTranslator {
        let config = AppConfig::default();
        AudioTranslator::with_normalizer(&config, speech, Arc::new(TaggingNormalizer)).unwrap()
    }

    #[tokio::test]
    async fn test_normalized_audio_is_sent_as_wav() {
        let speech = Arc::new(RecordingSpeech::default());
        let translator = translator(speech.clone());

        let result = translator
            .translate_audio("hi", &AudioInput::Stream(b"flacdata".to_vec()))
            .await
            .unwrap();

        assert_eq!(result.translation, "hello");
        assert_eq!(result.transcript.as_deref(), Some("namaste"));

        let payloads = speech.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].format, "wav");
        assert_eq!(payloads[0].sampling_rate, 16000);
        assert_eq!(
            STANDARD.decode(&payloads[0].content_base64).unwrap(),
            b"WAV:flacdata"
        );
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_status() {
        let speech = Arc::new(RecordingSpeech {
            failure: Some(503),
            ..Default::default()
        });

        let err = translator(speech)
            .translate_audio("ta", &AudioInput::Stream(b"x".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Backend { status_code: 503, .. }));
    }

    #[tokio::test]
    async fn test_unsupported_language_makes_no_call() {
        let speech = Arc::new(RecordingSpeech::default());
        let result = translator(speech.clone())
            .translate_audio("xx", &AudioInput::Stream(b"x".to_vec()))
            .await;

        assert!(matches!(result, Err(PipelineError::UnsupportedLanguage(_))));
        assert!(speech.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_extension_checked() {
        let speech = Arc::new(RecordingSpeech::default());
        let translator = translator(speech.clone());

        let err = translator
            .translate_upload("clip.mp3", b"x".to_vec(), UploadKind::Audio, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));

        let ok = translator
            .translate_upload("clip.FLAC", b"x".to_vec(), UploadKind::Audio, "hi")
            .await
            .unwrap();
        assert_eq!(ok.translation, "hello");
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_archive_reports_each_clip() {
        let speech = Arc::new(RecordingSpeech::default());
        let translator = translator(speech.clone());
        let upload = zip_of(&[
            ("talks/first.flac", b"clip one"),
            ("empty.flac", b""),
            ("readme.txt", b"not audio"),
        ]);

        let clips = translator
            .translate_audio_archive("clips.zip", upload, "hi")
            .await
            .unwrap();

        assert_eq!(clips.len(), 2);
        let first = clips.iter().find(|c| c.file_name == "first.flac").unwrap();
        assert_eq!(first.result.as_ref().unwrap().translation, "hello");
        assert!(first.error.is_none());
        let empty = clips.iter().find(|c| c.file_name == "empty.flac").unwrap();
        assert!(empty.result.is_none());
        assert!(empty.error.is_some());
        assert_eq!(speech.payloads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_upload_must_be_a_zip() {
        let speech = Arc::new(RecordingSpeech::default());
        let translator = translator(speech.clone());

        let err = translator
            .translate_audio_archive("clips.zip", b"fLaC not a zip".to_vec(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));

        let err = translator
            .translate_audio_archive("clip.flac", zip_of(&[("a.flac", b"x")]), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(speech.payloads.lock().unwrap().is_empty());
    }
}
