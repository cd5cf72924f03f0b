use crate::translation::protocol::{
    AudioContent, ComputeRequest, ComputeResponse, ComputeTask, ComputeTaskConfig,
    DiscoveryRequest, DiscoveryResponse, InferenceEndpoint, InputData, LanguagePair, TaskType,
};
use crate::utils::{BackendConfig, BackendFailure, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Remote text translation, one call per chunk.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(
        &self,
        source_language: &str,
        text: &str,
    ) -> std::result::Result<String, BackendFailure>;
}

/// Speech recognition followed by translation, one call per clip.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn transcribe_and_translate(
        &self,
        source_language: &str,
        audio: &AudioPayload,
    ) -> std::result::Result<Transcription, BackendFailure>;
}

/// Base64 audio already normalized for the ASR task.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub content_base64: String,
    pub format: String,
    pub sampling_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcription {
    pub transcript: Option<String>,
    pub translation: String,
}

/// HTTP client for the discovery + compute pipeline API.
pub struct PipelineClient {
    client: Client,
    config: BackendConfig,
}

impl PipelineClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn target_language(&self) -> &str {
        &self.config.target_language
    }

    pub async fn discover(
        &self,
        tasks: Vec<(TaskType, LanguagePair)>,
    ) -> std::result::Result<DiscoveryResponse, BackendFailure> {
        let request = DiscoveryRequest::new(&self.config.pipeline_id, tasks);

        let builder = self
            .client
            .post(&self.config.discovery_url)
            .header("userID", &self.config.user_id)
            .header("ulcaApiKey", &self.config.api_key)
            .json(&request);

        send_json(builder, "Discovery request").await
    }

    pub async fn compute(
        &self,
        endpoint: &InferenceEndpoint,
        request: &ComputeRequest,
    ) -> std::result::Result<ComputeResponse, BackendFailure> {
        let key = &endpoint.inference_api_key;
        let builder = self
            .client
            .post(&endpoint.callback_url)
            .header(key.name.as_str(), key.value.as_str())
            .json(request);

        send_json(builder, "Compute request").await
    }
}

#[async_trait]
impl TranslationBackend for PipelineClient {
    async fn translate(
        &self,
        source_language: &str,
        text: &str,
    ) -> std::result::Result<String, BackendFailure> {
        let pair = LanguagePair::pair(source_language, &self.config.target_language);

        let discovery = self
            .discover(vec![(TaskType::Translation, pair.clone())])
            .await?;
        let service_id = discovery.service_id(0)?;

        let request = ComputeRequest::text_translation(pair, service_id, text);
        let response = self.compute(discovery.endpoint(), &request).await?;

        Ok(response.first_target()?.to_string())
    }
}

#[async_trait]
impl SpeechBackend for PipelineClient {
    /// ASR followed by translation in a single compute call.
    async fn transcribe_and_translate(
        &self,
        source_language: &str,
        audio: &AudioPayload,
    ) -> std::result::Result<Transcription, BackendFailure> {
        let translation_pair = LanguagePair::pair(source_language, &self.config.target_language);
        let discovery = self
            .discover(vec![
                (TaskType::Asr, LanguagePair::source(source_language)),
                (TaskType::Translation, translation_pair.clone()),
            ])
            .await?;

        let asr_service = discovery.service_id(0)?;
        let translation_service = discovery.service_id(1)?;

        let request = ComputeRequest {
            pipeline_tasks: vec![
                ComputeTask {
                    task_type: TaskType::Asr,
                    config: ComputeTaskConfig {
                        language: LanguagePair::source(source_language),
                        service_id: asr_service.to_string(),
                        audio_format: Some(audio.format.clone()),
                        sampling_rate: Some(audio.sampling_rate),
                    },
                },
                ComputeTask {
                    task_type: TaskType::Translation,
                    config: ComputeTaskConfig {
                        language: translation_pair,
                        service_id: translation_service.to_string(),
                        audio_format: None,
                        sampling_rate: None,
                    },
                },
            ],
            input_data: InputData {
                input: None,
                audio: Some(vec![AudioContent {
                    audio_content: audio.content_base64.clone(),
                }]),
            },
        };

        let response = self.compute(discovery.endpoint(), &request).await?;
        let transcription = Transcription {
            transcript: response.first_source().map(str::to_string),
            translation: response.last_target()?.to_string(),
        };

        info!(source_language = %source_language, "Transcription and translation successful");
        Ok(transcription)
    }
}

async fn send_json<T: DeserializeOwned>(
    builder: reqwest::RequestBuilder,
    what: &str,
) -> std::result::Result<T, BackendFailure> {
    let response = builder.send().await.map_err(|e| {
        warn!(error = %e, "{} could not be sent", what);
        if e.is_builder() {
            BackendFailure::malformed(format!("{} could not be built: {}", what, e))
        } else {
            BackendFailure::unreachable(format!("{} failed: {}", what, e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "{} returned an error status", what);
        return Err(BackendFailure::new(
            status.as_u16(),
            format!("{} returned {}: {}", what, status, body),
        ));
    }

    response.json::<T>().await.map_err(|e| {
        warn!(error = %e, "{} returned an unexpected body", what);
        BackendFailure::malformed(format!("{} returned an unexpected body: {}", what, e))
    })
}
