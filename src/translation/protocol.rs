//! Wire types of the remote ASR + MT pipeline.
//!
//! Discovery resolves service ids and returns the compute endpoint together
//! with the credential header the compute call must carry. Field names
//! follow the remote API exactly.

use crate::utils::BackendFailure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Asr,
    Translation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePair {
    pub source_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

impl LanguagePair {
    pub fn source(source_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: None,
        }
    }

    pub fn pair(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: Some(target_language.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    pub pipeline_tasks: Vec<DiscoveryTask>,
    pub pipeline_request_config: PipelineRequestConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryTask {
    pub task_type: TaskType,
    pub config: DiscoveryTaskConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryTaskConfig {
    pub language: LanguagePair,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequestConfig {
    pub pipeline_id: String,
}

impl DiscoveryRequest {
    pub fn new(pipeline_id: &str, tasks: Vec<(TaskType, LanguagePair)>) -> Self {
        Self {
            pipeline_tasks: tasks
                .into_iter()
                .map(|(task_type, language)| DiscoveryTask {
                    task_type,
                    config: DiscoveryTaskConfig { language },
                })
                .collect(),
            pipeline_request_config: PipelineRequestConfig {
                pipeline_id: pipeline_id.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub pipeline_response_config: Vec<TaskServiceConfig>,
    #[serde(rename = "pipelineInferenceAPIEndPoint")]
    pub pipeline_inference_api_end_point: InferenceEndpoint,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskServiceConfig {
    #[serde(default)]
    pub config: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub service_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceEndpoint {
    pub callback_url: String,
    pub inference_api_key: InferenceApiKey,
}

/// Opaque credential: header name and value are both chosen by the remote.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceApiKey {
    pub name: String,
    pub value: String,
}

impl DiscoveryResponse {
    /// Service id resolved for the task at `task_index` of the request.
    pub fn service_id(&self, task_index: usize) -> Result<&str, BackendFailure> {
        self.pipeline_response_config
            .get(task_index)
            .and_then(|task| task.config.first())
            .map(|config| config.service_id.as_str())
            .ok_or_else(|| {
                BackendFailure::malformed(format!(
                    "Discovery response has no service id for task {}",
                    task_index
                ))
            })
    }

    pub fn endpoint(&self) -> &InferenceEndpoint {
        &self.pipeline_inference_api_end_point
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    pub pipeline_tasks: Vec<ComputeTask>,
    pub input_data: InputData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeTask {
    pub task_type: TaskType,
    pub config: ComputeTaskConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeTaskConfig {
    pub language: LanguagePair,
    pub service_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InputData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<TextInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Vec<AudioContent>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextInput {
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioContent {
    pub audio_content: String,
}

impl ComputeRequest {
    pub fn text_translation(language: LanguagePair, service_id: &str, text: &str) -> Self {
        Self {
            pipeline_tasks: vec![ComputeTask {
                task_type: TaskType::Translation,
                config: ComputeTaskConfig {
                    language,
                    service_id: service_id.to_string(),
                    audio_format: None,
                    sampling_rate: None,
                },
            }],
            input_data: InputData {
                input: Some(vec![TextInput {
                    source: text.to_string(),
                }]),
                audio: None,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResponse {
    #[serde(default)]
    pub pipeline_response: Vec<TaskOutput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutput {
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

impl ComputeResponse {
    /// `pipelineResponse[0].output[0].target`
    pub fn first_target(&self) -> Result<&str, BackendFailure> {
        self.pipeline_response
            .first()
            .and_then(|task| task.output.first())
            .and_then(|item| item.target.as_deref())
            .ok_or_else(|| BackendFailure::malformed("Compute response has no translated output"))
    }

    /// Target of the final task, i.e. the end of a chained pipeline.
    pub fn last_target(&self) -> Result<&str, BackendFailure> {
        self.pipeline_response
            .last()
            .and_then(|task| task.output.first())
            .and_then(|item| item.target.as_deref())
            .ok_or_else(|| BackendFailure::malformed("Compute response has no final output"))
    }

    /// ASR transcript, when the first task echoes it.
    pub fn first_source(&self) -> Option<&str> {
        self.pipeline_response
            .first()
            .and_then(|task| task.output.first())
            .and_then(|item| item.source.as_deref())
    }
}
