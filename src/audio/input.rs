use crate::utils::{PipelineError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use tracing::debug;

/// Audio as the caller hands it over.
#[derive(Debug, Clone)]
pub enum AudioInput {
    Url(String),
    Base64(String),
    Stream(Vec<u8>),
}

impl AudioInput {
    /// Raw audio bytes, fetched or decoded as needed.
    pub async fn resolve(&self, http: &Client) -> Result<Vec<u8>> {
        let bytes = match self {
            AudioInput::Url(url) => {
                debug!(url = %url, "Fetching audio");
                let response = http.get(url).send().await?.error_for_status()?;
                response.bytes().await?.to_vec()
            }
            AudioInput::Base64(encoded) => STANDARD
                .decode(encoded.trim())
                .map_err(|e| PipelineError::InvalidInput(format!("invalid base64 audio: {}", e)))?,
            AudioInput::Stream(bytes) => bytes.clone(),
        };

        if bytes.is_empty() {
            return Err(PipelineError::InvalidInput("audio input is empty".to_string()));
        }
        Ok(bytes)
    }
}
