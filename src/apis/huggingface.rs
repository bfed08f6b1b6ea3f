use core::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Serialize;

use crate::storage::StoredUpload;

pub const PROVIDER: &str = "huggingface";

const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models";
const PROMPT_SUFFIX: &str = ", high quality, detailed";
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Models tried in order of availability, first success wins.
const DEFAULT_MODELS: [&str; 3] = [
    "runwayml/stable-diffusion-v1-5",
    "stabilityai/stable-diffusion-xl-base-1.0",
    "dreamlike-art/dreamlike-photoreal-2.0",
];

#[derive(Serialize)]
struct Payload<'a> {
    inputs: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EditResult {
    pub provider: &'static str,
    pub prompt: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum GenerationError {
    MissingApiKey,
    AllModelsFailed,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(formatter, "Hugging Face API key is not configured"),
            Self::AllModelsFailed => write!(formatter, "all Hugging Face models failed"),
        }
    }
}

pub struct HfClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    models: Vec<String>,
}

impl HfClient {
    pub fn new(http_client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.into(),
            models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Points the client at a different inference endpoint, e.g. a dedicated
    /// Hugging Face deployment.
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Runs the enhanced prompt through the configured models in order and
    /// returns the first generated image as a `data:` URL. Each model gets a
    /// single attempt, individual failures are only logged.
    pub async fn generate(
        &self,
        upload: &StoredUpload,
        prompt: &str,
    ) -> Result<EditResult, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::MissingApiKey);
        };

        let prompt = format!("{prompt}{PROMPT_SUFFIX}");
        log::debug!("generating from a {} byte upload", upload.len());

        for model in &self.models {
            log::info!("trying model {model}");
            match self.text_to_image(api_key, model, &prompt).await {
                Ok(image) => {
                    log::info!("generated with {model}");
                    let image_url = format!("data:image/jpeg;base64,{}", BASE64.encode(image));
                    return Ok(EditResult { provider: PROVIDER, prompt, image_url });
                }
                Err(err) => log::warn!("model {model} failed: {err}"),
            }
        }

        Err(GenerationError::AllModelsFailed)
    }

    async fn text_to_image(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> reqwest::Result<Bytes> {
        let response = self
            .http_client
            .post(format!("{}/{model}", self.endpoint))
            .bearer_auth(api_key)
            .timeout(ATTEMPT_TIMEOUT)
            .json(&Payload { inputs: prompt })
            .send()
            .await?
            .error_for_status()?;

        response.bytes().await
    }
}
