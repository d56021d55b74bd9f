//! Veo video generation through the Gemini API.
//!
//! `predictLongRunning` returns an operation name. The operation is fetched
//! until `done`, at which point it carries either an error or the URI of the
//! generated sample.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::AiClientConfig;
use crate::error::{AiError, AiResult};
use crate::http::{check_response, download_to_file};
use crate::types::{MediaRef, OperationHandle, OperationStatus, VideoGenerationApi};

pub const VEO_MODEL: &str = "veo-3.1-fast-generate-preview";

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: SampleVideo,
}

#[derive(Debug, Deserialize)]
struct SampleVideo {
    uri: String,
}

impl Operation {
    fn into_status(self) -> OperationStatus {
        if let Some(error) = self.error {
            return OperationStatus::Failed(match error.code {
                Some(code) => format!("{} (code {})", error.message, code),
                None => error.message,
            });
        }
        if !self.done {
            return OperationStatus::Pending;
        }

        let video = self.response.and_then(|r| r.generate_video_response);
        match video {
            Some(video) => match video.generated_samples.into_iter().next() {
                Some(sample) => OperationStatus::Done(MediaRef::new(sample.video.uri)),
                None if !video.rai_media_filtered_reasons.is_empty() => OperationStatus::Failed(
                    format!("video filtered: {}", video.rai_media_filtered_reasons.join("; ")),
                ),
                None => OperationStatus::Failed("operation finished without samples".to_string()),
            },
            None => OperationStatus::Failed("operation finished without a response".to_string()),
        }
    }
}

/// [`VideoGenerationApi`] backed by Veo.
pub struct VeoClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl VeoClient {
    pub fn new(config: &AiClientConfig) -> AiResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            base_url: config.gemini_base_url.clone(),
            api_key: config.require_gemini_key()?,
            model: VEO_MODEL.to_string(),
        })
    }
}

#[async_trait]
impl VideoGenerationApi for VeoClient {
    async fn submit(&self, prompt: &str) -> AiResult<OperationHandle> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url, self.model
        );
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({"instances": [{"prompt": prompt}]}))
            .send()
            .await?;
        let submitted: SubmitResponse = check_response(response).await?.json().await?;

        debug!(operation = %submitted.name, "Video generation submitted");
        Ok(OperationHandle::new(submitted.name))
    }

    async fn poll(&self, handle: &OperationHandle) -> AiResult<OperationStatus> {
        let url = format!("{}/v1beta/{}", self.base_url, handle.as_str());
        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let operation: Operation = check_response(response).await?.json().await?;
        Ok(operation.into_status())
    }

    async fn download(&self, media: &MediaRef, dest: &Path) -> AiResult<()> {
        if media.uri.is_empty() {
            return Err(AiError::invalid_response("empty video uri"));
        }
        let request = self
            .http
            .get(&media.uri)
            .header("x-goog-api-key", &self.api_key);
        download_to_file(request, dest).await?;
        Ok(())
    }
}
