//! Replicate predictions.
//!
//! A prediction is created, then its `urls.get` endpoint is polled until the
//! status is terminal.

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::AiClientConfig;
use crate::error::{AiError, AiResult};
use crate::http::{check_response, download_to_file};

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    pub urls: PredictionUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionUrls {
    pub get: String,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }
}

/// Minimal Replicate API client.
pub struct ReplicateClient {
    http: Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl ReplicateClient {
    pub fn new(config: &AiClientConfig) -> AiResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            base_url: config.replicate_base_url.clone(),
            token: config.require_replicate_token()?,
            poll_interval: config.replicate_poll_interval,
            timeout: config.replicate_timeout,
        })
    }

    /// Run a model to completion and return its output.
    ///
    /// `model` is `owner/name` for official models or `owner/name:version`
    /// for a pinned version.
    pub async fn run(&self, model: &str, input: Value) -> AiResult<Value> {
        let created = self.create(model, input).await?;
        info!(model = %model, prediction = %created.id, "Replicate prediction created");

        let finished = self.wait(created).await?;
        match finished.status.as_str() {
            "succeeded" => finished
                .output
                .ok_or_else(|| AiError::invalid_response("prediction succeeded without output")),
            status => Err(AiError::generation_failed(format!(
                "prediction {} {}: {}",
                finished.id,
                status,
                finished
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no error reported".to_string())
            ))),
        }
    }

    async fn create(&self, model: &str, input: Value) -> AiResult<Prediction> {
        let (url, body) = match model.split_once(':') {
            Some((_, version)) => (
                format!("{}/v1/predictions", self.base_url),
                json!({"version": version, "input": input}),
            ),
            None => (
                format!("{}/v1/models/{}/predictions", self.base_url, model),
                json!({"input": input}),
            ),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    async fn wait(&self, mut prediction: Prediction) -> AiResult<Prediction> {
        let started = Instant::now();
        while !prediction.is_terminal() {
            if started.elapsed() > self.timeout {
                return Err(AiError::timeout(format!(
                    "prediction {} still {} after {:?}",
                    prediction.id, prediction.status, self.timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .http
                .get(&prediction.urls.get)
                .bearer_auth(&self.token)
                .send()
                .await?;
            prediction = check_response(response).await?.json().await?;
            debug!(prediction = %prediction.id, status = %prediction.status, "Polled prediction");
        }
        Ok(prediction)
    }

    /// Download a prediction output file.
    pub async fn download(&self, url: &str, dest: &Path) -> AiResult<u64> {
        download_to_file(self.http.get(url), dest).await
    }
}

/// First URL in a prediction output (a string or a list of strings).
pub fn output_url(output: &Value) -> AiResult<String> {
    match output {
        Value::String(url) => Ok(url.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| AiError::invalid_response("prediction output list has no URL")),
        other => Err(AiError::invalid_response(format!(
            "unexpected prediction output: {}",
            other
        ))),
    }
}
