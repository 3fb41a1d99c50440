//! ReplicateClient - PredictionClient over the Replicate HTTP API
//!
//! # Endpoints
//! - pinned version: `POST {base}/predictions` with `{"version", "input"}`
//! - latest model: `POST {base}/models/{owner}/{name}/predictions` with `{"input"}`
//! - `GET {base}/predictions/{id}`
//! - `POST {base}/predictions/{id}/cancel`
//!
//! Output files are plain URLs and are fetched without the API token.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::domain::{ModelRef, PredictionJob, PredictionSpec};
use crate::ports::{PredictionClient, PredictionError};

pub const DEFAULT_REPLICATE_API_URL: &str = "https://api.replicate.com/v1";
const USER_AGENT: &str = concat!("echoes/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: &'a serde_json::Value,
}

pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ReplicateClient {
    pub fn new(token: impl Into<String>) -> Result<Self, PredictionError> {
        Self::with_base_url(DEFAULT_REPLICATE_API_URL, token)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, PredictionError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(PredictionError::MissingToken);
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| PredictionError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn create_url(&self, model: &ModelRef) -> String {
        match model {
            ModelRef::Version { .. } => format!("{}/predictions", self.base_url),
            ModelRef::Model { owner, name } => {
                format!("{}/models/{owner}/{name}/predictions", self.base_url)
            }
        }
    }

    async fn read_job(response: reqwest::Response) -> Result<PredictionJob, PredictionError> {
        let response = check(response).await?;
        response
            .json::<PredictionJob>()
            .await
            .map_err(|e| PredictionError::Decode(e.to_string()))
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, PredictionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PredictionError::Status {
        status: status.as_u16(),
        body,
    })
}

fn transport(err: reqwest::Error) -> PredictionError {
    PredictionError::Transport(err.to_string())
}

#[async_trait]
impl PredictionClient for ReplicateClient {
    async fn create(&self, spec: &PredictionSpec) -> Result<PredictionJob, PredictionError> {
        let body = CreateRequest {
            version: match &spec.model {
                ModelRef::Version { id } => Some(id.as_str()),
                ModelRef::Model { .. } => None,
            },
            input: &spec.input,
        };
        let response = self
            .http
            .post(self.create_url(&spec.model))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let job = Self::read_job(response).await?;
        tracing::debug!(job_id = %job.id, model = %spec.model, status = %job.status, "prediction created");
        Ok(job)
    }

    async fn get(&self, id: &str) -> Result<PredictionJob, PredictionError> {
        let response = self
            .http
            .get(format!("{}/predictions/{id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        Self::read_job(response).await
    }

    async fn cancel(&self, id: &str) -> Result<(), PredictionError> {
        let response = self
            .http
            .post(format!("{}/predictions/{id}/cancel", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Bytes, PredictionError> {
        let response = self.http.get(url).send().await.map_err(transport)?;
        check(response).await?.bytes().await.map_err(transport)
    }
}
