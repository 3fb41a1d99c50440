//! PredictionClient port - the asynchronous inference API.
//!
//! The client does not retry and does not poll. Polling is the orchestrator's
//! job (`app::poll`). A failing call here is an infrastructure error, which is
//! not the same thing as a job that finished with `status = failed`.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::{PredictionJob, PredictionSpec};

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("prediction api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("missing prediction api token")]
    MissingToken,
}

#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Submit a job. The returned job usually is `starting`.
    async fn create(&self, spec: &PredictionSpec) -> Result<PredictionJob, PredictionError>;

    /// Current state of a job.
    async fn get(&self, id: &str) -> Result<PredictionJob, PredictionError>;

    /// Ask the API to stop a job. Used when a poll budget runs out.
    async fn cancel(&self, id: &str) -> Result<(), PredictionError>;

    /// Fetch an output file the API produced.
    async fn download(&self, url: &str) -> Result<Bytes, PredictionError>;
}
