//! Environment / flag configuration and port wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use echoes_core::app::{PollPolicy, UploadOrchestrator};
use echoes_core::impls::{
    DEFAULT_BLOB_API_URL, DEFAULT_REPLICATE_API_URL, HttpBlobStore, InMemoryBlobStore,
    ReplicateClient, WebpNormalizer,
};
use echoes_core::ports::{BlobStore, PredictionClient, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Vercel Blob compatible REST storage.
    Http,
    /// Process-local store, lost on exit.
    Memory,
}

#[derive(Debug, Clone, Args)]
pub struct Config {
    #[arg(long, env = "REPLICATE_API_TOKEN", hide_env_values = true)]
    pub replicate_api_token: Option<String>,

    #[arg(long, env = "REPLICATE_API_URL", default_value = DEFAULT_REPLICATE_API_URL)]
    pub replicate_api_url: String,

    #[arg(long, env = "BLOB_READ_WRITE_TOKEN", hide_env_values = true)]
    pub blob_token: Option<String>,

    #[arg(long, env = "BLOB_API_URL", default_value = DEFAULT_BLOB_API_URL)]
    pub blob_api_url: String,

    #[arg(long, env = "ECHOES_STORE", value_enum, default_value_t = StoreKind::Http)]
    pub store: StoreKind,

    #[arg(
        long,
        env = "ECHOES_POLL_INTERVAL_MS",
        default_value_t = 500,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Give up on a prediction after this long. Unset waits indefinitely.
    #[arg(long, env = "ECHOES_MAX_WAIT_SECS")]
    pub max_wait_secs: Option<u64>,
}

impl Config {
    pub fn poll_policy(&self) -> PollPolicy {
        let policy = PollPolicy::default().with_interval(Duration::from_millis(self.poll_interval_ms));
        match self.max_wait_secs {
            Some(secs) => policy.with_max_wait(Duration::from_secs(secs)),
            None => policy,
        }
    }

    pub fn blob_store(&self) -> Result<Arc<dyn BlobStore>> {
        match self.store {
            StoreKind::Memory => Ok(Arc::new(InMemoryBlobStore::new())),
            StoreKind::Http => {
                let token = self.blob_token.clone().unwrap_or_default();
                let store = HttpBlobStore::with_base_url(&self.blob_api_url, token)
                    .context("BLOB_READ_WRITE_TOKEN is required with ECHOES_STORE=http")?;
                Ok(Arc::new(store))
            }
        }
    }

    pub fn prediction_client(&self) -> Result<Arc<dyn PredictionClient>> {
        let token = self.replicate_api_token.clone().unwrap_or_default();
        let client = ReplicateClient::with_base_url(&self.replicate_api_url, token)
            .context("REPLICATE_API_TOKEN is required to run the pipeline")?;
        Ok(Arc::new(client))
    }

    pub fn orchestrator(
        &self,
        store: Arc<dyn BlobStore>,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<UploadOrchestrator> {
        let orchestrator = UploadOrchestrator::builder()
            .store(store)
            .predictions(self.prediction_client()?)
            .normalizer(Arc::new(WebpNormalizer::new()))
            .progress(progress)
            .poll_policy(self.poll_policy())
            .build()?;
        Ok(orchestrator)
    }
}
