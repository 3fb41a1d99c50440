//! OrchestratorBuilder - UploadOrchestrator の構築とワイヤリング
//!
//! # 起動時検証（Fail-fast 設計）
//! - blob store / prediction client / normalizer は必須
//! - speaker 集合は空であってはならない
//! - それ以外はデフォルト値を持つ

use std::sync::Arc;

use super::orchestrator::UploadOrchestrator;
use super::poll::PollPolicy;
use super::stages::{StageModels, default_speakers};
use crate::impls::NoopProgressSink;
use crate::ports::{
    BlobStore, FolderKeyGenerator, ImageNormalizer, MonotonicFolderKeys, PredictionClient,
    ProgressSink, SystemClock,
};

/// BuildError はオーケストレーター構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Missing port: {0}. It must be set before build().")]
    MissingPort(&'static str),

    #[error("No speakers configured. The speech stage needs at least one voice sample.")]
    NoSpeakers,
}

/// # 使用例
/// ```ignore
/// let orchestrator = UploadOrchestrator::builder()
///     .store(Arc::new(InMemoryBlobStore::new()))
///     .predictions(Arc::new(ReplicateClient::new(token)?))
///     .normalizer(Arc::new(WebpNormalizer::new()))
///     .build()?;
/// ```
#[derive(Default)]
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn BlobStore>>,
    predictions: Option<Arc<dyn PredictionClient>>,
    normalizer: Option<Arc<dyn ImageNormalizer>>,
    keys: Option<Arc<dyn FolderKeyGenerator>>,
    progress: Option<Arc<dyn ProgressSink>>,
    poll: PollPolicy,
    models: StageModels,
    speakers: Option<Vec<String>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn predictions(mut self, predictions: Arc<dyn PredictionClient>) -> Self {
        self.predictions = Some(predictions);
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn ImageNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// デフォルト: SystemClock ベースの MonotonicFolderKeys
    pub fn keys(mut self, keys: Arc<dyn FolderKeyGenerator>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// デフォルト: NoopProgressSink
    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn models(mut self, models: StageModels) -> Self {
        self.models = models;
        self
    }

    pub fn speakers(mut self, speakers: Vec<String>) -> Self {
        self.speakers = Some(speakers);
        self
    }

    pub fn build(self) -> Result<UploadOrchestrator, BuildError> {
        let store = self.store.ok_or(BuildError::MissingPort("blob store"))?;
        let predictions = self
            .predictions
            .ok_or(BuildError::MissingPort("prediction client"))?;
        let normalizer = self
            .normalizer
            .ok_or(BuildError::MissingPort("image normalizer"))?;

        let speakers = self.speakers.unwrap_or_else(default_speakers);
        if speakers.iter().all(|s| s.trim().is_empty()) {
            return Err(BuildError::NoSpeakers);
        }
        let speakers = speakers
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();

        Ok(UploadOrchestrator {
            store,
            predictions,
            normalizer,
            keys: self
                .keys
                .unwrap_or_else(|| Arc::new(MonotonicFolderKeys::new(SystemClock))),
            progress: self.progress.unwrap_or_else(|| Arc::new(NoopProgressSink)),
            poll: self.poll,
            models: self.models,
            speakers,
        })
    }
}
