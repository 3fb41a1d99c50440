//! UploadOrchestrator - 1 件の upload を 4 stage で処理する
//!
//! # フロー
//! 1. **Ingest**: MIME 検証 -> WebP 正規化 -> folder key 発行 -> originalImage.webp
//! 2. **Caption**: caption job -> poll -> description.txt
//! 3. **Image**: image job -> poll -> download -> generated_image.webp
//! 4. **Speech**: speech job -> poll -> download -> generatedAudio.wav
//!
//! # 失敗時
//! - Ingest の失敗は何も書いていないので cleanup しない
//! - Caption 以降の失敗は folder を cleanup してからエラーを返す
//! - cleanup の失敗はエラーを置き換えない（CleanupReport に残る）
//!
//! # Progress
//! 各 stage の開始と完了で 1 件ずつ。失敗した run は `Failed` で終わる
//! （MIME / 空 upload の拒否は event なし）

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rand::seq::SliceRandom;

use super::builder::OrchestratorBuilder;
use super::cleanup::cleanup_folder;
use super::poll::{PollError, PollPolicy, poll_until_terminal};
use super::stages::{StageModels, caption_text, first_output_url};
use crate::domain::{
    ArtifactKind, BlobRef, CleanupReport, Contribution, ContributionStatus, FolderKey,
    InfrastructureError, OrchestrationError, PredictionJob, PredictionSpec, PredictionStatus,
    ProgressEvent, SourceImageType, Stage, visitor_message,
};
use crate::ports::{
    BlobStore, FolderKeyGenerator, ImageNormalizer, NormalizeError, PredictionClient,
    ProgressSink,
};

/// A failure after the original image was written. Becomes an
/// `OrchestrationError` once the folder has been cleaned up.
#[derive(Debug)]
enum StageFailure {
    Infrastructure {
        stage: Stage,
        source: InfrastructureError,
    },
    Generation {
        stage: Stage,
        reason: String,
    },
    TimedOut {
        stage: Stage,
        waited: Duration,
    },
}

impl StageFailure {
    fn infrastructure(stage: Stage, source: impl Into<InfrastructureError>) -> Self {
        StageFailure::Infrastructure {
            stage,
            source: source.into(),
        }
    }

    fn generation(stage: Stage, reason: impl Into<String>) -> Self {
        StageFailure::Generation {
            stage,
            reason: reason.into(),
        }
    }

    fn into_error(self, cleanup: CleanupReport) -> OrchestrationError {
        match self {
            StageFailure::Infrastructure { stage, source } => OrchestrationError::Infrastructure {
                stage,
                source,
                cleanup: Some(cleanup),
            },
            StageFailure::Generation { stage, reason } => OrchestrationError::GenerationFailed {
                stage,
                reason,
                cleanup,
            },
            StageFailure::TimedOut { stage, waited } => OrchestrationError::TimedOut {
                stage,
                waited,
                cleanup,
            },
        }
    }
}

pub struct UploadOrchestrator {
    pub(super) store: Arc<dyn BlobStore>,
    pub(super) predictions: Arc<dyn PredictionClient>,
    pub(super) normalizer: Arc<dyn ImageNormalizer>,
    pub(super) keys: Arc<dyn FolderKeyGenerator>,
    pub(super) progress: Arc<dyn ProgressSink>,
    pub(super) poll: PollPolicy,
    pub(super) models: StageModels,
    pub(super) speakers: Vec<String>,
}

impl UploadOrchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Process one upload, reporting progress to the configured sink.
    pub async fn run(&self, image: Bytes, mime: &str) -> Result<Contribution, OrchestrationError> {
        let progress = Arc::clone(&self.progress);
        self.run_with_progress(image, mime, progress.as_ref()).await
    }

    /// Process one upload, reporting progress to `progress` instead.
    pub async fn run_with_progress(
        &self,
        image: Bytes,
        mime: &str,
        progress: &dyn ProgressSink,
    ) -> Result<Contribution, OrchestrationError> {
        // Rejected before any event is emitted.
        let source = accept(&image, mime)?;

        let result = match self.ingest(image, source, progress).await {
            Ok((folder_key, original)) => self.finish(folder_key, original, progress).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            let stage = err.stage().unwrap_or(Stage::Ingest);
            emit(
                progress,
                stage,
                ContributionStatus::Failed,
                started_percent(stage),
                &visitor_message(err),
            );
        }
        result
    }

    /// Generation stages, then cleanup of the folder if any of them failed.
    async fn finish(
        &self,
        folder_key: FolderKey,
        original: BlobRef,
        progress: &dyn ProgressSink,
    ) -> Result<Contribution, OrchestrationError> {
        match self.generate(folder_key, original, progress).await {
            Ok(contribution) => {
                tracing::info!(%folder_key, speaker = %contribution.speaker, "contribution complete");
                Ok(contribution)
            }
            Err(failure) => {
                let cleanup = cleanup_folder(self.store.as_ref(), folder_key).await;
                if !cleanup.is_complete() {
                    tracing::warn!(
                        %folder_key,
                        failed = ?cleanup.failed_keys().collect::<Vec<_>>(),
                        listing_error = ?cleanup.listing_error,
                        "cleanup incomplete, folder may still hold artifacts"
                    );
                }
                let err = failure.into_error(cleanup);
                tracing::error!(%folder_key, stage = ?err.stage(), error = %err, "contribution failed");
                Err(err)
            }
        }
    }

    async fn ingest(
        &self,
        image: Bytes,
        source: SourceImageType,
        progress: &dyn ProgressSink,
    ) -> Result<(FolderKey, BlobRef), OrchestrationError> {
        started(progress, Stage::Ingest, "Uploading...");

        let normalized = self.normalize(image, source).await?;
        let folder_key = self.keys.next_key();
        tracing::info!(%folder_key, stage = %Stage::Ingest, bytes = normalized.len(), "storing original image");

        let kind = ArtifactKind::OriginalImage;
        let original = self
            .store
            .put(&kind.key(folder_key), normalized, kind.content_type())
            .await
            .map_err(|err| OrchestrationError::Infrastructure {
                stage: Stage::Ingest,
                source: err.into(),
                cleanup: None,
            })?;

        finished(progress, Stage::Ingest, "Image correctly uploaded!");
        Ok((folder_key, original))
    }

    async fn normalize(
        &self,
        image: Bytes,
        source: SourceImageType,
    ) -> Result<Bytes, OrchestrationError> {
        let normalizer = Arc::clone(&self.normalizer);
        let result = tokio::task::spawn_blocking(move || normalizer.normalize(&image, source))
            .await
            .unwrap_or_else(|join| Err(NormalizeError::Worker(join.to_string())));
        match result {
            Ok(bytes) => Ok(bytes),
            Err(NormalizeError::Decode(reason)) => Err(OrchestrationError::InvalidInput(
                format!("unreadable {} image: {reason}", source.mime()),
            )),
            Err(err) => Err(OrchestrationError::Infrastructure {
                stage: Stage::Ingest,
                source: err.into(),
                cleanup: None,
            }),
        }
    }

    async fn generate(
        &self,
        folder_key: FolderKey,
        original_image: BlobRef,
        progress: &dyn ProgressSink,
    ) -> Result<Contribution, StageFailure> {
        // Caption
        started(progress, Stage::Caption, "Generating description...");
        let job = self
            .predict(folder_key, Stage::Caption, self.models.caption_spec(&original_image.url))
            .await?;
        let description = job
            .output
            .as_ref()
            .and_then(caption_text)
            .ok_or_else(|| StageFailure::generation(Stage::Caption, "caption output was empty"))?;
        let description_blob = self
            .persist(
                Stage::Caption,
                folder_key,
                ArtifactKind::Description,
                Bytes::from(description.clone()),
            )
            .await?;
        finished(progress, Stage::Caption, "Description generated correctly!");

        // Image
        started(progress, Stage::Image, "Generating image...");
        let job = self
            .predict(folder_key, Stage::Image, self.models.image_spec(&description))
            .await?;
        let generated_image = self
            .persist_output(Stage::Image, folder_key, ArtifactKind::GeneratedImage, &job)
            .await?;
        finished(progress, Stage::Image, "Image generated correctly!");

        // Speech
        started(progress, Stage::Speech, "Generating audio...");
        let speaker = self
            .speakers
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| StageFailure::generation(Stage::Speech, "no speaker configured"))?;
        let job = self
            .predict(
                folder_key,
                Stage::Speech,
                self.models.speech_spec(&description, &speaker),
            )
            .await?;
        let generated_audio = self
            .persist_output(Stage::Speech, folder_key, ArtifactKind::GeneratedAudio, &job)
            .await?;
        finished(progress, Stage::Speech, "Audio generated correctly!");

        Ok(Contribution {
            folder_key,
            original_image,
            description,
            description_blob,
            generated_image,
            generated_audio,
            speaker,
        })
    }

    /// Create a job and wait for it. Only a `succeeded` job is returned.
    async fn predict(
        &self,
        folder_key: FolderKey,
        stage: Stage,
        spec: PredictionSpec,
    ) -> Result<PredictionJob, StageFailure> {
        let created = self
            .predictions
            .create(&spec)
            .await
            .map_err(|err| StageFailure::infrastructure(stage, err))?;
        let job_id = created.id.clone();
        tracing::info!(%folder_key, %stage, job_id = %job_id, model = %spec.model, "prediction started");

        let job = if created.status.is_terminal() {
            created
        } else {
            match poll_until_terminal(self.predictions.as_ref(), &job_id, &self.poll).await {
                Ok(job) => job,
                Err(PollError::Status { source, .. }) => {
                    return Err(StageFailure::infrastructure(stage, source));
                }
                Err(PollError::TimedOut { waited, .. }) => {
                    if let Err(err) = self.predictions.cancel(&job_id).await {
                        tracing::warn!(%folder_key, %stage, job_id = %job_id, error = %err, "cancel after timeout failed");
                    }
                    return Err(StageFailure::TimedOut { stage, waited });
                }
            }
        };

        match job.status {
            PredictionStatus::Succeeded => {
                tracing::info!(%folder_key, %stage, job_id = %job_id, "prediction succeeded");
                Ok(job)
            }
            status => {
                let reason = job
                    .error
                    .unwrap_or_else(|| format!("prediction ended {status}"));
                Err(StageFailure::Generation { stage, reason })
            }
        }
    }

    /// Download the job's first output file and store it as `kind`.
    async fn persist_output(
        &self,
        stage: Stage,
        folder_key: FolderKey,
        kind: ArtifactKind,
        job: &PredictionJob,
    ) -> Result<BlobRef, StageFailure> {
        let url = job
            .output
            .as_ref()
            .and_then(first_output_url)
            .ok_or_else(|| StageFailure::generation(stage, format!("{stage} output had no file url")))?;
        let bytes = self
            .predictions
            .download(url)
            .await
            .map_err(|err| StageFailure::infrastructure(stage, err))?;
        self.persist(stage, folder_key, kind, bytes).await
    }

    async fn persist(
        &self,
        stage: Stage,
        folder_key: FolderKey,
        kind: ArtifactKind,
        bytes: Bytes,
    ) -> Result<BlobRef, StageFailure> {
        self.store
            .put(&kind.key(folder_key), bytes, kind.content_type())
            .await
            .map_err(|err| StageFailure::infrastructure(stage, err))
    }
}

fn accept(image: &Bytes, mime: &str) -> Result<SourceImageType, OrchestrationError> {
    let source = SourceImageType::from_mime(mime).ok_or_else(|| {
        OrchestrationError::InvalidInput(format!("unsupported image type {mime:?}"))
    })?;
    if image.is_empty() {
        return Err(OrchestrationError::InvalidInput("empty upload".into()));
    }
    Ok(source)
}

/// Bar position when `stage` starts. Each stage advances it by 20.
fn started_percent(stage: Stage) -> u8 {
    match stage {
        Stage::Ingest => 20,
        Stage::Caption => 40,
        Stage::Image => 60,
        Stage::Speech => 80,
    }
}

fn started(progress: &dyn ProgressSink, stage: Stage, message: &str) {
    emit(progress, stage, stage.running_status(), started_percent(stage), message);
}

/// The speech stage is the last one, so finishing it completes the run.
fn finished(progress: &dyn ProgressSink, stage: Stage, message: &str) {
    let status = match stage {
        Stage::Speech => ContributionStatus::Complete,
        other => other.running_status(),
    };
    emit(progress, stage, status, started_percent(stage) + 20, message);
}

fn emit(
    progress: &dyn ProgressSink,
    stage: Stage,
    status: ContributionStatus,
    percent: u8,
    message: &str,
) {
    progress.emit(ProgressEvent::new(stage, status, percent, message));
}
