//! Errors - orchestration error taxonomy.
//!
//! # 分類
//! - `InvalidInput`: rejected before anything was written (no cleanup)
//! - `Infrastructure`: storage / inference transport failure
//! - `GenerationFailed`: a job reached a non-success terminal state, or
//!   succeeded with output we cannot use
//! - `TimedOut`: a job outlived the configured poll budget
//!
//! A failed cleanup delete is not an error variant. It shows up as an
//! incomplete [`CleanupReport`] attached to the stage error.

use std::time::Duration;

use thiserror::Error;

use super::cleanup::CleanupReport;
use super::events::Stage;
use crate::ports::{BlobError, NormalizeError, PredictionError};

/// Coarse classification, used for status codes and UI copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The visitor's input was refused. Retrying the same input is pointless.
    Rejected,
    /// A collaborator (store, inference API) failed.
    Infrastructure,
    /// The inference job itself did not produce a usable result.
    Generation,
}

/// Transport-level failure of one of the collaborators.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("blob store: {0}")]
    Storage(#[from] BlobError),

    #[error("prediction api: {0}")]
    Prediction(#[from] PredictionError),

    #[error("image processing: {0}")]
    Image(#[from] NormalizeError),
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{stage} stage failed on infrastructure: {source}")]
    Infrastructure {
        stage: Stage,
        #[source]
        source: InfrastructureError,
        /// `None` when the failure happened before anything was written.
        cleanup: Option<CleanupReport>,
    },

    #[error("{stage} generation failed: {reason}")]
    GenerationFailed {
        stage: Stage,
        reason: String,
        cleanup: CleanupReport,
    },

    #[error("{stage} prediction did not finish within {waited:?}")]
    TimedOut {
        stage: Stage,
        waited: Duration,
        cleanup: CleanupReport,
    },
}

impl OrchestrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestrationError::InvalidInput(_) => ErrorKind::Rejected,
            OrchestrationError::Infrastructure { .. } => ErrorKind::Infrastructure,
            OrchestrationError::GenerationFailed { .. } | OrchestrationError::TimedOut { .. } => {
                ErrorKind::Generation
            }
        }
    }

    /// Stage the run stopped in. `None` for input rejection.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            OrchestrationError::InvalidInput(_) => None,
            OrchestrationError::Infrastructure { stage, .. }
            | OrchestrationError::GenerationFailed { stage, .. }
            | OrchestrationError::TimedOut { stage, .. } => Some(*stage),
        }
    }

    pub fn cleanup(&self) -> Option<&CleanupReport> {
        match self {
            OrchestrationError::InvalidInput(_) => None,
            OrchestrationError::Infrastructure { cleanup, .. } => cleanup.as_ref(),
            OrchestrationError::GenerationFailed { cleanup, .. }
            | OrchestrationError::TimedOut { cleanup, .. } => Some(cleanup),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FolderKey;

    #[test]
    fn accessors_follow_variant() {
        let cleanup = CleanupReport::new(FolderKey::from_millis(7));
        let err = OrchestrationError::GenerationFailed {
            stage: Stage::Caption,
            reason: "job failed".into(),
            cleanup: cleanup.clone(),
        };
        assert_eq!(err.kind(), ErrorKind::Generation);
        assert_eq!(err.stage(), Some(Stage::Caption));
        assert_eq!(err.cleanup(), Some(&cleanup));
        assert_eq!(err.to_string(), "caption generation failed: job failed");

        let err = OrchestrationError::InvalidInput("image/webp".into());
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.stage(), None);
        assert!(err.cleanup().is_none());
    }

    #[test]
    fn infrastructure_error_keeps_its_source() {
        let err = OrchestrationError::Infrastructure {
            stage: Stage::Ingest,
            source: BlobError::Transport("connection reset".into()).into(),
            cleanup: None,
        };
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("connection reset"));
    }
}
