//! State - kiosk upload screen as an explicit state machine.
//!
//! # 状態遷移
//! - idle -> uploading (visitor submits a photo)
//! - uploading -> uploading (progress event, percent never goes backwards)
//! - uploading -> succeeded | failed
//! - succeeded | failed -> idle (reset for the next visitor)
//!
//! Transitions are pure: they take the current state by value and return the
//! next one. A transition that does not apply returns the state unchanged.

use serde::{Deserialize, Serialize};

use super::contribution::Contribution;
use super::errors::OrchestrationError;
use super::events::{ProgressEvent, Stage};
use super::ids::FolderKey;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    Uploading { percent: u8, message: String },
    Succeeded { folder_key: FolderKey },
    Failed { message: String },
}

impl UploadState {
    /// Submitting is allowed from idle, or to retry after a failure.
    pub fn start(self) -> Self {
        match self {
            UploadState::Idle | UploadState::Failed { .. } => UploadState::Uploading {
                percent: 0,
                message: "Uploading...".to_string(),
            },
            other => other,
        }
    }

    pub fn on_progress(self, event: &ProgressEvent) -> Self {
        match self {
            UploadState::Uploading { percent, .. } => UploadState::Uploading {
                percent: percent.max(event.percent),
                message: event.message.clone(),
            },
            other => other,
        }
    }

    pub fn on_complete(self, contribution: &Contribution) -> Self {
        match self {
            UploadState::Uploading { .. } => UploadState::Succeeded {
                folder_key: contribution.folder_key,
            },
            other => other,
        }
    }

    pub fn on_error(self, error: &OrchestrationError) -> Self {
        match self {
            UploadState::Uploading { .. } => UploadState::Failed {
                message: visitor_message(error),
            },
            other => other,
        }
    }

    /// Back to the form. An in-flight upload cannot be reset.
    pub fn reset(self) -> Self {
        match self {
            UploadState::Uploading { .. } => self,
            _ => UploadState::Idle,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, UploadState::Uploading { .. })
    }
}

/// Copy shown to the visitor for a failed run.
pub fn visitor_message(error: &OrchestrationError) -> String {
    match error {
        OrchestrationError::InvalidInput(_) => {
            "The system supports only image uploads: jpg, png, gif".to_string()
        }
        OrchestrationError::Infrastructure {
            stage: Stage::Ingest,
            ..
        } => "Upload failed. Please try again.".to_string(),
        OrchestrationError::Infrastructure { stage, .. } => {
            format!("{} failed. Please try again.", stage_label(*stage))
        }
        OrchestrationError::GenerationFailed { stage, .. }
        | OrchestrationError::TimedOut { stage, .. } => format!(
            "{} failed, please wait a few minutes before trying again.",
            stage_label(*stage)
        ),
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Ingest => "Upload",
        Stage::Caption => "Description generation",
        Stage::Image => "Image generation",
        Stage::Speech => "Audio generation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlobRef, CleanupReport, ContributionStatus};

    fn blob(name: &str) -> BlobRef {
        BlobRef {
            key: format!("generated/5/{name}"),
            url: format!("memory://generated/5/{name}"),
        }
    }

    fn contribution() -> Contribution {
        Contribution {
            folder_key: FolderKey::from_millis(5),
            original_image: blob("originalImage.webp"),
            description: "a red door".into(),
            description_blob: blob("description.txt"),
            generated_image: blob("generated_image.webp"),
            generated_audio: blob("generatedAudio.wav"),
            speaker: "voice.wav".into(),
        }
    }

    fn progress(percent: u8, message: &str) -> ProgressEvent {
        ProgressEvent::new(Stage::Caption, ContributionStatus::Captioning, percent, message)
    }

    #[test]
    fn happy_path() {
        let state = UploadState::Idle.start();
        assert!(state.is_busy());

        let state = state.on_progress(&progress(40, "Image correctly uploaded!"));
        assert_eq!(
            state,
            UploadState::Uploading {
                percent: 40,
                message: "Image correctly uploaded!".into()
            }
        );

        let state = state.on_complete(&contribution());
        assert_eq!(
            state,
            UploadState::Succeeded {
                folder_key: FolderKey::from_millis(5)
            }
        );
        assert_eq!(state.reset(), UploadState::Idle);
    }

    #[test]
    fn percent_never_goes_backwards() {
        let state = UploadState::Idle
            .start()
            .on_progress(&progress(60, "later"))
            .on_progress(&progress(40, "stale"));
        assert!(matches!(state, UploadState::Uploading { percent: 60, .. }));
    }

    #[test]
    fn failure_then_retry() {
        let err = OrchestrationError::GenerationFailed {
            stage: Stage::Caption,
            reason: "failed".into(),
            cleanup: CleanupReport::new(FolderKey::from_millis(5)),
        };
        let state = UploadState::Idle.start().on_error(&err);
        assert_eq!(
            state,
            UploadState::Failed {
                message: "Description generation failed, please wait a few minutes before trying again."
                    .into()
            }
        );
        assert!(state.start().is_busy());
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        assert_eq!(
            UploadState::Idle.on_progress(&progress(40, "x")),
            UploadState::Idle
        );
        assert_eq!(UploadState::Idle.on_complete(&contribution()), UploadState::Idle);

        let uploading = UploadState::Idle.start();
        assert_eq!(uploading.clone().start(), uploading);
        assert_eq!(uploading.clone().reset(), uploading);

        let done = UploadState::Succeeded {
            folder_key: FolderKey::from_millis(5),
        };
        assert_eq!(done.clone().start(), done);
    }

    #[test]
    fn invalid_input_uses_kiosk_copy() {
        let err = OrchestrationError::InvalidInput("image/webp".into());
        assert_eq!(
            visitor_message(&err),
            "The system supports only image uploads: jpg, png, gif"
        );
    }
}
