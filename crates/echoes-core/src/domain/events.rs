//! Progress events emitted while a contribution run is in flight.
//!
//! Events are for UI feedback only; nothing downstream depends on them for
//! correctness.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::contribution::ContributionStatus;

/// A step of the upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Caption,
    Image,
    Speech,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Caption => "caption",
            Stage::Image => "image",
            Stage::Speech => "speech",
        }
    }

    /// Status of a run while this stage is executing.
    pub fn running_status(self) -> ContributionStatus {
        match self {
            Stage::Ingest => ContributionStatus::Ingesting,
            Stage::Caption => ContributionStatus::Captioning,
            Stage::Image => ContributionStatus::Imaging,
            Stage::Speech => ContributionStatus::Narrating,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{stage, percent, message}` as shown on the kiosk progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub status: ContributionStatus,
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(
        stage: Stage,
        status: ContributionStatus,
        percent: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            status,
            percent: percent.min(100),
            message: message.into(),
        }
    }
}
