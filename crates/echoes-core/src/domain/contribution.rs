//! Contribution - one visitor upload and its artifacts.

use serde::{Deserialize, Serialize};

use super::ids::FolderKey;

/// A stored blob: its storage key and the public URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    pub key: String,
    pub url: String,
}

/// A finished contribution. Only built once every stage has succeeded;
/// in-flight runs never expose a partially filled value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub folder_key: FolderKey,
    pub original_image: BlobRef,
    pub description: String,
    pub description_blob: BlobRef,
    pub generated_image: BlobRef,
    pub generated_audio: BlobRef,
    /// Voice sample the narration was cloned from.
    pub speaker: String,
}

/// Where a run currently is. Not persisted; derived while the run is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStatus {
    Ingesting,
    Captioning,
    Imaging,
    Narrating,
    Complete,
    Failed,
}

impl ContributionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ContributionStatus::Complete | ContributionStatus::Failed)
    }
}
