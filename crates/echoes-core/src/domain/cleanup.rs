//! CleanupReport - per-key result of removing a failed run's folder.
//!
//! Cleanup is best effort: deletes are not retried and a failed delete never
//! replaces the stage error reported to the caller. The report exists so that
//! callers and tests can check whether the folder really is empty.

use serde::{Deserialize, Serialize};

use super::ids::FolderKey;

/// Result of deleting one blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn deleted(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            error: None,
        }
    }

    pub fn failed(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub folder_key: FolderKey,
    pub outcomes: Vec<DeleteOutcome>,

    /// Set when the store could not even be listed; nothing was deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_error: Option<String>,
}

impl CleanupReport {
    pub fn new(folder_key: FolderKey) -> Self {
        Self {
            folder_key,
            outcomes: Vec::new(),
            listing_error: None,
        }
    }

    pub fn listing_failed(folder_key: FolderKey, error: impl Into<String>) -> Self {
        Self {
            folder_key,
            outcomes: Vec::new(),
            listing_error: Some(error.into()),
        }
    }

    pub fn record(&mut self, outcome: DeleteOutcome) {
        self.outcomes.push(outcome);
    }

    /// True when every discovered blob was deleted.
    pub fn is_complete(&self) -> bool {
        self.listing_error.is_none() && self.outcomes.iter().all(DeleteOutcome::is_deleted)
    }

    pub fn deleted_keys(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_deleted())
            .map(|o| o.key.as_str())
    }

    pub fn failed_keys(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_deleted())
            .map(|o| o.key.as_str())
    }
}
