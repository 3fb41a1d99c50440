//! Prediction jobs on the external inference API.
//!
//! A job is created by the prediction client and then only ever read. Its
//! status moves `starting -> processing -> {succeeded | failed | canceled}`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Status reported by the inference API.
///
/// Unknown strings fail to deserialize instead of being mapped to a
/// catch-all, so a protocol change shows up as a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    /// No further transition happens from a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to one inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionJob {
    pub id: String,
    pub status: PredictionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "error_text"
    )]
    pub error: Option<String>,
}

impl PredictionJob {
    pub fn new(id: impl Into<String>, status: PredictionStatus) -> Self {
        Self {
            id: id.into(),
            status,
            output: None,
            error: None,
        }
    }

    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The API reports errors as a string, an object, or `null`.
fn error_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Which model a job runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelRef {
    /// A pinned model version hash.
    Version { id: String },
    /// The latest deployment of `owner/name`.
    Model { owner: String, name: String },
}

impl ModelRef {
    pub fn version(id: impl Into<String>) -> Self {
        ModelRef::Version { id: id.into() }
    }

    pub fn model(owner: impl Into<String>, name: impl Into<String>) -> Self {
        ModelRef::Model {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelRef::Version { id } => write!(f, "version:{id}"),
            ModelRef::Model { owner, name } => write!(f, "{owner}/{name}"),
        }
    }
}

/// A job request: model plus its structured input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSpec {
    pub model: ModelRef,
    pub input: serde_json::Value,
}
