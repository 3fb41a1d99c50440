//! Domain model (folder keys, artifacts, contributions, prediction jobs, ...).
//!
//! Nothing here performs I/O. Ports and the app layer build on these types.

pub mod artifact;
pub mod cleanup;
pub mod contribution;
pub mod errors;
pub mod events;
pub mod ids;
pub mod prediction;
pub mod state;

pub use self::artifact::{ArtifactKind, KeyParts, SourceImageType, folder_prefix, split_key};
pub use self::cleanup::{CleanupReport, DeleteOutcome};
pub use self::contribution::{BlobRef, Contribution, ContributionStatus};
pub use self::errors::{ErrorKind, InfrastructureError, OrchestrationError};
pub use self::events::{ProgressEvent, Stage};
pub use self::ids::{FolderKey, ParseFolderKeyError};
pub use self::prediction::{ModelRef, PredictionJob, PredictionSpec, PredictionStatus};
pub use self::state::{UploadState, visitor_message};
