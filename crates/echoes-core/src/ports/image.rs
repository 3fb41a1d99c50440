//! ImageNormalizer port - turns an uploaded photo into the stored encoding.

use bytes::Bytes;
use thiserror::Error;

use crate::domain::SourceImageType;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload is not a readable image of the declared type.
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode image: {0}")]
    Encode(String),

    #[error("image worker stopped: {0}")]
    Worker(String),
}

/// Decode, fix orientation, re-encode as WebP.
///
/// CPU bound and synchronous; the orchestrator runs it on the blocking pool.
pub trait ImageNormalizer: Send + Sync {
    fn normalize(&self, bytes: &[u8], source: SourceImageType) -> Result<Bytes, NormalizeError>;
}
