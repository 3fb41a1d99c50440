//! BlobStore port - durable object storage for artifacts.
//!
//! The store is the only durable owner of artifact bytes. Keys are
//! `/`-delimited and grouped by prefix; the store itself knows nothing about
//! folders.
//!
//! # 設計原則
//! - `put` is all-or-nothing: readers see the old object or the new one
//! - `delete` is idempotent: deleting a missing blob is not an error
//! - objects are addressed by URL for deletion, by key for writing

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::BlobRef;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("blob store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("missing blob store token")]
    MissingToken,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` with public read access.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<BlobRef, BlobError>;

    /// Every blob in the store.
    async fn list(&self) -> Result<Vec<BlobRef>, BlobError>;

    /// Remove the blob served at `url`.
    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}
