//! InMemoryBlobStore - 開発用・テスト用の blob store
//!
//! # 実装詳細
//! - BTreeMap<String, StoredBlob> keyed by storage key (listing is sorted)
//! - tokio Mutex で排他制御（lock は await を跨がない）
//! - URLs are `memory://{key}`, so delete-by-URL maps straight back to a key

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::domain::BlobRef;
use crate::ports::{BlobError, BlobStore};

const URL_SCHEME: &str = "memory://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<BTreeMap<String, StoredBlob>>,
    /// Successful puts since creation (for "nothing was written" checks).
    puts: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_for(key: &str) -> String {
        format!("{URL_SCHEME}{key}")
    }

    pub async fn get(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.lock().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.blobs.lock().await.keys().cloned().collect()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<BlobRef, BlobError> {
        // Insert replaces the whole entry under the lock, so readers never see a torn value.
        self.blobs.lock().await.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(BlobRef {
            key: key.to_string(),
            url: Self::url_for(key),
        })
    }

    async fn list(&self) -> Result<Vec<BlobRef>, BlobError> {
        let blobs = self.blobs.lock().await;
        Ok(blobs
            .keys()
            .map(|key| BlobRef {
                key: key.clone(),
                url: Self::url_for(key),
            })
            .collect())
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let key = url.strip_prefix(URL_SCHEME).unwrap_or(url);
        self.blobs.lock().await.remove(key);
        Ok(())
    }
}
