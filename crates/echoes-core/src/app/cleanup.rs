//! Cleanup - 失敗した run の folder を削除する
//!
//! list -> `generated/{key}/` 配下を選択 -> URL で 1 件ずつ delete
//!
//! Best effort: a failed delete is recorded and logged, never retried.

use crate::domain::{CleanupReport, DeleteOutcome, FolderKey, folder_prefix};
use crate::ports::BlobStore;

pub async fn cleanup_folder(store: &dyn BlobStore, folder_key: FolderKey) -> CleanupReport {
    let blobs = match store.list().await {
        Ok(blobs) => blobs,
        Err(err) => {
            tracing::warn!(%folder_key, error = %err, "cleanup could not list the store");
            return CleanupReport::listing_failed(folder_key, err.to_string());
        }
    };

    let prefix = folder_prefix(folder_key);
    let mut report = CleanupReport::new(folder_key);
    for blob in blobs.into_iter().filter(|b| b.key.starts_with(&prefix)) {
        match store.delete(&blob.url).await {
            Ok(()) => report.record(DeleteOutcome::deleted(blob.key)),
            Err(err) => {
                tracing::warn!(%folder_key, key = %blob.key, error = %err, "cleanup delete failed");
                report.record(DeleteOutcome::failed(blob.key, err.to_string()));
            }
        }
    }

    if report.is_complete() {
        tracing::info!(%folder_key, deleted = report.outcomes.len(), "folder cleaned up");
    }
    report
}
