//! GalleryReader - 表示可能な contribution の一覧
//!
//! list -> `generated/` 配下を folder ごとにまとめる -> 必須 artifact が
//! 揃った folder だけ残す -> folder key の降順
//!
//! Read only. Partial folders (a run still in flight, or one whose cleanup
//! did not finish) never show up because a required file is missing.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactKind, FolderKey, split_key};
use crate::ports::{BlobError, BlobStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub folder_key: FolderKey,
    pub original_image_url: String,
    pub generated_image_url: String,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_url: Option<String>,
}

#[derive(Default)]
struct FolderFiles {
    original_image: Option<String>,
    description: Option<String>,
    generated_image: Option<String>,
    generated_audio: Option<String>,
}

impl FolderFiles {
    fn set(&mut self, kind: ArtifactKind, url: String) {
        let slot = match kind {
            ArtifactKind::OriginalImage => &mut self.original_image,
            ArtifactKind::Description => &mut self.description,
            ArtifactKind::GeneratedImage => &mut self.generated_image,
            ArtifactKind::GeneratedAudio => &mut self.generated_audio,
        };
        *slot = Some(url);
    }

    fn into_entry(self, folder_key: FolderKey) -> Option<GalleryEntry> {
        Some(GalleryEntry {
            folder_key,
            original_image_url: self.original_image?,
            generated_image_url: self.generated_image?,
            audio_url: self.generated_audio?,
            description_url: self.description,
        })
    }
}

/// A folder segment is a key only when it is exactly how that key prints.
fn canonical_folder(segment: &str) -> Option<FolderKey> {
    let key = segment.parse::<FolderKey>().ok()?;
    (key.to_string() == segment).then_some(key)
}

pub struct GalleryReader {
    store: Arc<dyn BlobStore>,
}

impl GalleryReader {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Every displayable folder, newest first.
    pub async fn list_complete(&self) -> Result<Vec<GalleryEntry>, BlobError> {
        let blobs = self.store.list().await?;

        // Grouped by the raw folder segment; non-canonical segments never get here.
        let mut folders: HashMap<String, (FolderKey, FolderFiles)> = HashMap::new();
        for blob in blobs {
            let Some(parts) = split_key(&blob.key) else {
                continue;
            };
            let Some(folder_key) = canonical_folder(parts.folder) else {
                tracing::debug!(key = %blob.key, "skipping blob in malformed folder");
                continue;
            };
            // Unknown file names are ignored, not counted.
            if let Some(kind) = ArtifactKind::from_file_name(parts.file_name) {
                folders
                    .entry(parts.folder.to_string())
                    .or_insert_with(|| (folder_key, FolderFiles::default()))
                    .1
                    .set(kind, blob.url);
            }
        }

        let mut entries: Vec<GalleryEntry> = folders
            .into_values()
            .filter_map(|(folder_key, files)| files.into_entry(folder_key))
            .collect();
        entries.sort_by(|a, b| b.folder_key.cmp(&a.folder_key));
        tracing::debug!(count = entries.len(), "gallery listed");
        Ok(entries)
    }
}
