//! Artifact naming contract.
//!
//! Every contribution owns four blobs under one folder:
//!
//! ```text
//! generated/{folder_key}/originalImage.webp
//! generated/{folder_key}/description.txt
//! generated/{folder_key}/generated_image.webp
//! generated/{folder_key}/generatedAudio.wav
//! ```
//!
//! The gallery groups blobs by the folder segment, so these names are part
//! of the storage format and must not change.

use serde::{Deserialize, Serialize};

use super::ids::FolderKey;

/// Top-level key segment shared by all contributions.
pub const ROOT_SEGMENT: &str = "generated";

/// One persisted output of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    OriginalImage,
    Description,
    GeneratedImage,
    GeneratedAudio,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::OriginalImage,
        ArtifactKind::Description,
        ArtifactKind::GeneratedImage,
        ArtifactKind::GeneratedAudio,
    ];

    /// Artifacts that must exist before a folder may be displayed.
    /// The description is optional for display.
    pub const REQUIRED_FOR_GALLERY: [ArtifactKind; 3] = [
        ArtifactKind::OriginalImage,
        ArtifactKind::GeneratedImage,
        ArtifactKind::GeneratedAudio,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::OriginalImage => "originalImage.webp",
            ArtifactKind::Description => "description.txt",
            ArtifactKind::GeneratedImage => "generated_image.webp",
            ArtifactKind::GeneratedAudio => "generatedAudio.wav",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::OriginalImage | ArtifactKind::GeneratedImage => "image/webp",
            ArtifactKind::Description => "text/plain",
            ArtifactKind::GeneratedAudio => "audio/wav",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.file_name() == name)
    }

    /// Full storage key of this artifact inside `folder`.
    pub fn key(self, folder: FolderKey) -> String {
        format!("{}{}", folder_prefix(folder), self.file_name())
    }
}

/// `generated/{folder}/`, the prefix every blob of the folder starts with.
pub fn folder_prefix(folder: FolderKey) -> String {
    format!("{ROOT_SEGMENT}/{folder}/")
}

/// A storage key split into its folder segment and file name.
///
/// The folder is kept as raw text: listing may surface folders we did not
/// write, and those must be skipped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub folder: &'a str,
    pub file_name: &'a str,
}

/// Split `generated/{folder}/{file}`; `None` for anything outside the root
/// or without both segments.
pub fn split_key(key: &str) -> Option<KeyParts<'_>> {
    let rest = key.strip_prefix(ROOT_SEGMENT)?.strip_prefix('/')?;
    let (folder, file_name) = rest.split_once('/')?;
    if folder.is_empty() || file_name.is_empty() {
        return None;
    }
    Some(KeyParts { folder, file_name })
}

/// Image formats accepted at ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceImageType {
    Jpeg,
    Png,
    Gif,
}

impl SourceImageType {
    pub const ALLOWED_MIME_TYPES: [&'static str; 3] = ["image/jpeg", "image/png", "image/gif"];

    /// Map a MIME type onto the allow-list. Parameters (`; charset=...`) and
    /// case are ignored; `image/jpg` is treated as jpeg.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn keys_follow_storage_layout() {
        let folder = FolderKey::from_millis(1700000000000);
        assert_eq!(
            ArtifactKind::OriginalImage.key(folder),
            "generated/1700000000000/originalImage.webp"
        );
        assert_eq!(
            ArtifactKind::Description.key(folder),
            "generated/1700000000000/description.txt"
        );
        assert_eq!(
            ArtifactKind::GeneratedImage.key(folder),
            "generated/1700000000000/generated_image.webp"
        );
        assert_eq!(
            ArtifactKind::GeneratedAudio.key(folder),
            "generated/1700000000000/generatedAudio.wav"
        );
    }

    #[test]
    fn file_names_round_trip() {
        for kind in ArtifactKind::ALL {
            assert_eq!(ArtifactKind::from_file_name(kind.file_name()), Some(kind));
        }
        assert_eq!(ArtifactKind::from_file_name("thumbnail.png"), None);
    }

    #[rstest]
    #[case("generated/123/originalImage.webp", Some(("123", "originalImage.webp")))]
    #[case("generated/abc/notes.txt", Some(("abc", "notes.txt")))]
    #[case("generated/123/nested/file.txt", Some(("123", "nested/file.txt")))]
    #[case("generated/123/", None)]
    #[case("generated//x.txt", None)]
    #[case("generated/123", None)]
    #[case("audioBase/voice.wav", None)]
    #[case("generatedX/123/a.txt", None)]
    fn split_key_cases(#[case] key: &str, #[case] expected: Option<(&str, &str)>) {
        let parts = split_key(key).map(|p| (p.folder, p.file_name));
        assert_eq!(parts, expected);
    }

    #[rstest]
    #[case("image/jpeg", Some(SourceImageType::Jpeg))]
    #[case("image/jpg", Some(SourceImageType::Jpeg))]
    #[case("IMAGE/PNG", Some(SourceImageType::Png))]
    #[case("image/gif; foo=bar", Some(SourceImageType::Gif))]
    #[case("image/webp", None)]
    #[case("image/svg+xml", None)]
    #[case("application/pdf", None)]
    #[case("text/plain", None)]
    #[case("", None)]
    fn mime_allow_list(#[case] mime: &str, #[case] expected: Option<SourceImageType>) {
        assert_eq!(SourceImageType::from_mime(mime), expected);
    }
}
