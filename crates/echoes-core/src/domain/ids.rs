//! Folder keys (contribution namespace identifiers).
//!
//! # FolderKey
//! A folder key is the ingest timestamp in milliseconds since the Unix epoch,
//! written as a plain ASCII decimal integer. It is the storage namespace for
//! every artifact of one contribution (`generated/{folder_key}/...`).
//!
//! ## 特性
//! - **数値でソート可能**: recency ordering is numeric, not lexicographic
//!   (`"9" < "10"` must hold, which string comparison would break)
//! - **一意性**: uniqueness is the job of `ports::FolderKeyGenerator`, not of
//!   this type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Storage namespace of one contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FolderKey(u64);

/// Returned when a folder segment is not a plain decimal integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed folder key: {0:?}")]
pub struct ParseFolderKeyError(pub String);

impl FolderKey {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FolderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderKey {
    type Err = ParseFolderKeyError;

    /// Only ASCII digits are accepted. `u64::from_str` alone would also take
    /// a leading `+`, which never appears in keys we issue.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseFolderKeyError(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ParseFolderKeyError(s.to_string()))
    }
}

impl From<FolderKey> for String {
    fn from(key: FolderKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for FolderKey {
    type Error = ParseFolderKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
