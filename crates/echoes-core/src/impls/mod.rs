//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryBlobStore**: 開発用・テスト用の blob store
//! - **HttpBlobStore**: Vercel Blob 互換の REST object storage
//! - **ReplicateClient**: Replicate predictions API
//! - **WebpNormalizer**: `image` crate による WebP 変換
//! - **NoopProgressSink / ChannelProgressSink / TracingProgressSink**

pub mod http_blob;
pub mod image_normalizer;
pub mod memory_blob;
pub mod progress;
pub mod replicate;

// 主要な型を再エクスポート
pub use self::http_blob::{DEFAULT_BLOB_API_URL, HttpBlobStore};
pub use self::image_normalizer::WebpNormalizer;
pub use self::memory_blob::{InMemoryBlobStore, StoredBlob};
pub use self::progress::{ChannelProgressSink, NoopProgressSink, TracingProgressSink};
pub use self::replicate::{DEFAULT_REPLICATE_API_URL, ReplicateClient};
