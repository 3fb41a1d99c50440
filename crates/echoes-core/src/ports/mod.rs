//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（object storage, inference API, image codec など）
//! へのインターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - Blob storage が artifact の正本（source of truth）
//! - inference API は request / poll のみ（retry しない）
//! - 時刻と ID 発行は差し替え可能（テスト容易性）

pub mod blob_store;
pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod image;
pub mod prediction;

// 主要な trait を再エクスポート
pub use self::blob_store::{BlobError, BlobStore};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::ProgressSink;
pub use self::id_generator::{FolderKeyGenerator, MonotonicFolderKeys};
pub use self::image::{ImageNormalizer, NormalizeError};
pub use self::prediction::{PredictionClient, PredictionError};
