//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **UploadOrchestrator**: ingest -> caption -> image -> speech
//! - **OrchestratorBuilder**: ワイヤリングと起動時検証
//! - **poll_until_terminal**: prediction job の待機ループ
//! - **cleanup_folder**: 失敗した run の artifact 削除
//! - **GalleryReader / GalleryPlaylist**: 表示側

pub mod builder;
pub mod cleanup;
pub mod gallery;
pub mod orchestrator;
pub mod playlist;
pub mod poll;
pub mod stages;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, OrchestratorBuilder};
pub use self::cleanup::cleanup_folder;
pub use self::gallery::{GalleryEntry, GalleryReader};
pub use self::orchestrator::UploadOrchestrator;
pub use self::playlist::GalleryPlaylist;
pub use self::poll::{PollError, PollPolicy, poll_until_terminal};
pub use self::stages::{DEFAULT_SPEAKERS, StageModels, default_speakers};
