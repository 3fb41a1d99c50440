//! echoes-core
//!
//! Core building blocks for the Echoes installation: a visitor uploads a
//! photo, the pipeline captions it, paints a new image from the caption and
//! narrates the caption, and the gallery plays back finished contributions.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, artifact, contribution, prediction, events, state, errors, cleanup）
//! - **ports**: 抽象化レイヤー（BlobStore, PredictionClient, ImageNormalizer, ProgressSink, Clock, FolderKeyGenerator）
//! - **app**: アプリケーションロジック（orchestrator, builder, poll, cleanup, gallery, playlist）
//! - **impls**: 実装（InMemoryBlobStore, HttpBlobStore, ReplicateClient, WebpNormalizer, progress sinks）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;
