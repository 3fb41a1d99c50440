//! ProgressSink port - progress event の通知先
//!
//! # 実装
//! - NoopProgressSink: 何もしない（デフォルト）
//! - ChannelProgressSink: forwards to a tokio channel (HTTP / CLI feedback)
//! - TracingProgressSink: writes each event to the log

use crate::domain::ProgressEvent;

/// Receives progress events from a running contribution.
///
/// Emitting must not block and must not fail the run; a sink whose consumer
/// went away simply drops events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}
