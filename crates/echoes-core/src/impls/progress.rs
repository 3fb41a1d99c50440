//! ProgressSink の実装

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::ProgressEvent;
use crate::ports::ProgressSink;

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events to an unbounded channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// Logs each event at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn emit(&self, event: ProgressEvent) {
        tracing::info!(
            stage = %event.stage,
            status = ?event.status,
            percent = event.percent,
            "{}",
            event.message
        );
    }
}
