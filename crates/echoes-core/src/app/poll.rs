//! Poll loop - prediction job が終端状態になるまで待つ
//!
//! # フロー
//! 1. `get(job_id)` で status 取得
//! 2. terminal なら返す
//! 3. `max_wait` 超過なら TimedOut
//! 4. `interval` だけ sleep して 1 に戻る
//!
//! Fixed interval, no backoff. The sleep is a tokio timer so tests can run
//! under paused time.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::domain::PredictionJob;
use crate::ports::{PredictionClient, PredictionError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits for as long as the job runs.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("status fetch for prediction {job_id} failed: {source}")]
    Status {
        job_id: String,
        #[source]
        source: PredictionError,
    },

    #[error("prediction {job_id} still running after {waited:?}")]
    TimedOut { job_id: String, waited: Duration },
}

/// Fetch the job until it reports a terminal status.
///
/// A job that reports a non-terminal status N times is fetched exactly N+1
/// times. Any fetch error ends the loop; there is no retry.
pub async fn poll_until_terminal(
    client: &dyn PredictionClient,
    job_id: &str,
    policy: &PollPolicy,
) -> Result<PredictionJob, PollError> {
    let started = Instant::now();
    let mut tick: u32 = 0;
    loop {
        let job = client
            .get(job_id)
            .await
            .map_err(|source| PollError::Status {
                job_id: job_id.to_string(),
                source,
            })?;
        tick += 1;

        if job.status.is_terminal() {
            tracing::debug!(job_id, status = %job.status, tick, "prediction finished");
            return Ok(job);
        }
        tracing::debug!(job_id, status = %job.status, tick, "prediction still running");

        if let Some(max_wait) = policy.max_wait {
            let waited = started.elapsed();
            if waited >= max_wait {
                return Err(PollError::TimedOut {
                    job_id: job_id.to_string(),
                    waited,
                });
            }
        }
        tokio::time::sleep(policy.interval).await;
    }
}
