//! FolderKeyGenerator port - folder key の発行
//!
//! Keys are millisecond timestamps so the gallery can sort by recency with a
//! plain numeric comparison. Two uploads inside the same millisecond would
//! collide on a raw timestamp and overwrite each other's artifacts, so the
//! default generator never hands out the same key twice.
//!
//! # 実装
//! - **MonotonicFolderKeys**: `max(now, last + 1)`

use std::sync::{Mutex, PoisonError};

use crate::domain::FolderKey;
use crate::ports::Clock;

/// Issues a fresh folder key per contribution.
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の upload から同時に使える）
pub trait FolderKeyGenerator: Send + Sync {
    fn next_key(&self) -> FolderKey;
}

/// Timestamp keys that are strictly increasing within one process.
///
/// When the clock has not moved past the last issued key (same millisecond,
/// or the clock stepped backwards), the next key is `last + 1`. The key is
/// then slightly ahead of real time, which only matters for display order.
pub struct MonotonicFolderKeys<C> {
    clock: C,
    last_issued: Mutex<u64>,
}

impl<C: Clock> MonotonicFolderKeys<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last_issued: Mutex::new(0),
        }
    }
}

impl<C: Clock> FolderKeyGenerator for MonotonicFolderKeys<C> {
    fn next_key(&self) -> FolderKey {
        let now = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        // The guarded value is a plain integer, so a poisoned lock is still usable.
        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let next = if now > *last { now } else { *last + 1 };
        *last = next;
        FolderKey::from_millis(next)
    }
}
