//! Time source for notification timestamps.

use coffer_core::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Supplies the timestamp stamped on notifications and withdrawals.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock, unix seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to. Deterministic timestamps for tests
/// and script replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, ts: Timestamp) {
        self.now.store(ts, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
