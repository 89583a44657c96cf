//! Time sources.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Monotonic and wall-clock time for the monitoring loop.
///
/// `elapsed` drives heartbeat comparisons; `now_utc` is only used to stamp
/// reports.
pub trait Clock: Send + Sync + Debug {
    /// Monotonic time since the clock was created.
    fn elapsed(&self) -> Duration;

    /// Current wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The process clock.
///
/// Monotonic time comes from tokio's [`Instant`], so it follows the paused
/// clock in tests.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the monitor.
#[derive(Debug, Clone)]
pub struct ManualClock {
    elapsed: Arc<Mutex<Duration>>,
    epoch: DateTime<Utc>,
}

impl ManualClock {
    /// Create a clock at zero elapsed time whose wall clock starts at `epoch`.
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            epoch,
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    pub fn set(&self, elapsed: Duration) {
        *self.elapsed.lock() = elapsed;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let elapsed = self.elapsed();
        self.epoch + chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let epoch = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let clock = ManualClock::new(epoch);
        let other = clock.clone();

        clock.advance(Duration::from_secs(90));

        assert_eq!(other.elapsed(), Duration::from_secs(90));
        assert_eq!(other.now_utc(), Utc.with_ymd_and_hms(2024, 3, 1, 8, 1, 30).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_follows_tokio_time() {
        let clock = SystemClock::new();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(clock.elapsed() >= Duration::from_secs(5));
    }
}
