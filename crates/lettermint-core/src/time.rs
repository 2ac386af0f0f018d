//! Clock abstraction for signature freshness checks.
//!
//! The verifier compares the signed timestamp against "now"; injecting the
//! clock keeps that comparison deterministic in tests.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Source of wall-clock time.
///
/// Production code uses `RealClock`, tests inject `TestClock`.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current system time.
    fn now_system(&self) -> SystemTime;

    /// Returns the current time as whole seconds since the unix epoch.
    ///
    /// Times before the epoch are reported as negative seconds.
    fn unix_timestamp(&self) -> i64 {
        match self.now_system().duration_since(UNIX_EPOCH) {
            Ok(since) => i64::try_from(since.as_secs()).unwrap_or(i64::MAX),
            Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
        }
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Controllable clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can keep a handle and
/// advance the clock seen by the code under test.
#[derive(Debug, Clone)]
pub struct TestClock {
    /// Seconds since `UNIX_EPOCH`.
    unix_secs: Arc<AtomicI64>,
}

impl TestClock {
    /// Creates a test clock starting at the current time.
    pub fn new() -> Self {
        Self::at_unix(RealClock.unix_timestamp())
    }

    /// Creates a test clock fixed at the given unix timestamp.
    pub fn at_unix(secs: i64) -> Self {
        Self { unix_secs: Arc::new(AtomicI64::new(secs)) }
    }

    /// Creates a test clock starting at a specific time.
    pub fn with_start_time(start: SystemTime) -> Self {
        let clock = Self::at_unix(0);
        clock.jump_to(start);
        clock
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        self.unix_secs.fetch_add(secs, Ordering::AcqRel);
    }

    /// Moves the clock backward, simulating skew between sender and receiver.
    pub fn rewind(&self, duration: Duration) {
        let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        self.unix_secs.fetch_sub(secs, Ordering::AcqRel);
    }

    /// Jumps the clock to a specific system time, forwards or backwards.
    pub fn jump_to(&self, time: SystemTime) {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(since) => i64::try_from(since.as_secs()).unwrap_or(i64::MAX),
            Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
        };
        self.unix_secs.store(secs, Ordering::Release);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_system(&self) -> SystemTime {
        let secs = self.unix_secs.load(Ordering::Acquire);
        if secs >= 0 {
            UNIX_EPOCH + Duration::from_secs(secs.unsigned_abs())
        } else {
            UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
        }
    }

    fn unix_timestamp(&self) -> i64 {
        self.unix_secs.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_fixed_until_advanced() {
        let clock = TestClock::at_unix(1_700_000_000);
        assert_eq!(clock.unix_timestamp(), 1_700_000_000);

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.unix_timestamp(), 1_700_000_090);

        clock.rewind(Duration::from_secs(100));
        assert_eq!(clock.unix_timestamp(), 1_699_999_990);
    }

    #[test]
    fn clones_share_time() {
        let clock = TestClock::at_unix(10);
        let handle = clock.clone();

        handle.advance(Duration::from_secs(5));
        assert_eq!(clock.unix_timestamp(), 15);
    }

    #[test]
    fn system_time_matches_unix_seconds() {
        let start = UNIX_EPOCH + Duration::from_secs(1000);
        let clock = TestClock::with_start_time(start);

        assert_eq!(clock.now_system(), start);
        assert_eq!(clock.unix_timestamp(), 1000);

        clock.jump_to(UNIX_EPOCH + Duration::from_secs(2000));
        assert_eq!(clock.unix_timestamp(), 2000);
    }

    #[test]
    fn real_clock_default_timestamp_is_after_2020() {
        assert!(RealClock::new().unix_timestamp() > 1_577_836_800);
    }
}
