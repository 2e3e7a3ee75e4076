//! Clock helpers for drivers that feed `tick` from wall-clock time.
//!
//! Wake times are absolute microseconds since the Unix epoch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::scheduler;

pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Absolute wake time `d` from now.
pub fn wake_after(d: Duration) -> i64 {
    wake_after_from(now_micros(), d)
}

pub fn wake_after_from(now: i64, d: Duration) -> i64 {
    now.saturating_add(i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
}

/// Runs one scheduler pass against the wall clock.
pub fn tick_now() -> bool {
    scheduler::tick(now_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_after_adds_micros() {
        assert_eq!(wake_after_from(1_000, Duration::from_millis(3)), 4_000);
        assert_eq!(wake_after_from(0, Duration::from_secs(2)), 2_000_000);
    }

    #[test]
    fn huge_durations_saturate() {
        assert_eq!(wake_after_from(1_000, Duration::MAX), i64::MAX);
        assert_eq!(wake_after_from(1_000, Duration::from_secs(u64::MAX / 2)), i64::MAX);
    }

    #[test]
    fn clock_moves_forward() {
        let a = now_micros();
        let b = wake_after(Duration::from_millis(1));
        assert!(a > 0);
        assert!(b >= a + 1000);
    }
}
