use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Epochs below this are treated as "wall clock not yet set" (pre-NTP boot).
pub const MIN_VALID_EPOCH: u32 = 1_700_000_000;

/// Clock abstraction for control and timing across the stack.
///
/// - now(): returns a monotonic Instant
/// - epoch_secs(): wall-clock Unix seconds, or None before time sync
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - ms_since(): helper to compute elapsed milliseconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn epoch_secs(&self) -> Option<u32>;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }
}

/// Default, real-time clock backed by `std::time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_secs(&self) -> Option<u32> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()?
            .as_secs();
        let secs = u32::try_from(secs).ok()?;
        if secs < MIN_VALID_EPOCH {
            return None;
        }
        Some(secs)
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}
