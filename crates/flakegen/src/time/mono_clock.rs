use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::{CUSTOM_EPOCH, TimeSource};

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source that returns elapsed time since construction,
/// offset from a user-defined epoch.
///
/// The offset is the wall-clock distance to the epoch, sampled once at
/// construction; from then on the clock only advances with [`Instant`], so it
/// is immune to NTP steps and manual clock changes. A generator driven by this
/// clock never reports [`Error::ClockRegression`].
///
/// Clones share one ticker thread. The thread exits once the last clone is
/// dropped.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    epoch_offset: u64, // in milliseconds
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to [`CUSTOM_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(CUSTOM_EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock using a custom epoch as the origin (t = 0),
    /// specified as a [`Duration`] since 1970-01-01 UTC.
    ///
    /// Internally, the clock spawns a background thread that stores the
    /// elapsed milliseconds since construction in a shared atomic once per
    /// millisecond. [`current_millis`] adds that tick to the precomputed
    /// distance between `SystemTime::now()` and `epoch`, so the hot path makes
    /// no syscalls.
    ///
    /// If the system clock is earlier than `epoch`, the offset is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use flakegen::{MonotonicClock, TimeSource};
    ///
    /// let now = std::time::SystemTime::now()
    ///     .duration_since(std::time::UNIX_EPOCH)
    ///     .unwrap();
    /// let clock = MonotonicClock::with_epoch(now);
    ///
    /// let first = clock.current_millis();
    /// std::thread::sleep(Duration::from_millis(5));
    /// assert!(clock.current_millis() >= first);
    /// ```
    ///
    /// [`current_millis`]: TimeSource::current_millis
    pub fn with_epoch(epoch: Duration) -> Self {
        let start = Instant::now();
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let offset = u64::try_from(system_now.saturating_sub(epoch).as_millis()).unwrap_or(0);

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Compute the absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                // Align to next tick after the current actual time
                tick = now_ms + 1;
            }
        });

        // Freshly created above, so the cell is empty.
        let _ = inner._handle.set(handle);

        Self {
            inner,
            epoch_offset: offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the number of milliseconds since the configured epoch, based on
    /// the elapsed monotonic time since construction.
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.inner.current.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let clock = MonotonicClock::default();
        let mut last = clock.current_millis();
        for _ in 0..10_000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn advances() {
        let clock = MonotonicClock::default();
        let first = clock.current_millis();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.current_millis() > first);
    }

    #[test]
    fn clones_share_ticker() {
        let clock = MonotonicClock::default();
        let clone = clock.clone();
        assert!(Arc::ptr_eq(&clock.inner, &clone.inner));
    }
}
