use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{CUSTOM_EPOCH, TimeSource};

/// A wall-clock time source reading [`SystemTime`] on every call.
///
/// This is the clock a Snowflake generator traditionally samples. It follows
/// the host clock, including any backward step (NTP correction, manual
/// adjustment), which generators report as [`Error::ClockRegression`].
/// Instants before the epoch read as `0`.
///
/// Use [`MonotonicClock`] instead if you would rather never observe a
/// regression.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch: Duration,
}

impl Default for SystemClock {
    /// Constructs a wall clock aligned to [`CUSTOM_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(CUSTOM_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a wall clock whose zero is `epoch`, given as a [`Duration`]
    /// since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self { epoch }
    }

    /// The epoch this clock counts from.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        let since_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let millis = since_unix.saturating_sub(self.epoch).as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }
}
