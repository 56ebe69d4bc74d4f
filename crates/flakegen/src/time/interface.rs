use core::time::Duration;
use std::{rc::Rc, sync::Arc};

/// Default epoch: Thursday, January 1, 2015 00:00:00 UTC.
///
/// The 41-bit timestamp field covers roughly 69 years from here.
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// A trait for time sources that return a monotonic or wall-clock timestamp.
///
/// This abstraction allows you to plug in a real system clock, a monotonic
/// timer, or a mocked time source in tests.
///
/// The unit is **milliseconds** relative to the source's configured epoch.
///
/// # Example
///
/// ```
/// use flakegen::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Rc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
