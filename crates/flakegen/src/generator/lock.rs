use std::sync::Arc;

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    NodeId, Poll, Result, SnowflakeGenerator, SnowflakeId, TimeSource, generator::state::advance,
};

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID sits behind an [`Arc<Mutex<_>>`], and the whole
/// read-clock, compare, update sequence runs inside the critical section, so
/// concurrent callers can never observe the same state and pick the same
/// sequence value. Clones share state.
///
/// `parking_lot`'s mutex does not poison, so the only runtime failure is
/// [`Error::ClockRegression`].
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Fair access across threads
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access across threads is important
/// - Your target doesn't support 64-bit atomics
///
/// ## See Also
/// - [`BasicSnowflakeGenerator`]
/// - [`AtomicSnowflakeGenerator`]
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
/// [`BasicSnowflakeGenerator`]: crate::BasicSnowflakeGenerator
/// [`AtomicSnowflakeGenerator`]: crate::AtomicSnowflakeGenerator
#[derive(Clone)]
pub struct LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<Option<SnowflakeId>>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<Option<SnowflakeId>>>,
    node_id: NodeId,
    time: T,
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockSnowflakeGenerator`] for the given node.
    ///
    /// # Example
    /// ```
    /// use flakegen::{LockSnowflakeGenerator, MonotonicClock, NodeId};
    ///
    /// let generator = LockSnowflakeGenerator::new(NodeId::MAX, MonotonicClock::default());
    ///
    /// std::thread::scope(|s| {
    ///     for _ in 0..4 {
    ///         s.spawn(|| generator.next_id().unwrap());
    ///     }
    /// });
    /// ```
    pub fn new(node_id: NodeId, time: T) -> Self {
        Self::with_state(None, node_id, time)
    }

    /// Creates a generator that behaves as if it had just issued the ID
    /// `(last_timestamp, node_id, sequence)`.
    ///
    /// Useful for resuming from a known point or for driving tests into a
    /// particular state. Prefer [`Self::new`] otherwise.
    pub fn from_components(last_timestamp: u64, node_id: NodeId, sequence: u64, time: T) -> Self {
        let last = SnowflakeId::from_components(last_timestamp, node_id.get(), sequence);
        Self::with_state(Some(last), node_id, time)
    }

    fn with_state(last: Option<SnowflakeId>, node_id: NodeId, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(last))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(last)),
            node_id,
            time,
        }
    }

    /// The node ID stamped into every ID from this generator.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Generates the next ID, spinning through sequence exhaustion.
    ///
    /// The lock is released between attempts, so a spinning caller does not
    /// block other threads from observing the advanced clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock is behind the last
    /// issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    pub fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id_with(|_| core::hint::spin_loop())
    }

    /// Generates the next ID, calling `f` while pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock is behind the last
    /// issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    pub fn next_id_with(&self, mut f: impl FnMut(u64)) -> Result<SnowflakeId> {
        loop {
            match self.poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Attempts to generate the next ID.
    ///
    /// # Example
    /// ```
    /// use flakegen::{LockSnowflakeGenerator, NodeId, Poll, SystemClock};
    ///
    /// let generator = LockSnowflakeGenerator::new(NodeId::MAX, SystemClock::default());
    ///
    /// let id = loop {
    ///     match generator.poll_id() {
    ///         Ok(Poll::Ready { id }) => break id,
    ///         Ok(Poll::Pending { .. }) => std::thread::yield_now(),
    ///         Err(e) => panic!("clock went backwards: {e}"),
    ///     }
    /// };
    /// assert_eq!(id.node_id(), 1023);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock is behind the last
    /// issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut last = self.state.lock();
        let now = self.time.current_millis();

        let poll = advance(*last, self.node_id, now)?;
        if let Poll::Ready { id } = poll {
            *last = Some(id);
        }
        Ok(poll)
    }
}

impl<T> SnowflakeGenerator<T> for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn new(node_id: NodeId, time: T) -> Self {
        Self::new(node_id, time)
    }

    fn node_id(&self) -> NodeId {
        self.node_id()
    }

    fn poll_id(&self) -> Result<Poll> {
        self.poll_id()
    }

    fn next_id_with(&self, f: impl FnMut(u64)) -> Result<SnowflakeId> {
        self.next_id_with(f)
    }

    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id()
    }
}
