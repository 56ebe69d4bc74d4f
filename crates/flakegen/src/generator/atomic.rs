use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    NodeId, Poll, Result, SnowflakeGenerator, SnowflakeId, TimeSource, generator::state::advance,
};

/// Sentinel for "nothing issued yet". It sets the reserved bit, so no
/// generated ID can ever equal it.
const UNSET: u64 = u64::MAX;

/// A lock-free Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID is stored in an [`AtomicU64`] and each attempt publishes
/// its successor with a single compare-and-swap, so the read-check-update
/// sequence is still serialized: of two callers racing from the same state,
/// exactly one wins and the other retries.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Lock-free
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access is sacrificed for higher throughput
///
/// ## See Also
/// - [`BasicSnowflakeGenerator`]
/// - [`LockSnowflakeGenerator`]
///
/// [`BasicSnowflakeGenerator`]: crate::BasicSnowflakeGenerator
/// [`LockSnowflakeGenerator`]: crate::LockSnowflakeGenerator
pub struct AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    node_id: NodeId,
    time: T,
}

impl<T> AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`AtomicSnowflakeGenerator`] for the given node.
    ///
    /// # Example
    /// ```
    /// use flakegen::{AtomicSnowflakeGenerator, MonotonicClock, NodeId};
    ///
    /// let generator = AtomicSnowflakeGenerator::new(NodeId::MAX, MonotonicClock::default());
    /// let id = generator.next_id_with(|_| std::thread::yield_now()).unwrap();
    /// assert_eq!(id.node_id(), 1023);
    /// ```
    pub fn new(node_id: NodeId, time: T) -> Self {
        Self::with_state(UNSET, node_id, time)
    }

    /// Creates a generator that behaves as if it had just issued the ID
    /// `(last_timestamp, node_id, sequence)`.
    ///
    /// Useful for resuming from a known point or for driving tests into a
    /// particular state. Prefer [`Self::new`] otherwise.
    pub fn from_components(last_timestamp: u64, node_id: NodeId, sequence: u64, time: T) -> Self {
        let last = SnowflakeId::from_components(last_timestamp, node_id.get(), sequence);
        Self::with_state(last.to_raw(), node_id, time)
    }

    fn with_state(raw: u64, node_id: NodeId, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(raw)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(raw),
            node_id,
            time,
        }
    }

    /// The node ID stamped into every ID from this generator.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Generates the next ID, spinning through sequence exhaustion and CAS
    /// contention.
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
    /// Returns [`Poll::Pending`] with `yield_for == 1` if the millisecond is
    /// exhausted, or `yield_for == 0` if another thread won the race.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock is behind the last
    /// issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        // Load before sampling the clock: the winner of the previous CAS read
        // its clock before publishing, so `now` cannot trail it spuriously.
        let current_raw = self.state.load(Ordering::Acquire);
        let now = self.time.current_millis();

        let last = (current_raw != UNSET).then(|| SnowflakeId::from_raw(current_raw));
        let poll = advance(last, self.node_id, now)?;
        let Poll::Ready { id } = poll else {
            return Ok(poll);
        };

        if self
            .state
            .compare_exchange(current_raw, id.to_raw(), Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            Ok(poll)
        } else {
            // CAS failed - another thread won the race. Yield 0 to retry
            // immediately.
            Ok(Poll::Pending { yield_for: 0 })
        }
    }
}

impl<T> SnowflakeGenerator<T> for AtomicSnowflakeGenerator<T>
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
