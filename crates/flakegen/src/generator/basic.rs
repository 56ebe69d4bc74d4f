use core::cell::Cell;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    NodeId, Poll, Result, SnowflakeGenerator, SnowflakeId, TimeSource, generator::state::advance,
};

/// A non-concurrent Snowflake ID generator suitable for single-threaded
/// environments.
///
/// State lives in a [`Cell`], so the type is `!Sync`: every call runs to
/// completion before the next can start, and no locking is needed.
///
/// ## Features
/// - ❌ Not thread-safe
/// - ✅ Fastest generator
///
/// ## Recommended When
/// - You're in a single-threaded environment (no shared access)
/// - Each worker owns its own generator and node ID
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
/// - [`AtomicSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::LockSnowflakeGenerator
/// [`AtomicSnowflakeGenerator`]: crate::AtomicSnowflakeGenerator
pub struct BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    state: Cell<Option<SnowflakeId>>,
    node_id: NodeId,
    time: T,
}

impl<T> BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`BasicSnowflakeGenerator`] for the given node.
    ///
    /// No ID has been issued yet, so the first call to [`Self::next_id`]
    /// uses sequence `0` whatever the clock reads.
    ///
    /// # Example
    /// ```
    /// use flakegen::{BasicSnowflakeGenerator, NodeId, SystemClock};
    ///
    /// let node_id = NodeId::try_from(1_i64).unwrap();
    /// let generator = BasicSnowflakeGenerator::new(node_id, SystemClock::default());
    ///
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(a < b);
    /// ```
    pub fn new(node_id: NodeId, time: T) -> Self {
        Self {
            state: Cell::new(None),
            node_id,
            time,
        }
    }

    /// Creates a generator that behaves as if it had just issued the ID
    /// `(last_timestamp, node_id, sequence)`.
    ///
    /// Useful for resuming from a known point or for driving tests into a
    /// particular state. Prefer [`Self::new`] otherwise.
    pub fn from_components(last_timestamp: u64, node_id: NodeId, sequence: u64, time: T) -> Self {
        let last = SnowflakeId::from_components(last_timestamp, node_id.get(), sequence);
        Self {
            state: Cell::new(Some(last)),
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
    /// # Example
    /// ```
    /// use flakegen::{BasicSnowflakeGenerator, NodeId, SystemClock};
    ///
    /// let generator = BasicSnowflakeGenerator::new(NodeId::MAX, SystemClock::default());
    /// let id = generator.next_id_with(|_| std::thread::yield_now()).unwrap();
    /// assert_eq!(id.node_id(), 1023);
    /// ```
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
    /// Returns [`Poll::Pending`] if the current millisecond is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock is behind the last
    /// issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let now = self.time.current_millis();
        let poll = advance(self.state.get(), self.node_id, now)?;
        if let Poll::Ready { id } = poll {
            self.state.set(Some(id));
        }
        Ok(poll)
    }
}

impl<T> SnowflakeGenerator<T> for BasicSnowflakeGenerator<T>
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
