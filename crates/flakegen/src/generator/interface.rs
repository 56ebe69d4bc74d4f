use crate::{NodeId, NodeIdProvider, NodeIdSource, Poll, Result, SnowflakeId, TimeSource};

/// A minimal interface for generating Snowflake IDs.
///
/// Implementors provide [`Self::new`], [`Self::node_id`] and
/// [`Self::poll_id`]; the blocking entry points are built on top of polling.
pub trait SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator.
    fn new(node_id: NodeId, time: T) -> Self;

    /// Creates a generator for an explicit, caller-assigned node ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `node_id` is outside
    /// `0..=MAX_NODE_ID`.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    fn try_with_node_id(node_id: i64, time: T) -> Result<Self>
    where
        Self: Sized,
    {
        Ok(Self::new(NodeId::try_from(node_id)?, time))
    }

    /// Creates a generator whose node ID is either explicit (validated) or
    /// derived from a provider (masked into range).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an out-of-range explicit
    /// node ID.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    fn from_source<P>(source: NodeIdSource<P>, time: T) -> Result<Self>
    where
        Self: Sized,
        P: NodeIdProvider,
    {
        Ok(Self::new(source.resolve()?, time))
    }

    /// The node ID stamped into every ID from this generator.
    fn node_id(&self) -> NodeId;

    /// Attempts to generate the next ID without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the time source is behind the
    /// last issued timestamp. The generator state is left untouched.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    fn poll_id(&self) -> Result<Poll>;

    /// Generates the next ID, calling `f` with the suggested back-off (in
    /// milliseconds) each time the generator is pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the time source is behind the
    /// last issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    fn next_id_with(&self, mut f: impl FnMut(u64)) -> Result<SnowflakeId> {
        loop {
            match self.poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Generates the next ID, busy-waiting through sequence exhaustion until
    /// the clock reaches the next millisecond.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the time source is behind the
    /// last issued timestamp.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id_with(|_| core::hint::spin_loop())
    }
}
