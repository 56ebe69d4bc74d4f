use crate::SnowflakeId;

/// The outcome of one non-blocking generation attempt.
///
/// - [`Poll::Ready`] carries a freshly issued ID.
/// - [`Poll::Pending`] means nothing was issued and the generator state is
///   unchanged: either the current millisecond's 4096 sequence values are used
///   up, or (for the lock-free generator) another thread won a race. Try again
///   after waiting roughly `yield_for` milliseconds; `0` means retry
///   immediately.
///
/// # Example
///
/// ```
/// use flakegen::{BasicSnowflakeGenerator, NodeId, Poll, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = BasicSnowflakeGenerator::new(NodeId::MAX, FixedTime);
/// match generator.poll_id().unwrap() {
///     Poll::Ready { id } => assert_eq!(id.timestamp(), 1),
///     Poll::Pending { yield_for } => println!("back off for {yield_for} ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated Snowflake ID.
        id: SnowflakeId,
    },
    /// No ID could be generated yet.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: u64,
    },
}
