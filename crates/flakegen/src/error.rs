/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `flakegen` can emit.
///
/// There are exactly two failure modes. Running out of sequence numbers within
/// a millisecond is *not* one of them: generators absorb it by waiting for the
/// clock to advance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An explicit node ID fell outside `0..=max`.
    ///
    /// Raised at construction only. Not retryable without a corrected value.
    #[error("node id {node_id} is out of range (expected 0..={max})")]
    InvalidConfiguration {
        /// The rejected node ID, as supplied by the caller.
        node_id: i128,
        /// The largest node ID the layout can encode.
        max: u64,
    },

    /// The time source reported a timestamp earlier than the last one used.
    ///
    /// Issuing an ID now could collide with or sort before IDs already handed
    /// out, so the generator refuses and leaves its state untouched. The caller
    /// decides whether to retry after the clock catches up, pause issuance, or
    /// fail the surrounding operation.
    #[error("clock moved backwards: now {now} ms, last issued at {last} ms")]
    ClockRegression {
        /// The timestamp just read from the time source.
        now: u64,
        /// The timestamp of the most recently issued ID.
        last: u64,
    },
}
