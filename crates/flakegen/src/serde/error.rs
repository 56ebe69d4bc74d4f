use core::fmt;

/// Errors that can occur while deserializing a [`SnowflakeId`].
///
/// [`SnowflakeId`]: crate::SnowflakeId
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SerdeError {
    /// The decoded value sets the reserved high bit, so no generator could
    /// have produced it.
    DecodeOverflow {
        /// The raw value that failed validation.
        raw: u64,
    },
}

impl fmt::Display for SerdeError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DecodeOverflow { raw } => {
                write!(fmt, "decoded id {raw} sets the reserved bit")
            }
        }
    }
}

impl core::error::Error for SerdeError {}
