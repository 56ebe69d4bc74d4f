use core::{fmt, str::FromStr, time::Duration};

use crate::NodeId;

/// Reserved sign bit, always zero.
pub const UNUSED_BITS: u32 = 1;

/// Width of the timestamp field (milliseconds since the epoch).
///
/// The field overflows about 69 years after the epoch (late 2084 for
/// [`CUSTOM_EPOCH`]). Past that point debug builds panic in
/// [`SnowflakeId::from_components`] and release builds wrap the timestamp to
/// zero, so IDs stop increasing.
///
/// [`CUSTOM_EPOCH`]: crate::CUSTOM_EPOCH
pub const EPOCH_BITS: u32 = 41;

/// Width of the node ID field.
pub const NODE_ID_BITS: u32 = 10;

/// Width of the per-millisecond sequence field.
pub const SEQUENCE_BITS: u32 = 12;

/// Largest encodable node ID (1023).
pub const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;

/// Largest encodable sequence value (4095).
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Largest encodable timestamp, roughly 69 years of milliseconds.
pub const MAX_TIMESTAMP: u64 = (1 << EPOCH_BITS) - 1;

const _: () = assert!(UNUSED_BITS + EPOCH_BITS + NODE_ID_BITS + SEQUENCE_BITS == u64::BITS);

/// A 64-bit Snowflake ID.
///
/// - 1 bit reserved
/// - 41 bits timestamp (ms since the generator's epoch)
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21             12 11             0
///              +--------------+----------------+-----------------+---------------+
///  Field:      | reserved (1) | timestamp (41) |   node ID (10)  | sequence (12) |
///              +--------------+----------------+-----------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
/// ```
///
/// Ordering is the ordering of the raw integer, so IDs compare by timestamp
/// first, then node ID, then sequence.
///
/// # Example
///
/// ```
/// use flakegen::SnowflakeId;
///
/// let id = SnowflakeId::from_components(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.node_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// assert_eq!(id.to_raw(), (1000 << 22) | (2 << 12) | 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = MAX_TIMESTAMP;

    /// Bitmask for extracting the 10-bit node ID field. Occupies bits 12
    /// through 21.
    pub const NODE_ID_MASK: u64 = MAX_NODE_ID;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = MAX_SEQUENCE;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = NODE_ID_BITS + SEQUENCE_BITS;

    /// Number of bits to shift the node ID to its correct position (bit 12).
    pub const NODE_ID_SHIFT: u32 = SEQUENCE_BITS;

    /// Bitmask covering the reserved high bit.
    pub const RESERVED_MASK: u64 = !(u64::MAX >> UNUSED_BITS);

    /// Packs the three fields into an ID. Each field is truncated to its
    /// width, so a timestamp past [`MAX_TIMESTAMP`] wraps around.
    pub const fn from(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = sequence & Self::SEQUENCE_MASK;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Packs the three fields into an ID.
    ///
    /// Debug builds panic when a field does not fit its width; release builds
    /// truncate like [`SnowflakeId::from`].
    pub fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(node_id <= Self::NODE_ID_MASK, "node_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, node_id, sequence)
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node ID from the packed ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        self.id & Self::SEQUENCE_MASK
    }

    /// Returns the raw 64-bit integer.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw integer without validation. See [`Self::is_valid`].
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns `true` if the reserved bit is clear. Every generated ID is
    /// valid; only IDs built with [`Self::from_raw`] can fail this.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_MASK == 0
    }

    /// Returns `true` if there is still room to increment the sequence within
    /// this ID's millisecond.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::SEQUENCE_MASK
    }

    /// Returns the ID that follows this one within the same millisecond.
    pub fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.node_id(), self.sequence() + 1)
    }

    /// Returns the first ID of a newer millisecond for the same node.
    pub fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.node_id(), 0)
    }

    /// Returns the first ID a node issues at `timestamp`.
    pub fn first_at(timestamp: u64, node_id: NodeId) -> Self {
        Self::from_components(timestamp, node_id.get(), 0)
    }

    /// Milliseconds since the Unix epoch at which this ID was issued, given
    /// the epoch its generator's clock was anchored to.
    ///
    /// ```
    /// use flakegen::{CUSTOM_EPOCH, SnowflakeId};
    ///
    /// let id = SnowflakeId::from_components(5, 0, 0);
    /// assert_eq!(id.unix_millis(CUSTOM_EPOCH), 1_420_070_400_005);
    /// ```
    pub fn unix_millis(&self, epoch: Duration) -> u128 {
        epoch.as_millis() + u128::from(self.timestamp())
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

/// Errors from parsing a [`SnowflakeId`] out of its decimal form.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseIdError {
    /// The input is not a decimal `u64`.
    #[error("invalid snowflake id: {0}")]
    InvalidDigits(#[from] core::num::ParseIntError),

    /// The input sets the reserved high bit.
    #[error("snowflake id {0} sets the reserved bit")]
    ReservedBitSet(u64),
}

impl FromStr for SnowflakeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self::from_raw(s.parse()?);
        if !id.is_valid() {
            return Err(ParseIdError::ReservedBitSet(id.to_raw()));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_and_bounds() {
        let ts = MAX_TIMESTAMP;
        let node = MAX_NODE_ID;
        let seq = MAX_SEQUENCE;

        let id = SnowflakeId::from(ts, node, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.node_id(), node);
        assert_eq!(id.sequence(), seq);
        assert_eq!(SnowflakeId::from_components(ts, node, seq), id);
        assert!(id.is_valid());
        assert_eq!(id.to_raw(), u64::MAX >> 1);
    }

    #[test]
    fn layout_matches_shift_formula() {
        let id = SnowflakeId::from_components(123_456_789, 513, 77);
        let raw = id.to_raw();
        assert_eq!((raw >> 22) & ((1 << 41) - 1), 123_456_789);
        assert_eq!((raw >> 12) & 1023, 513);
        assert_eq!(raw & 4095, 77);
        assert_eq!(raw, (123_456_789 << 22) | (513 << 12) | 77);
    }

    #[test]
    fn constants() {
        assert_eq!(MAX_NODE_ID, 1023);
        assert_eq!(MAX_SEQUENCE, 4095);
        assert_eq!(SnowflakeId::TIMESTAMP_SHIFT, 22);
        assert_eq!(SnowflakeId::NODE_ID_SHIFT, 12);
        assert_eq!(SnowflakeId::RESERVED_MASK, 1 << 63);
    }

    #[test]
    fn timestamp_beyond_32_bits_is_not_truncated() {
        let ts = (1 << 40) + 3;
        let id = SnowflakeId::from_components(ts, 1, 0);
        assert_eq!(id.timestamp(), ts);
        assert!(id.is_valid());
    }

    #[test]
    fn from_truncates_oversized_fields() {
        let id = SnowflakeId::from(MAX_TIMESTAMP + 6, MAX_NODE_ID + 3, MAX_SEQUENCE + 2);
        assert_eq!(id.timestamp(), 5);
        assert_eq!(id.node_id(), 2);
        assert_eq!(id.sequence(), 1);
        assert!(id.is_valid());
        // A wrapped timestamp sorts before the last in-range one.
        assert!(id < SnowflakeId::from(MAX_TIMESTAMP, 0, 0));
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = SnowflakeId::from_components(10, 5, 4095);
        let b = SnowflakeId::from_components(11, 5, 0);
        let c = SnowflakeId::from_components(11, 5, 1);
        assert!(a < b && b < c);
        assert!(a.to_raw() < b.to_raw());
    }

    #[test]
    fn sequence_helpers() {
        let id = SnowflakeId::from_components(7, 3, MAX_SEQUENCE - 1);
        assert!(id.has_sequence_room());
        let next = id.increment_sequence();
        assert_eq!(next.sequence(), MAX_SEQUENCE);
        assert!(!next.has_sequence_room());
        let rolled = next.rollover_to_timestamp(8);
        assert_eq!(rolled.timestamp(), 8);
        assert_eq!(rolled.node_id(), 3);
        assert_eq!(rolled.sequence(), 0);
    }

    #[test]
    fn parse_and_display() {
        let id = SnowflakeId::from_components(42, 1, 9);
        let parsed: SnowflakeId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.to_padded_string().len(), 20);

        assert!(matches!(
            "abc".parse::<SnowflakeId>(),
            Err(ParseIdError::InvalidDigits(_))
        ));
        assert_eq!(
            u64::MAX.to_string().parse::<SnowflakeId>(),
            Err(ParseIdError::ReservedBitSet(u64::MAX))
        );
    }

    #[test]
    fn debug_shows_fields() {
        let id = SnowflakeId::from_components(1, 2, 3);
        let debug = format!("{id:?}");
        assert!(debug.contains("timestamp: 1"));
        assert!(debug.contains("node_id: 2"));
        assert!(debug.contains("sequence: 3"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "timestamp overflow")]
    fn timestamp_overflow_panics() {
        SnowflakeId::from_components(MAX_TIMESTAMP + 1, 0, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "node_id overflow")]
    fn node_id_overflow_panics() {
        SnowflakeId::from_components(0, MAX_NODE_ID + 1, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        SnowflakeId::from_components(0, 0, MAX_SEQUENCE + 1);
    }
}
