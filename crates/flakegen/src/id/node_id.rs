use core::fmt;

use crate::{Error, MAX_NODE_ID, Result};

/// A node ID known to fit the 10-bit node field.
///
/// There are two ways to get one, matching the two ways a generator learns
/// its identity:
///
/// - **Explicit** values are checked with [`TryFrom`] and rejected with
///   [`Error::InvalidConfiguration`] when out of range.
/// - **Derived** values (from a [`NodeIdProvider`]) are reduced into range
///   with [`NodeId::from_masked`], since a hardware-derived value is expected
///   to be wider than the field.
///
/// ```
/// use flakegen::{Error, NodeId};
///
/// assert_eq!(NodeId::try_from(1023_i64).unwrap().get(), 1023);
/// assert!(matches!(
///     NodeId::try_from(-1_i64),
///     Err(Error::InvalidConfiguration { .. })
/// ));
/// assert_eq!(NodeId::from_masked(0x0a00_0405).get(), 0x005);
/// ```
///
/// [`NodeIdProvider`]: crate::NodeIdProvider
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// The largest node ID.
    pub const MAX: Self = Self(MAX_NODE_ID);

    /// Reduces an arbitrary raw value into range by keeping its low bits.
    pub const fn from_masked(raw: u64) -> Self {
        Self(raw & MAX_NODE_ID)
    }

    /// Returns the node ID as an integer in `0..=1023`.
    pub const fn get(self) -> u64 {
        self.0
    }

    fn checked(node_id: i128) -> Result<Self> {
        match u64::try_from(node_id) {
            Ok(value) if value <= MAX_NODE_ID => Ok(Self(value)),
            _ => Err(Error::InvalidConfiguration {
                node_id,
                max: MAX_NODE_ID,
            }),
        }
    }
}

impl TryFrom<i64> for NodeId {
    type Error = Error;

    fn try_from(node_id: i64) -> Result<Self> {
        Self::checked(i128::from(node_id))
    }
}

impl TryFrom<u64> for NodeId {
    type Error = Error;

    fn try_from(node_id: u64) -> Result<Self> {
        Self::checked(i128::from(node_id))
    }
}

impl TryFrom<u16> for NodeId {
    type Error = Error;

    fn try_from(node_id: u16) -> Result<Self> {
        Self::checked(i128::from(node_id))
    }
}

impl From<NodeId> for u64 {
    fn from(node_id: NodeId) -> Self {
        node_id.get()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert_eq!(NodeId::try_from(0_i64).unwrap().get(), 0);
        assert_eq!(NodeId::try_from(1023_i64).unwrap(), NodeId::MAX);
        assert_eq!(NodeId::try_from(512_u64).unwrap().get(), 512);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            NodeId::try_from(-1_i64),
            Err(Error::InvalidConfiguration {
                node_id: -1,
                max: 1023
            })
        );
        assert_eq!(
            NodeId::try_from(1024_i64),
            Err(Error::InvalidConfiguration {
                node_id: 1024,
                max: 1023
            })
        );
        assert!(NodeId::try_from(u64::MAX).is_err());
        assert!(NodeId::try_from(i64::MIN).is_err());
    }

    #[test]
    fn masking_keeps_low_bits() {
        assert_eq!(NodeId::from_masked(1024).get(), 0);
        assert_eq!(NodeId::from_masked(1025).get(), 1);
        assert_eq!(NodeId::from_masked(u64::MAX).get(), 1023);
    }
}
