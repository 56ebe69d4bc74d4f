use crate::{NodeId, Result};

/// A source of raw node IDs, typically derived from host identity.
///
/// Implementations may return any `u64`; the value is reduced into the 10-bit
/// node field by masking, never rejected. A provider must always produce
/// *something*: when its preferred source is unavailable it is expected to
/// fall back on its own (e.g. to a random value).
///
/// Any `Fn() -> u64` is a provider, which makes mocking trivial:
///
/// ```
/// use flakegen::NodeIdProvider;
///
/// let provider = || 0x1_0000_0007_u64;
/// assert_eq!(provider.node_id().get(), 7);
/// ```
pub trait NodeIdProvider {
    /// Returns an unmasked node ID.
    fn raw_node_id(&self) -> u64;

    /// Returns the provider's value reduced into range.
    fn node_id(&self) -> NodeId {
        NodeId::from_masked(self.raw_node_id())
    }
}

impl<F> NodeIdProvider for F
where
    F: Fn() -> u64,
{
    fn raw_node_id(&self) -> u64 {
        self()
    }
}

/// The default derived provider.
///
/// Uses the host's first non-loopback IPv4 address when the `interface`
/// feature is enabled on a unix target, and a random value otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostNodeId;

impl NodeIdProvider for HostNodeId {
    fn raw_node_id(&self) -> u64 {
        #[cfg(all(unix, feature = "interface"))]
        {
            crate::InterfaceNodeId.raw_node_id()
        }
        #[cfg(not(all(unix, feature = "interface")))]
        {
            crate::RandomNodeId.raw_node_id()
        }
    }
}

/// Where a generator's node ID comes from.
///
/// ```
/// use flakegen::{NodeIdSource, RandomNodeId};
///
/// let explicit = NodeIdSource::<RandomNodeId>::Explicit(7);
/// assert_eq!(explicit.resolve().unwrap().get(), 7);
///
/// let derived = NodeIdSource::Derived(|| 4096_u64 + 9);
/// assert_eq!(derived.resolve().unwrap().get(), 9);
///
/// assert!(NodeIdSource::<RandomNodeId>::Explicit(1024).resolve().is_err());
/// ```
#[derive(Clone, Copy, Debug)]
pub enum NodeIdSource<P = HostNodeId> {
    /// A caller-assigned node ID, validated against the field width.
    Explicit(i64),
    /// A node ID obtained from a provider and masked into range.
    Derived(P),
}

impl<P: NodeIdProvider> NodeIdSource<P> {
    /// Resolves the node ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if an explicit node ID is
    /// negative or larger than [`MAX_NODE_ID`]. Derived IDs never fail.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    /// [`MAX_NODE_ID`]: crate::MAX_NODE_ID
    pub fn resolve(&self) -> Result<NodeId> {
        match self {
            Self::Explicit(node_id) => NodeId::try_from(*node_id),
            Self::Derived(provider) => {
                let node_id = provider.node_id();
                #[cfg(feature = "tracing")]
                tracing::debug!(%node_id, "derived node id");
                Ok(node_id)
            }
        }
    }
}

impl Default for NodeIdSource {
    fn default() -> Self {
        Self::Derived(HostNodeId)
    }
}

impl From<Option<i64>> for NodeIdSource {
    /// `Some` is an explicit ID; `None` derives one from the host.
    fn from(node_id: Option<i64>) -> Self {
        node_id.map_or_else(Self::default, Self::Explicit)
    }
}
