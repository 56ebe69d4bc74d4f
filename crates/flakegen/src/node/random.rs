use crate::NodeIdProvider;

/// A provider drawing a fresh random value from the thread-local RNG.
///
/// Two generators using this provider collide on node ID with probability
/// 1/1024, so it is a last resort when nothing better identifies the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomNodeId;

impl NodeIdProvider for RandomNodeId {
    fn raw_node_id(&self) -> u64 {
        rand::random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_NODE_ID;

    #[test]
    fn masked_value_is_in_range() {
        for _ in 0..1_000 {
            assert!(RandomNodeId.node_id().get() <= MAX_NODE_ID);
        }
    }
}
