use std::net::Ipv4Addr;

use nix::{ifaddrs::getifaddrs, net::if_::InterfaceFlags};

use crate::{NodeIdProvider, RandomNodeId};

/// A provider deriving the node ID from the host's IPv4 address.
///
/// Walks the network interfaces in system order and takes the first
/// non-loopback IPv4 address. Masking then keeps its low 10 bits, so hosts on
/// a `/22` or smaller subnet get distinct node IDs without configuration.
///
/// Falls back to [`RandomNodeId`] when enumeration fails or no interface
/// carries a usable address.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterfaceNodeId;

impl InterfaceNodeId {
    /// Returns the interface name and address this provider would use, if
    /// any.
    pub fn lookup() -> Option<(String, Ipv4Addr)> {
        let addrs = match getifaddrs() {
            Ok(addrs) => addrs,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "failed to enumerate network interfaces");
                return None;
            }
        };

        first_non_loopback(addrs.filter_map(|ifaddr| {
            if ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK) {
                return None;
            }
            let ip = ifaddr.address?.as_sockaddr_in()?.ip();
            Some((ifaddr.interface_name, Ipv4Addr::from(ip)))
        }))
    }
}

impl NodeIdProvider for InterfaceNodeId {
    fn raw_node_id(&self) -> u64 {
        match Self::lookup() {
            Some((_name, ip)) => {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    interface = %_name,
                    %ip,
                    node_id = %crate::NodeId::from_masked(u64::from(u32::from(ip))),
                    "derived node id from interface address"
                );
                u64::from(u32::from(ip))
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!("no usable IPv4 interface, falling back to a random node id");
                RandomNodeId.raw_node_id()
            }
        }
    }
}

fn first_non_loopback(
    candidates: impl IntoIterator<Item = (String, Ipv4Addr)>,
) -> Option<(String, Ipv4Addr)> {
    candidates
        .into_iter()
        .find(|(name, ip)| name != "lo" && !ip.is_loopback() && !ip.is_unspecified())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_NODE_ID;

    fn candidate(name: &str, ip: [u8; 4]) -> (String, Ipv4Addr) {
        (name.to_owned(), Ipv4Addr::from(ip))
    }

    #[test]
    fn skips_loopback() {
        let picked = first_non_loopback([
            candidate("lo", [127, 0, 0, 1]),
            candidate("eth0", [10, 0, 4, 5]),
            candidate("eth1", [192, 168, 1, 9]),
        ]);
        assert_eq!(picked, Some(candidate("eth0", [10, 0, 4, 5])));
    }

    #[test]
    fn none_when_only_loopback() {
        let picked = first_non_loopback([
            candidate("lo", [127, 0, 0, 1]),
            candidate("lo0", [127, 0, 0, 2]),
        ]);
        assert_eq!(picked, None);
    }

    #[test]
    fn low_bits_of_address_become_node_id() {
        let (_, ip) = candidate("eth0", [10, 0, 4, 5]);
        let node_id = crate::NodeId::from_masked(u64::from(u32::from(ip)));
        // 0x0a000405 & 0x3ff
        assert_eq!(node_id.get(), 5);
    }

    #[test]
    fn always_in_range() {
        assert!(InterfaceNodeId.node_id().get() <= MAX_NODE_ID);
    }
}
