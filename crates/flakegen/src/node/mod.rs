mod interface;
#[cfg(all(unix, feature = "interface"))]
mod network;
mod random;

pub use interface::*;
#[cfg_attr(docsrs, doc(cfg(all(unix, feature = "interface"))))]
#[cfg(all(unix, feature = "interface"))]
pub use network::*;
pub use random::*;
