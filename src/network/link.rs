//! Network link detection from the host's interface table.

use super::NetworkLink;
use log::debug;
use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;

/// Considers the network available when an interface is up, running and
/// holds an IPv4 address.
///
/// With no interface name configured, any non-loopback interface counts.
#[derive(Debug, Clone, Default)]
pub struct InterfaceLink {
    interface_name: Option<String>,
}

impl InterfaceLink {
    pub fn new(interface_name: Option<String>) -> Self {
        Self { interface_name }
    }

    fn accepts(&self, name: &str, flags: InterfaceFlags) -> bool {
        if let Some(wanted) = &self.interface_name
            && wanted != name
        {
            return false;
        }
        !flags.contains(InterfaceFlags::IFF_LOOPBACK)
            && flags.contains(InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING)
    }
}

impl NetworkLink for InterfaceLink {
    fn is_available(&self) -> bool {
        let Ok(addrs) = getifaddrs() else {
            return false;
        };

        for ifaddr in addrs {
            if !self.accepts(&ifaddr.interface_name, ifaddr.flags) {
                continue;
            }
            if let Some(addr) = ifaddr.address
                && let Some(sockaddr) = addr.as_sockaddr_in()
            {
                debug!(
                    "Network link up on '{}' ({})",
                    ifaddr.interface_name,
                    sockaddr.ip()
                );
                return true;
            }
        }

        false
    }
}
