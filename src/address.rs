//! Pod address discovery.
//!
//! The message body names the pod by its IPv4 address. The address comes
//! from, in order:
//!
//! 1. an explicit override (`POD_IP`, usually injected by the Kubernetes
//!    Downward API via `fieldRef: status.podIP`);
//! 2. the interface named by `POD_INTERFACE`, if it carries a usable address;
//! 3. the first usable address on any interface, interfaces taken in name
//!    order.
//!
//! "Usable" means IPv4 and not loopback, link-local, unspecified or broadcast.
//! Discovery reads the interface table; it never opens a socket.

use std::net::{IpAddr, Ipv4Addr};

use sysinfo::Networks;
use tracing::debug;

use crate::error::Error;

/// Resolves the address to report, once, at startup.
pub fn resolve(override_ip: Option<&str>, preferred: Option<&str>) -> Result<Ipv4Addr, Error> {
    if let Some(ip) = override_ip.map(str::trim).filter(|s| !s.is_empty()) {
        return ip.parse().map_err(|_| Error::InvalidAddr(ip.to_owned()));
    }
    discover(preferred)
}

/// Enumerates the host's interfaces and picks an address.
pub fn discover(preferred: Option<&str>) -> Result<Ipv4Addr, Error> {
    let networks = Networks::new_with_refreshed_list();
    let candidates = networks.list().iter().flat_map(|(name, data)| {
        data.ip_networks().iter().map(move |net| (name.as_str(), net.addr))
    });
    select(candidates, preferred).ok_or(Error::NoAddress)
}

/// Picks an address from `(interface, address)` pairs.
pub fn select<'a, I>(candidates: I, preferred: Option<&str>) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = (&'a str, IpAddr)>,
{
    let mut usable: Vec<(&str, Ipv4Addr)> = candidates
        .into_iter()
        .filter_map(|(name, addr)| match addr {
            IpAddr::V4(v4) if is_usable(v4) => Some((name, v4)),
            _ => None,
        })
        .collect();
    usable.sort();
    debug!(?usable, "interface addresses");

    preferred
        .and_then(|want| usable.iter().find(|(name, _)| *name == want))
        .or_else(|| usable.first())
        .map(|&(_, addr)| addr)
}

fn is_usable(addr: Ipv4Addr) -> bool {
    !(addr.is_loopback() || addr.is_link_local() || addr.is_unspecified() || addr.is_broadcast())
}
