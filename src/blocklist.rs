//! Blocked hostnames and IP ranges.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

/// Hostnames that always name the local host.
const LOOPBACK_HOSTNAMES: &[&str] = &["localhost"];

/// A network the classifier refuses to fetch from.
///
/// Loopback is reported separately through
/// [`Error::LoopbackBlocked`](crate::Error::LoopbackBlocked) and has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockedRange {
    /// `0.0.0.0/8`, "this network".
    ThisNetwork,
    /// `10.0.0.0/8`
    Private10,
    /// `172.16.0.0/12`
    Private172,
    /// `192.168.0.0/16`
    Private192,
    /// `169.254.0.0/16`, IPv4 link-local. Contains the cloud metadata endpoint.
    LinkLocalV4,
    /// `::/128`
    Unspecified,
    /// `fc00::/7`
    UniqueLocalV6,
    /// `fe80::/10`
    LinkLocalV6,
    /// A range added through [`PolicyBuilder::block_cidr`](crate::PolicyBuilder::block_cidr).
    Custom(IpNet),
}

impl BlockedRange {
    /// The ranges checked for every IPv4 address, in order.
    pub const IPV4: [BlockedRange; 5] = [
        Self::ThisNetwork,
        Self::Private10,
        Self::Private172,
        Self::Private192,
        Self::LinkLocalV4,
    ];

    /// The ranges checked for every IPv6 address, in order.
    pub const IPV6: [BlockedRange; 3] = [Self::Unspecified, Self::UniqueLocalV6, Self::LinkLocalV6];

    /// The network this range covers.
    pub fn net(&self) -> IpNet {
        match *self {
            Self::ThisNetwork => v4(0, 0, 0, 0, 8),
            Self::Private10 => v4(10, 0, 0, 0, 8),
            Self::Private172 => v4(172, 16, 0, 0, 12),
            Self::Private192 => v4(192, 168, 0, 0, 16),
            Self::LinkLocalV4 => v4(169, 254, 0, 0, 16),
            Self::Unspecified => v6(0, 128),
            Self::UniqueLocalV6 => v6(0xfc00, 7),
            Self::LinkLocalV6 => v6(0xfe80, 10),
            Self::Custom(net) => net,
        }
    }

    /// Check whether `ip` falls inside this range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.net().contains(&ip)
    }
}

impl fmt::Display for BlockedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net())
    }
}

fn v4(a: u8, b: u8, c: u8, d: u8, prefix: u8) -> IpNet {
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(a, b, c, d), prefix))
}

fn v6(first_segment: u16, prefix: u8) -> IpNet {
    IpNet::V6(Ipv6Net::new_assert(
        Ipv6Addr::new(first_segment, 0, 0, 0, 0, 0, 0, 0),
        prefix,
    ))
}

/// Check if a normalized (lowercase) hostname names the local host.
pub(crate) fn is_loopback_hostname(host: &str) -> bool {
    LOOPBACK_HOSTNAMES
        .iter()
        .any(|&name| host == name || host.ends_with(&format!(".{}", name)))
}

/// Check if an IP address refers to the local host.
pub(crate) fn is_loopback_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => ipv4.is_loopback(),
        IpAddr::V6(ipv6) => {
            ipv6.is_loopback() || embedded_ipv4(ipv6).is_some_and(|ipv4| ipv4.is_loopback())
        }
    }
}

/// Find the built-in range that blocks `ip`, if any.
pub(crate) fn blocked_range(ip: IpAddr) -> Option<BlockedRange> {
    match ip {
        IpAddr::V4(ipv4) => blocked_ipv4_range(ipv4),
        IpAddr::V6(ipv6) => blocked_ipv6_range(ipv6),
    }
}

fn blocked_ipv4_range(ip: Ipv4Addr) -> Option<BlockedRange> {
    BlockedRange::IPV4
        .into_iter()
        .find(|range| range.contains(IpAddr::V4(ip)))
}

fn blocked_ipv6_range(ip: Ipv6Addr) -> Option<BlockedRange> {
    if ip.is_unspecified() {
        return Some(BlockedRange::Unspecified);
    }

    if let Some(ipv4) = embedded_ipv4(ip) {
        return blocked_ipv4_range(ipv4);
    }

    BlockedRange::IPV6
        .into_iter()
        .find(|range| range.contains(IpAddr::V6(ip)))
}

/// Extract an IPv4 address carried inside an IPv6 one.
///
/// Handles IPv4-mapped (`::ffff:a.b.c.d`) and the deprecated
/// IPv4-compatible (`::a.b.c.d`) forms. `::` and `::1` are not treated as
/// embedding anything.
pub(crate) fn embedded_ipv4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(ipv4) = ip.to_ipv4_mapped() {
        return Some(ipv4);
    }

    let segments = ip.segments();
    if segments[0..6] == [0, 0, 0, 0, 0, 0] && (segments[6] != 0 || segments[7] > 1) {
        return Some(Ipv4Addr::new(
            (segments[6] >> 8) as u8,
            segments[6] as u8,
            (segments[7] >> 8) as u8,
            segments[7] as u8,
        ));
    }

    None
}
