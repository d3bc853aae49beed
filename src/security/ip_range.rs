//! Private and reserved address ranges.
//!
//! IPv4 addresses are packed big-endian into a `u64` (one byte per octet),
//! IPv6 into a `u128`. Ranges are closed intervals `[start, end]`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Closed interval over packed addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange<T> {
    pub start: T,
    pub end: T,
}

impl<T> IpRange<T> {
    pub const fn new(start: T, end: T) -> Self {
        Self { start, end }
    }
}

impl<T: PartialOrd> IpRange<T> {
    pub fn contains(&self, value: T) -> bool {
        self.start <= value && value <= self.end
    }
}

const fn v4(a: u8, b: u8, c: u8, d: u8) -> u64 {
    u32::from_be_bytes([a, b, c, d]) as u64
}

const fn v6(segments: [u16; 8]) -> u128 {
    let [a, b, c, d, e, f, g, h] = segments;
    u128::from_be_bytes(Ipv6Addr::new(a, b, c, d, e, f, g, h).octets())
}

/// Private, loopback, link-local, shared, multicast and reserved IPv4 space.
///
/// Documentation ranges (TEST-NET-1/2/3) are deliberately absent.
pub static PRIVATE_IPV4_RANGES: &[IpRange<u64>] = &[
    // 0.0.0.0/8 "this network"
    IpRange::new(v4(0, 0, 0, 0), v4(0, 255, 255, 255)),
    // 10.0.0.0/8
    IpRange::new(v4(10, 0, 0, 0), v4(10, 255, 255, 255)),
    // 100.64.0.0/10 carrier-grade NAT
    IpRange::new(v4(100, 64, 0, 0), v4(100, 127, 255, 255)),
    // 127.0.0.0/8 loopback
    IpRange::new(v4(127, 0, 0, 0), v4(127, 255, 255, 255)),
    // 169.254.0.0/16 link-local
    IpRange::new(v4(169, 254, 0, 0), v4(169, 254, 255, 255)),
    // 172.16.0.0/12
    IpRange::new(v4(172, 16, 0, 0), v4(172, 31, 255, 255)),
    // 192.0.0.0/24 IETF protocol assignments
    IpRange::new(v4(192, 0, 0, 0), v4(192, 0, 0, 255)),
    // 192.168.0.0/16
    IpRange::new(v4(192, 168, 0, 0), v4(192, 168, 255, 255)),
    // 198.18.0.0/15 benchmarking
    IpRange::new(v4(198, 18, 0, 0), v4(198, 19, 255, 255)),
    // 224.0.0.0/4 multicast, 240.0.0.0/4 reserved, broadcast
    IpRange::new(v4(224, 0, 0, 0), v4(255, 255, 255, 255)),
];

/// Non-global IPv6 space. IPv4-mapped addresses are checked against the IPv4 table.
pub static PRIVATE_IPV6_RANGES: &[IpRange<u128>] = &[
    // :: unspecified and ::1 loopback
    IpRange::new(v6([0, 0, 0, 0, 0, 0, 0, 0]), v6([0, 0, 0, 0, 0, 0, 0, 1])),
    // fc00::/7 unique local
    IpRange::new(
        v6([0xfc00, 0, 0, 0, 0, 0, 0, 0]),
        v6([0xfdff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff]),
    ),
    // fe80::/10 link-local
    IpRange::new(
        v6([0xfe80, 0, 0, 0, 0, 0, 0, 0]),
        v6([0xfebf, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff]),
    ),
    // ff00::/8 multicast
    IpRange::new(
        v6([0xff00, 0, 0, 0, 0, 0, 0, 0]),
        v6([0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff]),
    ),
];

/// Pack an IPv4 address big-endian, one byte per octet.
pub fn pack_ipv4(ip: Ipv4Addr) -> u64 {
    u32::from_be_bytes(ip.octets()) as u64
}

/// Pack an IPv6 address big-endian.
pub fn pack_ipv6(ip: Ipv6Addr) -> u128 {
    u128::from_be_bytes(ip.octets())
}

pub fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let packed = pack_ipv4(ip);
    PRIVATE_IPV4_RANGES.iter().any(|range| range.contains(packed))
}

pub fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_private_ipv4(mapped);
    }
    let packed = pack_ipv6(ip);
    PRIVATE_IPV6_RANGES.iter().any(|range| range.contains(packed))
}

/// True if the address falls inside any private or reserved range.
pub fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_ipv4(*v4),
        IpAddr::V6(v6) => is_private_ipv6(*v6),
    }
}
