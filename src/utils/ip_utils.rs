//! IPv4 helpers for interface addressing.
//!
//! Addresses and masks arrive as text extracted from configuration dumps, so
//! every helper here is lenient: anything that does not parse yields `None`
//! (or `false`) instead of an error.

use std::net::Ipv4Addr;

/// Check if a string is a valid IPv4 address
pub fn is_valid_ipv4(ip: &str) -> bool {
    parse_ipv4(ip).is_some()
}

/// Parse an IPv4 address, tolerating surrounding whitespace
pub fn parse_ipv4(ip: &str) -> Option<Ipv4Addr> {
    ip.trim().parse::<Ipv4Addr>().ok()
}

/// Parse a subnet mask into its prefix length.
///
/// Accepts dotted-quad masks (`255.255.255.0`) and prefix lengths with or
/// without a leading slash (`24`, `/24`). Dotted masks must be contiguous.
pub fn parse_prefix_len(mask: &str) -> Option<u8> {
    let mask = mask.trim();
    let bare = mask.strip_prefix('/').unwrap_or(mask);

    if let Ok(len) = bare.parse::<u8>() {
        return (len <= 32).then_some(len);
    }

    let bits = u32::from(bare.parse::<Ipv4Addr>().ok()?);
    let len = bits.leading_ones();
    // Contiguous masks have no set bits after the leading run
    if bits.checked_shl(len).unwrap_or(0) != 0 {
        return None;
    }
    Some(len as u8)
}

/// Compute the network address of `ip` under a prefix length
pub fn network_address(ip: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    let mask = if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len.min(32)))
    };
    Ipv4Addr::from(u32::from(ip) & mask)
}

/// Check whether two addresses fall in the same network under `mask`.
///
/// Only the single supplied mask is applied to both addresses; the caller
/// decides whose mask that is. Unparseable input is never the same network.
pub fn is_same_network(ip1: &str, ip2: &str, mask: &str) -> bool {
    match (parse_ipv4(ip1), parse_ipv4(ip2), parse_prefix_len(mask)) {
        (Some(a), Some(b), Some(len)) => network_address(a, len) == network_address(b, len),
        _ => false,
    }
}

/// Network grouping key `(network address, prefix length)` for an interface
pub fn network_key(ip: &str, mask: &str) -> Option<(Ipv4Addr, u8)> {
    let addr = parse_ipv4(ip)?;
    let len = parse_prefix_len(mask)?;
    Some((network_address(addr, len), len))
}

/// Returns true when the address parses and its last octet is exactly 1
pub fn is_gateway_style(ip: &str) -> bool {
    parse_ipv4(ip).is_some_and(|addr| addr.octets()[3] == 1)
}
