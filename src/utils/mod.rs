//! Shared utilities.

pub mod ip_utils;

pub use ip_utils::{is_same_network, network_key, parse_ipv4, parse_prefix_len};
