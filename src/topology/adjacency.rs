//! Adjacency rules.
//!
//! A shared IP network only becomes a graph edge when the pair of device
//! kinds is allowed to be directly attached. Only infrastructure devices
//! bridge segments: end hosts never connect to each other or straight to a
//! router.

use crate::model::DeviceKind;

/// Returns true if devices of these kinds may share a link (symmetric)
pub fn may_connect(a: DeviceKind, b: DeviceKind) -> bool {
    use DeviceKind::*;

    match (a, b) {
        (Router, Router) => true,
        (Router, Switch) | (Switch, Router) => true,
        (Switch, other) | (other, Switch) => other.is_end_host(),
        _ => false,
    }
}
