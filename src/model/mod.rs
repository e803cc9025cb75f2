//! Device Record Store.
//!
//! Structured devices and interfaces as produced by the configuration-dump
//! parser. Everything downstream (topology, validation, load estimation and
//! simulation) reads from a [`DeviceStore`].

pub mod device;
pub mod store;

pub use device::{
    Device, DeviceKind, Interface, InterfaceStatus, RoutingProtocol, Vlan, DEFAULT_BANDWIDTH,
    DEFAULT_MTU,
};
pub use store::{DeviceStore, InterfaceRecord, ParsedRecords};
