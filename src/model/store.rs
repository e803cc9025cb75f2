//! Device Record Store.
//!
//! Holds the parsed devices plus the flattened interface index used by
//! topology construction and validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::device::{Device, DeviceKind, Interface};

/// Flattened interface entry, keyed `"<device>_<interface>"` in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// Owning device name
    pub device: String,
    /// Interface name on the owning device
    pub interface: String,
    #[serde(flatten)]
    pub settings: Interface,
}

/// Serialized form produced by the configuration parser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedRecords {
    pub devices: BTreeMap<String, Device>,
    #[serde(default)]
    pub interfaces: BTreeMap<String, InterfaceRecord>,
}

/// Immutable-after-load collection of devices and interfaces
#[derive(Debug, Clone, Default)]
pub struct DeviceStore {
    devices: BTreeMap<String, Device>,
    interfaces: BTreeMap<String, InterfaceRecord>,
}

impl DeviceStore {
    /// Build a store from devices, deriving the flattened interface index
    pub fn from_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let devices: BTreeMap<String, Device> = devices
            .into_iter()
            .map(|device| (device.name.clone(), device))
            .collect();
        let interfaces = flatten_interfaces(&devices);
        Self { devices, interfaces }
    }

    /// Build a store from parser output.
    ///
    /// Device names default to their map key. The parser's flattened
    /// interface map is used as-is when present, otherwise derived.
    pub fn from_records(records: ParsedRecords) -> Self {
        let devices: BTreeMap<String, Device> = records
            .devices
            .into_iter()
            .map(|(key, mut device)| {
                if device.name.is_empty() {
                    device.name = key.clone();
                }
                for (if_name, iface) in device.interfaces.iter_mut() {
                    if iface.name.is_empty() {
                        iface.name = if_name.clone();
                    }
                }
                (key, device)
            })
            .collect();

        let interfaces = if records.interfaces.is_empty() {
            flatten_interfaces(&devices)
        } else {
            records
                .interfaces
                .into_iter()
                .map(|(key, mut record)| {
                    if record.settings.name.is_empty() {
                        record.settings.name = record.interface.clone();
                    }
                    (key, record)
                })
                .collect()
        };

        log::debug!(
            "Loaded {} devices and {} addressed interfaces",
            devices.len(),
            interfaces.len()
        );

        Self { devices, interfaces }
    }

    /// Serialize back to the parser's record format
    pub fn to_records(&self) -> ParsedRecords {
        ParsedRecords {
            devices: self.devices.clone(),
            interfaces: self.interfaces.clone(),
        }
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Devices in name order
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Flattened interfaces in key order
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceRecord> {
        self.interfaces.values()
    }

    /// Effective kind of a device, if the device exists
    pub fn kind_of(&self, name: &str) -> Option<DeviceKind> {
        self.devices.get(name).map(Device::kind)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Mirror the parser: one entry per interface that carries an IP address
fn flatten_interfaces(devices: &BTreeMap<String, Device>) -> BTreeMap<String, InterfaceRecord> {
    let mut interfaces = BTreeMap::new();
    for device in devices.values() {
        for (if_name, iface) in &device.interfaces {
            if !iface.has_ip() {
                continue;
            }
            interfaces.insert(
                format!("{}_{}", device.name, if_name),
                InterfaceRecord {
                    device: device.name.clone(),
                    interface: if_name.clone(),
                    settings: iface.clone(),
                },
            );
        }
    }
    interfaces
}
