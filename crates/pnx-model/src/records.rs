//! Normalized records produced by the extractor.

use pnx_tags as tags;
use pnx_xml::Element;
use tracing::debug;

use crate::schema::{DeviceField, Fields, ImField, ModuleField, PortField};

/// Composite natural key of a device: `(name, ip, mac)`.
///
/// Uniqueness is assumed by the export, not enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceKey {
    pub name: String,
    pub ip_address: String,
    pub mac_address: String,
}

/// Identification & maintenance data attached to a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImRecord {
    pub fields: Fields<ImField>,
}

impl ImRecord {
    pub fn get(&self, field: ImField) -> &str {
        self.fields.get(field)
    }
}

/// A module plugged into a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// 1-based declaration order within the owning device.
    pub position: usize,
    pub fields: Fields<ModuleField>,
}

impl ModuleRecord {
    pub fn from_element(node: &Element, position: usize) -> Self {
        ModuleRecord {
            position,
            fields: Fields::from_element(node),
        }
    }

    pub fn get(&self, field: ModuleField) -> &str {
        self.fields.get(field)
    }
}

/// A physical port of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    /// Station name of the owning device.
    pub device_name: String,
    pub fields: Fields<PortField>,
}

impl PortRecord {
    pub fn from_element(node: &Element, device_name: &str) -> Self {
        PortRecord {
            device_name: device_name.to_string(),
            fields: Fields::from_element(node),
        }
    }

    pub fn get(&self, field: PortField) -> &str {
        self.fields.get(field)
    }

    pub fn port_id(&self) -> &str {
        self.get(PortField::PortId)
    }
}

/// One `Device` element with everything it owns, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    pub fields: Fields<DeviceField>,
    pub im: ImRecord,
    pub modules: Vec<ModuleRecord>,
    pub ports: Vec<PortRecord>,
}

impl DeviceRecord {
    /// Read a device, keeping at most `module_limit` modules.
    pub fn from_element(node: &Element, module_limit: Option<usize>) -> Self {
        let fields = Fields::<DeviceField>::from_element(node);
        let name = fields.get(DeviceField::NameOfStation).to_string();
        let im = ImRecord {
            fields: Fields::from_scope(node, &[tags::IM_RECORD]),
        };

        let declared = node.select(&tags::MODULE_PATH);
        let kept = module_limit.map_or(declared.len(), |limit| declared.len().min(limit));
        if kept < declared.len() {
            debug!(
                device = %name,
                declared = declared.len(),
                kept,
                "dropping modules beyond slot limit"
            );
        }
        let modules = declared
            .iter()
            .take(kept)
            .enumerate()
            .map(|(idx, module)| ModuleRecord::from_element(module, idx + 1))
            .collect();

        let ports = node
            .select(&tags::PORT_PATH)
            .into_iter()
            .map(|port| PortRecord::from_element(port, &name))
            .collect();

        DeviceRecord {
            fields,
            im,
            modules,
            ports,
        }
    }

    pub fn get(&self, field: DeviceField) -> &str {
        self.fields.get(field)
    }

    pub fn name(&self) -> &str {
        self.get(DeviceField::NameOfStation)
    }

    pub fn ip_address(&self) -> &str {
        self.get(DeviceField::IpAddress)
    }

    pub fn mac_address(&self) -> &str {
        self.get(DeviceField::Mac)
    }

    pub fn key(&self) -> DeviceKey {
        DeviceKey {
            name: self.name().to_string(),
            ip_address: self.ip_address().to_string(),
            mac_address: self.mac_address().to_string(),
        }
    }

    /// Module at 1-based `position`, if the device declares one there.
    pub fn module(&self, position: usize) -> Option<&ModuleRecord> {
        self.modules.iter().find(|module| module.position == position)
    }

    /// A device without ports still yields one table row.
    pub fn is_bare(&self) -> bool {
        self.ports.is_empty()
    }
}
