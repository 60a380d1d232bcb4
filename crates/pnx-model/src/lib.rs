//! Hierarchical extractor: turns a parsed topology export into device, port
//! and module records.
//!
//! ```rust
//! use pnx_model::{extract, ExtractOptions};
//!
//! let xml = "<Export><DeviceCollection><Device>\
//!     <NameOfStation>SW1</NameOfStation>\
//! </Device></DeviceCollection></Export>";
//! let root = pnx_xml::parse(xml).expect("parse");
//! let inventory = extract(&root, &ExtractOptions::default()).expect("extract");
//! assert_eq!(inventory.devices[0].name(), "SW1");
//! assert_eq!(inventory.row_count(), 1);
//! ```

pub mod records;
pub mod schema;

use pnx_tags as tags;
use pnx_xml::Element;
use thiserror::Error;
use tracing::{debug, warn};

pub use records::{DeviceKey, DeviceRecord, ImRecord, ModuleRecord, PortRecord};
pub use schema::{DeviceField, Field, Fields, ImField, ModuleField, PortField};

/// Module slots kept per device unless configured otherwise.
pub const DEFAULT_MODULE_LIMIT: usize = 3;

/// Structural validation failures, reported before any extraction work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// No `DeviceCollection` element directly below the document root.
    #[error("DeviceCollection element not found")]
    MissingCollection,
    /// The collection holds no `Device` entries.
    #[error("DeviceCollection contains no Device entries")]
    EmptyCollection,
}

/// Extractor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Maximum modules kept per device; `None` keeps all of them.
    pub module_limit: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            module_limit: Some(DEFAULT_MODULE_LIMIT),
        }
    }
}

/// Every device of one export, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub devices: Vec<DeviceRecord>,
}

impl Inventory {
    pub fn port_count(&self) -> usize {
        self.devices.iter().map(|d| d.ports.len()).sum()
    }

    pub fn module_count(&self) -> usize {
        self.devices.iter().map(|d| d.modules.len()).sum()
    }

    /// Largest number of modules kept for any single device.
    pub fn max_modules(&self) -> usize {
        self.devices
            .iter()
            .map(|d| d.modules.len())
            .max()
            .unwrap_or(0)
    }

    /// Rows of the flattened table: one per port, or one for a bare device.
    pub fn row_count(&self) -> usize {
        self.devices.iter().map(|d| d.ports.len().max(1)).sum()
    }
}

/// Locate the `DeviceCollection` and make sure it holds at least one device.
///
/// The collection is accepted either as a direct child of the root or as the
/// root itself.
pub fn validate(root: &Element) -> Result<&Element, ModelError> {
    let collection = if root.name == tags::DEVICE_COLLECTION {
        root
    } else {
        let mut found = root.children_named(tags::DEVICE_COLLECTION);
        let first = found.next().ok_or(ModelError::MissingCollection)?;
        let extra = found.count();
        if extra > 0 {
            warn!(extra, "multiple DeviceCollection elements; using the first");
        }
        first
    };
    if collection.child(tags::DEVICE).is_none() {
        return Err(ModelError::EmptyCollection);
    }
    Ok(collection)
}

/// Validate the document, then read every device of the collection.
pub fn extract(root: &Element, options: &ExtractOptions) -> Result<Inventory, ModelError> {
    let collection = validate(root)?;
    let devices: Vec<DeviceRecord> = collection
        .children_named(tags::DEVICE)
        .map(|node| DeviceRecord::from_element(node, options.module_limit))
        .collect();
    let inventory = Inventory { devices };
    debug!(
        devices = inventory.devices.len(),
        ports = inventory.port_count(),
        modules = inventory.module_count(),
        "extracted inventory"
    );
    Ok(inventory)
}
