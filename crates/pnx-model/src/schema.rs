//! Field tables of the export schema.
//!
//! Each record kind has one enum listing its fields in canonical order and the
//! element name each field is read from. [`Fields`] stores one string per
//! field; absent elements are stored as `""`.

use std::fmt;
use std::marker::PhantomData;

use pnx_tags as tags;
use pnx_xml::{lookup, Element};

/// A field enum of one record kind.
pub trait Field: Copy + fmt::Debug + 'static {
    /// Every field, in canonical order.
    const ALL: &'static [Self];

    /// Element name the value is read from.
    fn tag(self) -> &'static str;

    /// Position of the field inside [`Field::ALL`].
    fn index(self) -> usize;
}

macro_rules! field_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $tag:expr,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl Field for $name {
            const ALL: &'static [$name] = &[$($name::$variant,)+];

            fn tag(self) -> &'static str {
                match self {
                    $($name::$variant => $tag,)+
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

field_table! {
    /// Fields read directly below `Device`.
    DeviceField {
        NameOfStation => tags::NAME_OF_STATION,
        IpAddress => tags::IP_ADDRESS,
        DeviceType => tags::DEVICE_TYPE,
        Mac => tags::MAC,
        ManufacturerId => tags::MANUFACTURER_ID,
        ManufacturerName => tags::MANUFACTURER_NAME,
        Role => tags::ROLE,
        RunState => tags::RUN_STATE,
        DeviceId => tags::DEVICE_ID,
        GatewayIp => tags::GATEWAY_IP,
        NetworkMask => tags::NETWORK_MASK,
    }
}

field_table! {
    /// Fields read below `Device/ImRecord`.
    ImField {
        OrderId => tags::ORDER_ID,
        SerialNumber => tags::SERIAL_NUMBER,
        HardwareRevision => tags::HARDWARE_REVISION,
        SoftwareRevision => tags::SOFTWARE_REVISION,
        RevisionCounter => tags::REVISION_COUNTER,
        ProfileId => tags::PROFILE_ID,
        ProfileDetails => tags::PROFILE_DETAILS,
        ImVersion => tags::IM_VERSION,
        ImSupported => tags::IM_SUPPORTED,
    }
}

field_table! {
    /// Fields read below `Device/Modules/Module`.
    ModuleField {
        IdentNumber => tags::MODULE_IDENT_NUMBER,
        Name => tags::MODULE_NAME,
        OrderNumber => tags::ORDER_NUMBER,
    }
}

field_table! {
    /// Fields read below `.../PortList/Port`.
    PortField {
        PortId => tags::PORT_ID,
        PortDesc => tags::PORT_DESC,
        OperStatus => tags::OPER_STATUS,
        RemotePortId => tags::REMOTE_PORT_ID,
        RemoteNameOfStation => tags::REMOTE_NAME_OF_STATION,
        RemoteMac => tags::REMOTE_MAC,
        /// Telemetry fields; commonly absent in older exports.
        NetworkLoadIn => tags::NETWORK_LOAD_IN,
        NetworkLoadOut => tags::NETWORK_LOAD_OUT,
        IsWireless => tags::IS_WIRELESS,
        PowerBudget => tags::POWER_BUDGET,
        RxPortErrorsFrames => tags::RX_PORT_ERRORS_FRAMES,
        RemChassisIdSubtype => tags::REM_CHASSIS_ID_SUBTYPE,
        SwitchGroup => tags::SWITCH_GROUP,
        CableDelay => tags::CABLE_DELAY,
        MauType => tags::MAU_TYPE,
    }
}

/// One string per field of `F`, never missing.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fields<F: Field> {
    values: Vec<String>,
    _field: PhantomData<F>,
}

impl<F: Field> Fields<F> {
    /// All fields set to `""`.
    pub fn empty() -> Self {
        Fields {
            values: vec![String::new(); F::ALL.len()],
            _field: PhantomData,
        }
    }

    /// Read every field of `F` from the direct children of `node`.
    pub fn from_element(node: &Element) -> Self {
        Self::from_scope(node, &[])
    }

    /// Read every field of `F` below the element reached by `scope`.
    ///
    /// A missing scope element reads as all fields empty.
    pub fn from_scope(node: &Element, scope: &[&str]) -> Self {
        let values = F::ALL
            .iter()
            .map(|field| {
                let path: Vec<&str> = scope.iter().copied().chain([field.tag()]).collect();
                lookup(node, &path).to_string()
            })
            .collect();
        Fields {
            values,
            _field: PhantomData,
        }
    }

    pub fn get(&self, field: F) -> &str {
        self.values
            .get(field.index())
            .map_or("", String::as_str)
    }

    pub fn set(&mut self, field: F, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(field.index()) {
            *slot = value.into();
        }
    }

    /// Builder-style [`Fields::set`], convenient for fixtures.
    pub fn with(mut self, field: F, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// `(field, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> + '_ {
        F::ALL.iter().copied().zip(self.values.iter().map(String::as_str))
    }

    /// Whether every field is empty.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(String::is_empty)
    }
}

impl<F: Field> Default for Fields<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Field> fmt::Debug for Fields<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().filter(|(_, value)| !value.is_empty()))
            .finish()
    }
}
