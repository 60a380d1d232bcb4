//! Element names used by the topology export schema.
//!
//! The export nests `DeviceCollection/Device`, with optional `ImRecord`,
//! `Modules/Module` and `Interfaces/PnInterface/PortList/Port` children under
//! each device. Leaf elements carry their value as text.

/// Root grouping element (`DeviceCollection`).
pub const DEVICE_COLLECTION: &str = "DeviceCollection";
/// One device entry (`Device`).
pub const DEVICE: &str = "Device";

/// Station name (`NameOfStation`).
pub const NAME_OF_STATION: &str = "NameOfStation";
/// IPv4 address (`IpAddress`).
pub const IP_ADDRESS: &str = "IpAddress";
/// Device type string (`DeviceType`).
pub const DEVICE_TYPE: &str = "DeviceType";
/// Device MAC address (`MAC`).
pub const MAC: &str = "MAC";
/// Vendor identifier (`ManufacturerID`).
pub const MANUFACTURER_ID: &str = "ManufacturerID";
/// Vendor name (`ManufacturerName`).
pub const MANUFACTURER_NAME: &str = "ManufacturerName";
/// Controller/device role (`Role`).
pub const ROLE: &str = "Role";
/// Run state (`RunState`).
pub const RUN_STATE: &str = "RunState";
/// Device identifier (`DeviceID`).
pub const DEVICE_ID: &str = "DeviceID";
/// Default gateway (`GatewayIp`).
pub const GATEWAY_IP: &str = "GatewayIp";
/// Subnet mask (`NetworkMask`).
pub const NETWORK_MASK: &str = "NetworkMask";

/// Identification & maintenance sub-record (`ImRecord`).
pub const IM_RECORD: &str = "ImRecord";
pub const ORDER_ID: &str = "OrderID";
pub const SERIAL_NUMBER: &str = "SerialNumber";
pub const HARDWARE_REVISION: &str = "HardwareRevision";
pub const SOFTWARE_REVISION: &str = "SoftwareRevision";
pub const REVISION_COUNTER: &str = "RevisionCounter";
pub const PROFILE_ID: &str = "ProfileID";
pub const PROFILE_DETAILS: &str = "ProfileDetails";
pub const IM_VERSION: &str = "IMVersion";
pub const IM_SUPPORTED: &str = "IMSupported";

/// Module list container (`Modules`).
pub const MODULES: &str = "Modules";
/// One plugged module (`Module`).
pub const MODULE: &str = "Module";
pub const MODULE_IDENT_NUMBER: &str = "ModuleIdentNumber";
pub const MODULE_NAME: &str = "ModuleName";
/// Module order number. Shares its tag with nothing else under `Module`.
pub const ORDER_NUMBER: &str = "OrderNumber";

/// Interface list container (`Interfaces`).
pub const INTERFACES: &str = "Interfaces";
/// PROFINET interface (`PnInterface`).
pub const PN_INTERFACE: &str = "PnInterface";
/// Port list container (`PortList`).
pub const PORT_LIST: &str = "PortList";
/// One physical port (`Port`).
pub const PORT: &str = "Port";

pub const PORT_ID: &str = "PortID";
pub const PORT_DESC: &str = "PortDesc";
pub const REMOTE_PORT_ID: &str = "RemotePortID";
pub const REMOTE_NAME_OF_STATION: &str = "RemoteNameOfStation";
pub const REMOTE_MAC: &str = "RemoteMAC";
pub const OPER_STATUS: &str = "OperStatus";
pub const NETWORK_LOAD_IN: &str = "NetworkLoadIn";
pub const NETWORK_LOAD_OUT: &str = "NetworkLoadOut";
pub const IS_WIRELESS: &str = "IsWireless";
pub const POWER_BUDGET: &str = "PowerBudget";
pub const RX_PORT_ERRORS_FRAMES: &str = "RxPortErrorsFrames";
pub const REM_CHASSIS_ID_SUBTYPE: &str = "RemChassisIdSubtype";
pub const SWITCH_GROUP: &str = "SwitchGroup";
pub const CABLE_DELAY: &str = "CableDelay";
pub const MAU_TYPE: &str = "MauType";

/// Path from a `Device` element to its port elements.
pub const PORT_PATH: [&str; 4] = [INTERFACES, PN_INTERFACE, PORT_LIST, PORT];
/// Path from a `Device` element to its module elements.
pub const MODULE_PATH: [&str; 2] = [MODULES, MODULE];
