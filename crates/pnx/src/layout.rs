//! Declared column layouts.
//!
//! A [`Layout`] fixes column order, header labels, where each value comes
//! from, the row order and the columns spanned by merge runs. The four
//! built-in [`Shape`]s are stable contracts; custom layouts can be assembled
//! from [`Column`]s.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use pnx_model::{
    DeviceField, DeviceRecord, Field, ImField, ModuleField, PortField, PortRecord,
    DEFAULT_MODULE_LIMIT,
};
use serde::Serialize;

use crate::ExportError;

/// Built-in output shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Every device, ImRecord, module and port field; document order.
    #[default]
    Wide,
    /// Device and ImRecord fields plus the common port fields; document order.
    Device,
    /// Twelve identity and link columns; sorted.
    Compact,
    /// Bilingual grouped report; sorted.
    Report,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Wide, Shape::Device, Shape::Compact, Shape::Report];

    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Wide => "wide",
            Shape::Device => "device",
            Shape::Compact => "compact",
            Shape::Report => "report",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown shape '{s}' (expected wide, device, compact or report)"))
    }
}

/// Where a column takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Device(DeviceField),
    Im(ImField),
    /// Module at a 1-based slot of the owning device.
    Module {
        slot: usize,
        field: ModuleField,
    },
    Port(PortField),
}

impl Source {
    /// Resolve the value for one `(device, port)` unit; absence reads as `""`.
    pub fn resolve<'a>(&self, device: &'a DeviceRecord, port: Option<&'a PortRecord>) -> &'a str {
        match *self {
            Source::Device(field) => device.get(field),
            Source::Im(field) => device.im.get(field),
            Source::Module { slot, field } => device.module(slot).map_or("", |m| m.get(field)),
            Source::Port(field) => port.map_or("", |p| p.get(field)),
        }
    }

    /// Whether the value is the same for every row of one device.
    pub fn is_device_derived(&self) -> bool {
        !matches!(self, Source::Port(_))
    }
}

/// Visual column groups of the report header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Device,
    Identity,
    Port,
    Module,
}

impl Group {
    pub fn title(self) -> &'static str {
        match self {
            Group::Device => "设备概要 / Device Summary",
            Group::Identity => "设备标识 / Device Identity",
            Group::Port => "端口信息 / Ports",
            Group::Module => "模块信息 / Modules",
        }
    }
}

/// A run of adjacent columns sharing one group title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpan {
    pub title: String,
    pub columns: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub label: String,
    pub source: Source,
    pub group: Group,
}

impl Column {
    pub fn new(label: impl Into<String>, source: Source, group: Group) -> Self {
        Column {
            label: label.into(),
            source,
            group,
        }
    }
}

/// Row order of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// Devices and ports as they appear in the document.
    #[default]
    Document,
    /// Stable sort by `(station name, ip address, port id)` after all rows exist.
    Sorted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// `Module_<n>_*` slots emitted by shapes that carry modules.
    pub module_slots: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            module_slots: DEFAULT_MODULE_LIMIT,
        }
    }
}

const DEVICE_PORT_FIELDS: [PortField; 8] = [
    PortField::PortId,
    PortField::PortDesc,
    PortField::OperStatus,
    PortField::RemotePortId,
    PortField::RemoteNameOfStation,
    PortField::RemoteMac,
    PortField::CableDelay,
    PortField::MauType,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub name: String,
    pub columns: Vec<Column>,
    /// Columns spanned by merge runs; must hold device-derived columns only.
    pub merge_columns: Range<usize>,
    pub order: RowOrder,
    /// Emit a group title row above the header.
    pub group_titles: bool,
}

impl Layout {
    /// Custom layout in document order without merging or group titles.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Layout {
            name: name.into(),
            columns,
            merge_columns: 0..0,
            order: RowOrder::Document,
            group_titles: false,
        }
    }

    pub fn with_merge_columns(mut self, columns: Range<usize>) -> Self {
        self.merge_columns = columns;
        self
    }

    pub fn with_order(mut self, order: RowOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_group_titles(mut self, enabled: bool) -> Self {
        self.group_titles = enabled;
        self
    }

    pub fn for_shape(shape: Shape, options: &LayoutOptions) -> Self {
        match shape {
            Shape::Wide => Self::wide(options),
            Shape::Device => Self::device(),
            Shape::Compact => Self::compact(),
            Shape::Report => Self::report(options),
        }
    }

    /// Device, ImRecord, module slot and port fields under their tag names.
    pub fn wide(options: &LayoutOptions) -> Self {
        let mut columns = device_columns();
        columns.extend(module_columns(options.module_slots));
        let merged = columns.len();
        columns.extend(
            PortField::ALL
                .iter()
                .map(|&field| Column::new(field.tag(), Source::Port(field), Group::Port)),
        );
        Layout::new(Shape::Wide.as_str(), columns).with_merge_columns(0..merged)
    }

    pub fn device() -> Self {
        let mut columns = device_columns();
        let merged = columns.len();
        columns.extend(
            DEVICE_PORT_FIELDS
                .iter()
                .map(|&field| Column::new(field.tag(), Source::Port(field), Group::Port)),
        );
        Layout::new(Shape::Device.as_str(), columns).with_merge_columns(0..merged)
    }

    pub fn compact() -> Self {
        use DeviceField as D;
        use PortField as P;
        let device = [
            ("NameOfStation", D::NameOfStation),
            ("IpAddress", D::IpAddress),
            ("DeviceType", D::DeviceType),
            ("MAC", D::Mac),
            ("ManufacturerName", D::ManufacturerName),
            ("RunState", D::RunState),
        ];
        let port = [
            ("Port_ID", P::PortId),
            ("Port_Desc", P::PortDesc),
            ("Remote_Port_ID", P::RemotePortId),
            ("Remote_Station", P::RemoteNameOfStation),
            ("Remote_MAC", P::RemoteMac),
            ("Port_Status", P::OperStatus),
        ];
        let columns = device
            .into_iter()
            .map(|(label, field)| Column::new(label, Source::Device(field), Group::Device))
            .chain(
                port.into_iter()
                    .map(|(label, field)| Column::new(label, Source::Port(field), Group::Port)),
            )
            .collect();
        Layout::new(Shape::Compact.as_str(), columns)
            .with_merge_columns(0..device.len())
            .with_order(RowOrder::Sorted)
    }

    /// Grouped bilingual report. The identity group repeats the station name
    /// and address labels of the summary group.
    pub fn report(options: &LayoutOptions) -> Self {
        use DeviceField as D;
        use ImField as I;
        use PortField as P;
        let mut columns = vec![
            Column::new("设备名称 / Station", Source::Device(D::NameOfStation), Group::Device),
            Column::new("IP地址 / IP Address", Source::Device(D::IpAddress), Group::Device),
            Column::new("设备类型 / Device Type", Source::Device(D::DeviceType), Group::Device),
            Column::new("MAC地址 / MAC", Source::Device(D::Mac), Group::Device),
            Column::new("制造商 / Manufacturer", Source::Device(D::ManufacturerName), Group::Device),
            Column::new("运行状态 / Run State", Source::Device(D::RunState), Group::Device),
            Column::new("设备名称 / Station", Source::Device(D::NameOfStation), Group::Identity),
            Column::new("IP地址 / IP Address", Source::Device(D::IpAddress), Group::Identity),
            Column::new("订货号 / Order ID", Source::Im(I::OrderId), Group::Identity),
            Column::new("序列号 / Serial No.", Source::Im(I::SerialNumber), Group::Identity),
            Column::new("硬件版本 / HW Rev.", Source::Im(I::HardwareRevision), Group::Identity),
            Column::new("软件版本 / SW Rev.", Source::Im(I::SoftwareRevision), Group::Identity),
        ];
        let merged = columns.len();
        columns.extend([
            Column::new("端口 / Port", Source::Port(P::PortId), Group::Port),
            Column::new("端口描述 / Port Desc.", Source::Port(P::PortDesc), Group::Port),
            Column::new("状态 / Status", Source::Port(P::OperStatus), Group::Port),
            Column::new("对端端口 / Remote Port", Source::Port(P::RemotePortId), Group::Port),
            Column::new(
                "对端设备 / Remote Station",
                Source::Port(P::RemoteNameOfStation),
                Group::Port,
            ),
            Column::new("对端MAC / Remote MAC", Source::Port(P::RemoteMac), Group::Port),
        ]);
        for slot in 1..=options.module_slots {
            columns.push(Column::new(
                format!("模块{slot} / Module {slot}"),
                Source::Module {
                    slot,
                    field: ModuleField::Name,
                },
                Group::Module,
            ));
            columns.push(Column::new(
                format!("模块{slot}订货号 / Module {slot} Order No."),
                Source::Module {
                    slot,
                    field: ModuleField::OrderNumber,
                },
                Group::Module,
            ));
        }
        Layout::new(Shape::Report.as_str(), columns)
            .with_merge_columns(0..merged)
            .with_order(RowOrder::Sorted)
            .with_group_titles(true)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    /// Reject layouts whose merge range is out of bounds or spans port data.
    pub fn check(&self) -> Result<(), ExportError> {
        if self.columns.is_empty() {
            return Err(ExportError::layout(format!("layout '{}' has no columns", self.name)));
        }
        let span = &self.merge_columns;
        if span.start > span.end || span.end > self.columns.len() {
            return Err(ExportError::layout(format!(
                "layout '{}': merge columns {}..{} exceed {} columns",
                self.name,
                span.start,
                span.end,
                self.columns.len()
            )));
        }
        if let Some(column) = self.columns[span.clone()]
            .iter()
            .find(|c| !c.source.is_device_derived())
        {
            return Err(ExportError::layout(format!(
                "layout '{}': merge columns include port column '{}'",
                self.name, column.label
            )));
        }
        Ok(())
    }

    /// For each position, the column whose value is shown there.
    ///
    /// Positions sharing a label all show the value of the last column with
    /// that label.
    pub fn value_owners(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.columns
                    .iter()
                    .rposition(|other| other.label == column.label)
                    .unwrap_or(idx)
            })
            .collect()
    }

    /// Adjacent columns grouped under their titles; empty without a title row.
    pub fn group_spans(&self) -> Vec<GroupSpan> {
        if !self.group_titles {
            return Vec::new();
        }
        let mut spans: Vec<(Group, Range<usize>)> = Vec::new();
        for (idx, column) in self.columns.iter().enumerate() {
            match spans.last_mut() {
                Some((group, range)) if *group == column.group => range.end = idx + 1,
                _ => spans.push((column.group, idx..idx + 1)),
            }
        }
        spans
            .into_iter()
            .map(|(group, columns)| GroupSpan {
                title: group.title().to_string(),
                columns,
            })
            .collect()
    }
}

fn device_columns() -> Vec<Column> {
    DeviceField::ALL
        .iter()
        .map(|&field| Column::new(field.tag(), Source::Device(field), Group::Device))
        .chain(
            ImField::ALL
                .iter()
                .map(|&field| Column::new(field.tag(), Source::Im(field), Group::Identity)),
        )
        .collect()
}

fn module_columns(slots: usize) -> Vec<Column> {
    (1..=slots)
        .flat_map(|slot| {
            ModuleField::ALL.iter().map(move |&field| {
                let suffix = match field {
                    ModuleField::IdentNumber => "IdentNumber",
                    ModuleField::Name => "Name",
                    ModuleField::OrderNumber => "OrderNumber",
                };
                Column::new(
                    format!("Module_{slot}_{suffix}"),
                    Source::Module { slot, field },
                    Group::Module,
                )
            })
        })
        .collect()
}
