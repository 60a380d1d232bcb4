//! Flattening of an inventory into rows of a declared layout.
//!
//! Every device yields one row per port, or a single row with empty port
//! columns when it has none. Sorted layouts are sorted once after all rows
//! exist; merge runs are then computed over that final order.
//!
//! Runs are keyed by the device a row came from, not by its identity fields:
//! two devices with equal or blank station name, address and MAC never share
//! a run.

use std::ops::Range;

use pnx_model::{DeviceKey, DeviceRecord, Inventory, PortRecord};
use tracing::debug;

use crate::layout::{GroupSpan, Layout, RowOrder};
use crate::merge::{blank_runs, merge_runs, Emission, MergeRun};
use crate::sink::Header;
use crate::ExportError;

/// Document position of the owning device, the device and one of its ports.
type Unit<'a> = (usize, &'a DeviceRecord, Option<&'a PortRecord>);

/// One output row: its parent identity and one value per layout column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    key: DeviceKey,
    device: usize,
    values: Vec<String>,
}

impl FlatRow {
    fn build(layout: &Layout, owners: &[usize], (ordinal, device, port): Unit<'_>) -> Self {
        let values = owners
            .iter()
            .map(|&owner| {
                layout.columns[owner]
                    .source
                    .resolve(device, port)
                    .to_string()
            })
            .collect();
        FlatRow {
            key: device.key(),
            device: ordinal,
            values,
        }
    }

    pub fn key(&self) -> &DeviceKey {
        &self.key
    }

    /// Document position of the device this row belongs to.
    pub fn device(&self) -> usize {
        self.device
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, column: usize) -> &str {
        self.values.get(column).map_or("", String::as_str)
    }
}

/// Finished rows plus the merge runs over them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    labels: Vec<String>,
    groups: Vec<GroupSpan>,
    rows: Vec<FlatRow>,
    runs: Vec<MergeRun>,
    merge_columns: Range<usize>,
}

impl Table {
    pub fn build(inventory: &Inventory, layout: &Layout) -> Result<Table, ExportError> {
        layout.check()?;

        let mut units: Vec<Unit<'_>> = inventory
            .devices
            .iter()
            .enumerate()
            .flat_map(|(ordinal, device)| {
                let bare = device.is_bare().then_some(None);
                bare.into_iter()
                    .chain(device.ports.iter().map(Some))
                    .map(move |port| (ordinal, device, port))
            })
            .collect();
        if layout.order == RowOrder::Sorted {
            units.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        }

        let owners = layout.value_owners();
        let rows: Vec<FlatRow> = units
            .into_iter()
            .map(|unit| FlatRow::build(layout, &owners, unit))
            .collect();
        let keys: Vec<usize> = rows.iter().map(FlatRow::device).collect();
        let runs = merge_runs(&keys, layout.merge_columns.clone());

        debug!(
            layout = %layout.name,
            rows = rows.len(),
            runs = runs.len(),
            "flattened inventory"
        );
        Ok(Table {
            labels: layout.labels(),
            groups: layout.group_spans(),
            rows,
            runs,
            merge_columns: layout.merge_columns.clone(),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn groups(&self) -> &[GroupSpan] {
        &self.groups
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn runs(&self) -> &[MergeRun] {
        &self.runs
    }

    pub fn merge_columns(&self) -> Range<usize> {
        self.merge_columns.clone()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Header<'_> {
        Header {
            labels: &self.labels,
            groups: &self.groups,
        }
    }

    /// Value at `row` under the first column labelled `label`.
    pub fn value(&self, row: usize, label: &str) -> Option<&str> {
        let column = self.labels.iter().position(|l| l == label)?;
        self.rows.get(row).map(|r| r.get(column))
    }

    /// Spanned values of a run, taken from its first row.
    pub fn representative(&self, run: &MergeRun) -> &[String] {
        self.rows
            .get(run.first_row())
            .and_then(|row| row.values.get(run.columns.clone()))
            .unwrap_or(&[])
    }

    /// Row values as handed to a sink in the given mode.
    pub fn emitted_rows(&self, emission: Emission) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = self.rows.iter().map(|r| r.values.clone()).collect();
        if emission == Emission::Spanned {
            blank_runs(&mut rows, &self.runs);
        }
        rows
    }
}

fn sort_key<'a>(unit: &Unit<'a>) -> (&'a str, &'a str, &'a str) {
    let (_, device, port) = *unit;
    (
        device.name(),
        device.ip_address(),
        port.map_or("", |p| p.port_id()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Column, Group, LayoutOptions, Shape, Source};
    use pnx_model::{extract, DeviceField, ExtractOptions, ImField, PortField};

    const EXPORT: &str = r#"
        <Export><DeviceCollection>
            <Device>
                <NameOfStation>sw-b</NameOfStation>
                <IpAddress>10.0.0.2</IpAddress>
                <ImRecord><OrderID>6GK5</OrderID></ImRecord>
                <Modules>
                    <Module><ModuleName>HEAD</ModuleName></Module>
                </Modules>
                <Interfaces><PnInterface><PortList>
                    <Port><PortID>port-002</PortID></Port>
                    <Port><PortID>port-001</PortID><OperStatus>up</OperStatus></Port>
                </PortList></PnInterface></Interfaces>
            </Device>
            <Device>
                <NameOfStation>io-a</NameOfStation>
                <IpAddress>10.0.0.9</IpAddress>
            </Device>
            <Device>
                <NameOfStation>io-a</NameOfStation>
                <IpAddress>10.0.0.3</IpAddress>
                <Interfaces/>
            </Device>
        </DeviceCollection></Export>
    "#;

    fn inventory() -> Inventory {
        let root = pnx_xml::parse(EXPORT).expect("parse");
        extract(&root, &ExtractOptions::default()).expect("extract")
    }

    fn build(shape: Shape) -> Table {
        let layout = Layout::for_shape(shape, &LayoutOptions::default());
        Table::build(&inventory(), &layout).expect("flatten")
    }

    #[test]
    fn wide_rows_keep_document_order() {
        let table = build(Shape::Wide);
        assert_eq!(table.len(), 4);
        let ports: Vec<&str> = (0..4).filter_map(|r| table.value(r, "PortID")).collect();
        assert_eq!(ports, ["port-002", "port-001", "", ""]);
        assert_eq!(table.value(0, "OrderID"), Some("6GK5"));
        assert_eq!(table.value(1, "Module_1_Name"), Some("HEAD"));
        assert_eq!(table.value(1, "Module_2_Name"), Some(""));
        assert_eq!(table.value(2, "NameOfStation"), Some("io-a"));
    }

    #[test]
    fn every_row_has_every_column() {
        for shape in Shape::ALL {
            let table = build(shape);
            assert!(
                table.rows().iter().all(|row| row.values().len() == table.labels().len()),
                "{shape}"
            );
        }
    }

    #[test]
    fn compact_rows_sort_by_name_ip_and_port() {
        let table = build(Shape::Compact);
        let order: Vec<(&str, &str)> = table
            .rows()
            .iter()
            .map(|row| (row.get(1), row.get(6)))
            .collect();
        assert_eq!(
            order,
            [
                ("10.0.0.3", ""),
                ("10.0.0.9", ""),
                ("10.0.0.2", "port-001"),
                ("10.0.0.2", "port-002"),
            ]
        );
        assert_eq!(table.value(2, "Port_Status"), Some("up"));
    }

    #[test]
    fn runs_cover_multi_port_devices_only() {
        let table = build(Shape::Compact);
        assert_eq!(table.runs().len(), 1);
        let run = &table.runs()[0];
        assert_eq!(run.rows, 2..4);
        assert_eq!(run.columns, 0..6);
        assert_eq!(table.representative(run)[0], "sw-b");

        let spanned = table.emitted_rows(Emission::Spanned);
        assert_eq!(spanned[3][0], "");
        assert_eq!(spanned[3][6], "port-002");
        assert_eq!(spanned[0][0], "io-a");
    }

    #[test]
    fn same_name_different_address_is_a_new_run() {
        let table = build(Shape::Compact);
        assert_eq!(table.rows()[0].key().name, table.rows()[1].key().name);
        assert!(table.runs().iter().all(|run| !run.rows.contains(&0)));
    }

    #[test]
    fn devices_without_identity_never_share_a_run() {
        let root = pnx_xml::parse(
            "<Export><DeviceCollection>\
             <Device><DeviceType>ET200SP</DeviceType></Device>\
             <Device><DeviceType>S7-1500</DeviceType>\
               <Interfaces><PnInterface><PortList>\
                 <Port><PortID>1</PortID></Port><Port><PortID>2</PortID></Port>\
               </PortList></PnInterface></Interfaces>\
             </Device>\
             </DeviceCollection></Export>",
        )
        .expect("parse");
        let inventory = extract(&root, &ExtractOptions::default()).expect("extract");
        for shape in Shape::ALL {
            let layout = Layout::for_shape(shape, &LayoutOptions::default());
            let table = Table::build(&inventory, &layout).expect("flatten");
            assert_eq!(table.rows()[0].key(), table.rows()[1].key(), "{shape}");
            let runs: Vec<Range<usize>> = table.runs().iter().map(|r| r.rows.clone()).collect();
            assert_eq!(runs, vec![1..3], "{shape}");
        }
    }

    #[test]
    fn report_fills_repeated_labels_from_the_last_group() {
        let table = build(Shape::Report);
        assert_eq!(table.groups().len(), 4);
        let row = &table.rows()[2];
        assert_eq!(row.get(0), "sw-b");
        assert_eq!(row.get(6), "sw-b");
        assert_eq!(row.get(8), "6GK5");
        assert_eq!(table.merge_columns(), 0..12);
    }

    #[test]
    fn colliding_labels_show_the_later_value() {
        let layout = Layout::new(
            "collide",
            vec![
                Column::new("Id", Source::Device(DeviceField::NameOfStation), Group::Device),
                Column::new("Port", Source::Port(PortField::PortId), Group::Port),
                Column::new("Id", Source::Im(ImField::OrderId), Group::Identity),
            ],
        );
        let table = Table::build(&inventory(), &layout).expect("flatten");
        assert_eq!(table.rows()[0].values(), ["6GK5", "port-002", "6GK5"]);
        assert_eq!(table.rows()[2].values(), ["", "", ""]);
        assert!(table.runs().is_empty());
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let layout = Layout::compact().with_merge_columns(0..8);
        assert!(matches!(
            Table::build(&inventory(), &layout),
            Err(ExportError::Layout(_))
        ));
    }
}
