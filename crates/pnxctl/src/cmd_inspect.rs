use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pnx::{build_table, load_inventory, ConvertOptions, Inventory, Shape};
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Debug, Serialize)]
struct DeviceEntry {
    name: String,
    ip: String,
    mac: String,
    device_type: String,
    ports: usize,
    modules: usize,
}

#[derive(Debug, Serialize)]
struct ShapeEntry {
    shape: Shape,
    columns: usize,
    rows: usize,
    merge_runs: usize,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    devices: usize,
    ports: usize,
    modules: usize,
    shapes: Vec<ShapeEntry>,
    entries: Vec<DeviceEntry>,
}

fn report(inventory: &Inventory, options: &ConvertOptions) -> Result<InspectReport> {
    let shapes = Shape::ALL
        .into_iter()
        .map(|shape| {
            let table = build_table(inventory, &options.with_shape(shape))?;
            Ok(ShapeEntry {
                shape,
                columns: table.labels().len(),
                rows: table.len(),
                merge_runs: table.runs().len(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let entries = inventory
        .devices
        .iter()
        .map(|device| DeviceEntry {
            name: device.name().to_string(),
            ip: device.ip_address().to_string(),
            mac: device.mac_address().to_string(),
            device_type: device.get(pnx::model::DeviceField::DeviceType).to_string(),
            ports: device.ports.len(),
            modules: device.modules.len(),
        })
        .collect();
    Ok(InspectReport {
        devices: inventory.devices.len(),
        ports: inventory.port_count(),
        modules: inventory.module_count(),
        shapes,
        entries,
    })
}

pub fn run(input: &Path, options: &ConvertOptions, json: bool) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let inventory = load_inventory(&bytes, &options.extract_options())
        .with_context(|| format!("load {}", input.display()))?;
    let report = report(&inventory, options)?;
    info!(devices = report.devices, ports = report.ports, "inspected export");

    if json {
        return common::print_json(&report);
    }

    println!(
        "{}: {} devices, {} ports, {} modules",
        input.display(),
        report.devices,
        report.ports,
        report.modules
    );
    println!("{:<8} {:>7} {:>6} {:>6}", "SHAPE", "COLUMNS", "ROWS", "RUNS");
    for entry in &report.shapes {
        println!(
            "{:<8} {:>7} {:>6} {:>6}",
            entry.shape.as_str(),
            entry.columns,
            entry.rows,
            entry.merge_runs
        );
    }
    println!();
    println!(
        "{:<24} {:<16} {:<18} {:>5} {:>7}",
        "STATION", "IP", "MAC", "PORTS", "MODULES"
    );
    for dev in &report.entries {
        println!(
            "{:<24} {:<16} {:<18} {:>5} {:>7}",
            if dev.name.is_empty() { "-" } else { &dev.name },
            if dev.ip.is_empty() { "-" } else { &dev.ip },
            if dev.mac.is_empty() { "-" } else { &dev.mac },
            dev.ports,
            dev.modules
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &[u8] = br#"<Export><DeviceCollection>
        <Device>
            <NameOfStation>sw-1</NameOfStation>
            <Interfaces><PnInterface><PortList>
                <Port><PortID>1</PortID></Port>
                <Port><PortID>2</PortID></Port>
            </PortList></PnInterface></Interfaces>
        </Device>
        <Device><NameOfStation>io-1</NameOfStation></Device>
    </DeviceCollection></Export>"#;

    #[test]
    fn report_counts_every_shape() {
        let options = ConvertOptions::default();
        let inventory = load_inventory(EXPORT, &options.extract_options()).expect("load");
        let report = report(&inventory, &options).expect("report");
        assert_eq!(report.devices, 2);
        assert_eq!(report.ports, 2);
        assert_eq!(report.shapes.len(), 4);
        assert!(report.shapes.iter().all(|s| s.rows == 3 && s.merge_runs == 1));
        assert_eq!(report.shapes[0].columns, 44);
        assert_eq!(report.entries[1].name, "io-1");
        assert_eq!(report.entries[0].ports, 2);
    }
}
