use std::error::Error;

use pnx::{build_table, load_inventory, ConvertOptions, Emission, Shape};

const SAMPLE: &str = r#"<Export><DeviceCollection>
    <Device>
        <NameOfStation>sw-core</NameOfStation>
        <IpAddress>192.168.0.1</IpAddress>
        <Interfaces><PnInterface><PortList>
            <Port><PortID>port-001</PortID><RemoteNameOfStation>plc-1</RemoteNameOfStation></Port>
            <Port><PortID>port-002</PortID><RemoteNameOfStation>io-7</RemoteNameOfStation></Port>
            <Port><PortID>port-003</PortID></Port>
        </PortList></PnInterface></Interfaces>
    </Device>
    <Device>
        <NameOfStation>plc-1</NameOfStation>
        <IpAddress>192.168.0.10</IpAddress>
    </Device>
</DeviceCollection></Export>"#;

fn main() -> Result<(), Box<dyn Error>> {
    let options = ConvertOptions::default().with_shape(Shape::Compact);
    let inventory = load_inventory(SAMPLE.as_bytes(), &options.extract_options())?;
    let table = build_table(&inventory, &options)?;

    println!("{}", table.labels()[..8].join(" | "));
    for values in table.emitted_rows(Emission::Spanned) {
        println!("{}", values[..8].join(" | "));
    }
    for run in table.runs() {
        println!(
            "merge rows {}..={} over columns {:?}",
            run.first_row(),
            run.last_row(),
            run.columns
        );
    }
    Ok(())
}
