use std::env;
use std::error::Error;
use std::path::PathBuf;

use pnx::{convert_file, ConvertOptions, Shape};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: convert_file <input.xml> <output.csv|output.xlsx> [shape]");
        std::process::exit(2);
    };
    let shape: Shape = args.next().as_deref().unwrap_or("wide").parse()?;

    let options = ConvertOptions::default().with_shape(shape);
    let summary = convert_file(&PathBuf::from(input), &PathBuf::from(&output), &options)?;
    println!(
        "{output}: {} devices, {} ports, {} rows, {} merged runs",
        summary.devices, summary.ports, summary.rows, summary.merge_runs
    );
    Ok(())
}
