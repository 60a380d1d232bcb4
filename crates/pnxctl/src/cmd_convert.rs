use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pnx::{convert_file, ConvertOptions, ConvertSummary, OutputFormat, Shape};
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub options: ConvertOptions,
}

#[derive(Serialize)]
struct ConvertReport {
    input: String,
    output: String,
    shape: Shape,
    format: OutputFormat,
    #[serde(flatten)]
    summary: ConvertSummary,
}

/// Output path when none is given: the input path with the format's extension.
pub fn default_output(input: &Path, format: Option<OutputFormat>) -> PathBuf {
    input.with_extension(format.unwrap_or(OutputFormat::Csv).extension())
}

pub fn run(args: ConvertArgs, json: bool) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, args.format));
    let options = match args.format {
        Some(format) => args.options.with_format(format),
        None => args.options,
    };
    let format = options.resolve_format(&output)?;

    let summary = convert_file(&args.input, &output, &options)
        .with_context(|| format!("convert {}", args.input.display()))?;
    info!(
        input = %args.input.display(),
        output = %output.display(),
        devices = summary.devices,
        rows = summary.rows,
        "converted"
    );

    if json {
        return common::print_json(&ConvertReport {
            input: args.input.display().to_string(),
            output: output.display().to_string(),
            shape: options.shape,
            format,
            summary,
        });
    }
    println!(
        "{} -> {} ({} devices, {} ports, {} rows, {} merged runs)",
        args.input.display(),
        output.display(),
        summary.devices,
        summary.ports,
        summary.rows,
        summary.merge_runs
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_output_swaps_extension() {
        assert_eq!(
            default_output(Path::new("site/plant.xml"), None),
            PathBuf::from("site/plant.csv")
        );
        assert_eq!(
            default_output(Path::new("plant.xml"), Some(OutputFormat::Xlsx)),
            PathBuf::from("plant.xlsx")
        );
    }

    #[test]
    fn run_writes_next_to_input() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.path().join("plant.xml");
        fs::write(
            &input,
            "<Export><DeviceCollection><Device>\
             <NameOfStation>io-1</NameOfStation>\
             </Device></DeviceCollection></Export>",
        )
        .expect("write input");
        let args = ConvertArgs {
            input: input.clone(),
            output: None,
            format: None,
            options: ConvertOptions::default(),
        };
        run(args, false).expect("convert");
        let text = fs::read_to_string(dir.path().join("plant.csv")).expect("read output");
        assert!(text.contains("io-1"));
    }
}
