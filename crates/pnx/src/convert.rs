//! Single-file conversion: decode, clean, parse, validate, extract, flatten
//! and write.
//!
//! Files are written to `<output>.partial` and renamed onto the target only
//! after the sink finished; a failed conversion leaves no output behind.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pnx_model::{extract, ExtractOptions, Inventory, DEFAULT_MODULE_LIMIT};
use serde::Serialize;
use tracing::{debug, warn};

use crate::layout::{Layout, LayoutOptions, Shape};
use crate::merge::Emission;
use crate::sink::csv::CsvSink;
use crate::sink::xlsx::XlsxSink;
use crate::sink::{write_table, TableSink};
use crate::table::Table;
use crate::ExportError;

const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

impl OutputFormat {
    /// Format implied by the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Xlsx),
            other => Err(format!("unknown output format '{other}' (expected csv or xlsx)")),
        }
    }
}

/// Options of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub shape: Shape,
    /// Output format; `None` derives it from the output path.
    pub format: Option<OutputFormat>,
    /// Modules kept per device; `None` keeps all and widens module slots to fit.
    pub module_limit: Option<usize>,
    /// Span parent cells when the sink supports it.
    pub merge: bool,
    /// Prefix CSV output with a UTF-8 byte order mark.
    pub bom: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            shape: Shape::Wide,
            format: None,
            module_limit: Some(DEFAULT_MODULE_LIMIT),
            merge: true,
            bom: true,
        }
    }
}

impl ConvertOptions {
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_module_limit(mut self, limit: Option<usize>) -> Self {
        self.module_limit = limit;
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            module_limit: self.module_limit,
        }
    }

    /// Module slots for `inventory`: the limit if set, else the widest device.
    pub fn layout_options(&self, inventory: &Inventory) -> LayoutOptions {
        LayoutOptions {
            module_slots: self
                .module_limit
                .unwrap_or_else(|| inventory.max_modules()),
        }
    }

    /// Output format for `output`, preferring the explicit setting.
    pub fn resolve_format(&self, output: &Path) -> Result<OutputFormat, ExportError> {
        self.format
            .or_else(|| OutputFormat::from_path(output))
            .ok_or_else(|| ExportError::UnsupportedFormat(output.display().to_string()))
    }
}

/// Counts reported after a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConvertSummary {
    pub devices: usize,
    pub ports: usize,
    pub modules: usize,
    pub rows: usize,
    /// Runs handed to the sink; zero when rows were duplicated.
    pub merge_runs: usize,
}

/// Decode raw bytes and extract the inventory.
pub fn load_inventory(bytes: &[u8], options: &ExtractOptions) -> Result<Inventory, ExportError> {
    let text = pnx_xml::decode(bytes)?;
    parse_inventory(&text, options)
}

fn parse_inventory(xml: &str, options: &ExtractOptions) -> Result<Inventory, ExportError> {
    let cleaned = pnx_xml::clean(xml);
    let root = pnx_xml::parse(&cleaned)?;
    Ok(extract(&root, options)?)
}

/// Flatten an inventory into the table of the configured shape.
pub fn build_table(inventory: &Inventory, options: &ConvertOptions) -> Result<Table, ExportError> {
    let layout = Layout::for_shape(options.shape, &options.layout_options(inventory));
    Table::build(inventory, &layout)
}

fn write_inventory<S>(
    inventory: &Inventory,
    options: &ConvertOptions,
    sink: &mut S,
) -> Result<ConvertSummary, ExportError>
where
    S: TableSink + ?Sized,
{
    let table = build_table(inventory, options)?;
    let emission = write_table(&table, sink, options.merge)?;
    Ok(ConvertSummary {
        devices: inventory.devices.len(),
        ports: inventory.port_count(),
        modules: inventory.module_count(),
        rows: table.len(),
        merge_runs: match emission {
            Emission::Spanned => table.runs().len(),
            Emission::Duplicated => 0,
        },
    })
}

/// Convert already decoded text into `sink`.
pub fn convert_str<S>(
    xml: &str,
    options: &ConvertOptions,
    sink: &mut S,
) -> Result<ConvertSummary, ExportError>
where
    S: TableSink + ?Sized,
{
    let inventory = parse_inventory(xml, &options.extract_options())?;
    write_inventory(&inventory, options, sink)
}

/// Convert raw file bytes into `sink`.
pub fn convert_bytes<S>(
    bytes: &[u8],
    options: &ConvertOptions,
    sink: &mut S,
) -> Result<ConvertSummary, ExportError>
where
    S: TableSink + ?Sized,
{
    let inventory = load_inventory(bytes, &options.extract_options())?;
    write_inventory(&inventory, options, sink)
}

/// Path used while `output` is being written.
pub fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map_or_else(OsString::new, |name| name.to_os_string());
    name.push(PARTIAL_SUFFIX);
    output.with_file_name(name)
}

/// Convert `input` into `output`.
///
/// Input failures are reported before the output is touched. Output goes to
/// [`partial_path`] first and is renamed onto `output` once complete.
pub fn convert_file(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConvertSummary, ExportError> {
    let format = options.resolve_format(output)?;
    let bytes = fs::read(input)?;
    let inventory = load_inventory(&bytes, &options.extract_options())?;

    let summary = write_atomically(output, |partial| {
        write_file(&inventory, partial, format, options)
    })?;
    debug!(
        input = %input.display(),
        output = %output.display(),
        rows = summary.rows,
        "converted"
    );
    Ok(summary)
}

/// Run `write` against [`partial_path`] and rename the result onto `output`.
///
/// On failure the partial file is removed and `output` is left untouched.
pub(crate) fn write_atomically<T, F>(output: &Path, write: F) -> Result<T, ExportError>
where
    F: FnOnce(&Path) -> Result<T, ExportError>,
{
    let partial = partial_path(output);
    let result = write(&partial)
        .and_then(|value| fs::rename(&partial, output).map(|_| value).map_err(Into::into));
    if result.is_err() {
        if let Err(cleanup) = fs::remove_file(&partial) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %partial.display(),
                    error = %cleanup,
                    "failed to remove partial output"
                );
            }
        }
    }
    result
}

fn write_file(
    inventory: &Inventory,
    path: &Path,
    format: OutputFormat,
    options: &ConvertOptions,
) -> Result<ConvertSummary, ExportError> {
    let file = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Csv => {
            let mut sink = CsvSink::with_bom(file, options.bom);
            let summary = write_inventory(inventory, options, &mut sink)?;
            sink.into_inner()?.flush()?;
            Ok(summary)
        }
        OutputFormat::Xlsx => {
            let mut sink = XlsxSink::new(file);
            let summary = write_inventory(inventory, options, &mut sink)?;
            sink.into_inner().flush()?;
            Ok(summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    const SAMPLE: &str = r#"<Export><DeviceCollection>
        <Device>
            <NameOfStation>SW1</NameOfStation>
            <IpAddress>10.0.0.1</IpAddress>
            <Modules>
                <Module><ModuleName>A</ModuleName></Module>
                <Module><ModuleName>B</ModuleName></Module>
                <Module><ModuleName>C</ModuleName></Module>
                <Module><ModuleName>D</ModuleName></Module>
            </Modules>
            <Interfaces><PnInterface><PortList>
                <Port><PortID>1</PortID></Port>
                <Port><PortID>2</PortID></Port>
            </PortList></PnInterface></Interfaces>
        </Device>
    </DeviceCollection></Export>"#;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out/a.CSV")),
            Some(OutputFormat::Csv)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("a.xlsx")),
            Some(OutputFormat::Xlsx)
        );
        assert_eq!(OutputFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(OutputFormat::from_path(Path::new("a")), None);
    }

    #[test]
    fn explicit_format_wins() {
        let options = ConvertOptions::default().with_format(OutputFormat::Xlsx);
        assert_eq!(
            options.resolve_format(Path::new("a.csv")).expect("format"),
            OutputFormat::Xlsx
        );
        assert!(matches!(
            ConvertOptions::default().resolve_format(Path::new("a.txt")),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("out/site.csv")),
            PathBuf::from("out/site.csv.partial")
        );
    }

    #[test]
    fn unbounded_modules_widen_the_wide_shape() {
        let mut sink = MemorySink::new();
        let options = ConvertOptions::default().with_module_limit(None);
        convert_str(SAMPLE, &options, &mut sink).expect("convert");
        assert_eq!(sink.value(0, "Module_4_Name"), Some("D"));

        let mut bounded = MemorySink::new();
        let summary =
            convert_str(SAMPLE, &ConvertOptions::default(), &mut bounded).expect("convert");
        assert_eq!(bounded.value(0, "Module_4_Name"), None);
        assert_eq!(bounded.value(1, "Module_3_Name"), Some("C"));
        assert_eq!(summary.modules, 3);
    }

    #[test]
    fn summary_counts_applied_runs() {
        let mut plain = MemorySink::new();
        let summary =
            convert_str(SAMPLE, &ConvertOptions::default(), &mut plain).expect("convert");
        assert_eq!(
            summary,
            ConvertSummary {
                devices: 1,
                ports: 2,
                modules: 3,
                rows: 2,
                merge_runs: 0,
            }
        );
        let mut merging = MemorySink::with_merge();
        let summary =
            convert_str(SAMPLE, &ConvertOptions::default(), &mut merging).expect("convert");
        assert_eq!(summary.merge_runs, 1);
    }

    #[test]
    fn bytes_are_decoded_before_parsing() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(SAMPLE.as_bytes());
        let mut sink = MemorySink::new();
        let summary =
            convert_bytes(&bytes, &ConvertOptions::default(), &mut sink).expect("convert");
        assert_eq!(summary.rows, 2);
    }
}
