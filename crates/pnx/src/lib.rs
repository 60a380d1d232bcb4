#![cfg_attr(docsrs, feature(doc_cfg))]
//! PROFINET topology export flattening.
//!
//! Re-exports the parser ([`xml`]), the record model ([`model`]) and the tag
//! names ([`tags`]), and owns the tabular side: column [`layout`]s, the
//! flattened [`table`], [`merge`] run detection, output [`sink`]s, the
//! single-file [`convert`] pipeline and [`remerge`] of flat CSV tables.
//!
//! ```rust
//! use pnx::{convert_str, ConvertOptions, MemorySink, Shape};
//!
//! let xml = r#"<Export><DeviceCollection>
//!     <Device>
//!         <NameOfStation>SW1</NameOfStation>
//!         <IpAddress>10.0.0.1</IpAddress>
//!         <Interfaces><PnInterface><PortList>
//!             <Port><PortID>1</PortID></Port>
//!             <Port><PortID>2</PortID></Port>
//!         </PortList></PnInterface></Interfaces>
//!     </Device>
//! </DeviceCollection></Export>"#;
//!
//! let mut sink = MemorySink::with_merge();
//! let options = ConvertOptions::default().with_shape(Shape::Compact);
//! let summary = convert_str(xml, &options, &mut sink).expect("convert");
//! assert_eq!(summary.rows, 2);
//! assert_eq!(summary.merge_runs, 1);
//! assert_eq!(sink.rows[1][0], "");
//! ```

pub use pnx_model as model;
pub use pnx_tags as tags;
pub use pnx_xml as xml;

pub mod convert;
pub mod layout;
pub mod merge;
pub mod remerge;
pub mod sink;
pub mod table;

use pnx_model::ModelError;
use pnx_xml::XmlError;
use rust_xlsxwriter::XlsxError;
use thiserror::Error;

pub use convert::{
    build_table, convert_bytes, convert_file, convert_str, load_inventory, partial_path,
    ConvertOptions, ConvertSummary, OutputFormat,
};
pub use layout::{Column, Group, GroupSpan, Layout, LayoutOptions, RowOrder, Shape, Source};
pub use merge::{blank_runs, fill_runs, key_runs, merge_runs, Emission, MergeRun};
pub use remerge::{read_csv, remerge_bytes, remerge_file, RemergeOptions, RemergeSummary};
pub use model::{DeviceRecord, ExtractOptions, Inventory, ModuleRecord, PortRecord};
pub use sink::csv::CsvSink;
pub use sink::xlsx::XlsxSink;
pub use sink::{write_rows, write_table, Header, MemorySink, TableSink};
pub use table::{FlatRow, Table};

/// Error type produced by the conversion pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The document could not be decoded or parsed.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// The document lacks the device collection.
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    /// A CSV table handed to [`remerge`] could not be read.
    #[error("csv input: {0}")]
    CsvInput(String),
    #[error("xlsx: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// A layout does not fit its table or the sink's limits.
    #[error("layout: {0}")]
    Layout(String),
    /// The output path has no extension this crate can write.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Coarse failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Required collection absent or empty.
    Structure,
    /// Input could not be decoded or parsed.
    Parse,
    /// Output could not be written.
    Sink,
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::Model(_) => ErrorKind::Structure,
            ExportError::Xml(_) | ExportError::CsvInput(_) => ErrorKind::Parse,
            ExportError::Csv(_)
            | ExportError::Xlsx(_)
            | ExportError::Io(_)
            | ExportError::Layout(_)
            | ExportError::UnsupportedFormat(_) => ErrorKind::Sink,
        }
    }

    fn layout<S: Into<String>>(msg: S) -> Self {
        ExportError::Layout(msg.into())
    }
}
