//! Re-merging a flat CSV table into a spreadsheet.
//!
//! Consecutive rows sharing the key columns (station name and IP address by
//! default) are spanned over the leading columns. Rows only join a run when
//! their spanned cells agree as well, so no value is hidden by a merge.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::convert::write_atomically;
use crate::merge::{merge_runs, Emission};
use crate::sink::xlsx::XlsxSink;
use crate::sink::{write_rows, Header, TableSink};
use crate::ExportError;

/// Which leading columns key and span a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemergeOptions {
    /// Leading columns identifying a device.
    pub key_columns: usize,
    /// Leading columns spanned over a run.
    pub merge_columns: usize,
}

impl Default for RemergeOptions {
    fn default() -> Self {
        RemergeOptions {
            key_columns: 2,
            merge_columns: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RemergeSummary {
    pub rows: usize,
    pub columns: usize,
    /// Runs handed to the sink; zero when rows were duplicated.
    pub merge_runs: usize,
}

/// Header labels and rows of a CSV document, short rows padded with blanks.
pub fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), ExportError> {
    let text = pnx_xml::decode(bytes)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let labels: Vec<String> = reader
        .headers()
        .map_err(input_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if labels.iter().all(String::is_empty) {
        return Err(ExportError::CsvInput("no header row".into()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(input_error)?;
        let mut row: Vec<String> = record.iter().take(labels.len()).map(str::to_string).collect();
        row.resize(labels.len(), String::new());
        rows.push(row);
    }
    Ok((labels, rows))
}

fn input_error(err: csv::Error) -> ExportError {
    ExportError::CsvInput(err.to_string())
}

/// Re-merge CSV bytes into `sink`.
pub fn remerge_bytes<S>(
    bytes: &[u8],
    options: &RemergeOptions,
    sink: &mut S,
) -> Result<RemergeSummary, ExportError>
where
    S: TableSink + ?Sized,
{
    let (labels, rows) = read_csv(bytes)?;
    let width = labels.len();
    let keys: Vec<(&[String], &[String])> = rows
        .iter()
        .map(|row| {
            (
                &row[..options.key_columns.min(width)],
                &row[..options.merge_columns.min(width)],
            )
        })
        .collect();
    let runs = merge_runs(&keys, 0..options.merge_columns.min(width));
    let summary = RemergeSummary {
        rows: rows.len(),
        columns: width,
        merge_runs: runs.len(),
    };

    let header = Header {
        labels: &labels,
        groups: &[],
    };
    let emission = write_rows(&header, rows, &runs, sink, true)?;
    Ok(RemergeSummary {
        merge_runs: match emission {
            Emission::Spanned => summary.merge_runs,
            Emission::Duplicated => 0,
        },
        ..summary
    })
}

/// Re-merge the CSV at `input` into a workbook at `output`.
///
/// Output goes through the same partial-file rename as [`crate::convert_file`].
pub fn remerge_file(
    input: &Path,
    output: &Path,
    options: &RemergeOptions,
) -> Result<RemergeSummary, ExportError> {
    let bytes = fs::read(input)?;
    let summary = write_atomically(output, |partial| {
        let mut sink = XlsxSink::new(BufWriter::new(File::create(partial)?));
        let summary = remerge_bytes(&bytes, options, &mut sink)?;
        sink.into_inner().flush()?;
        Ok(summary)
    })?;
    debug!(
        input = %input.display(),
        output = %output.display(),
        rows = summary.rows,
        runs = summary.merge_runs,
        "re-merged"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::ErrorKind;

    const FLAT: &str = "\u{FEFF}NameOfStation,IpAddress,DeviceType,MAC,OrderID,Serial,PortID\n\
        sw-1,10.0.0.1,SCALANCE,aa,6GK,S1,1\n\
        sw-1,10.0.0.1,SCALANCE,aa,6GK,S1,2\n\
        sw-1,10.0.0.1,SCALANCE,aa,6GK,S1,3\n\
        io-1,10.0.0.9,ET200SP,bb,6ES,S2,\n";

    #[test]
    fn rows_sharing_name_and_address_are_spanned() {
        let mut sink = MemorySink::with_merge();
        let summary =
            remerge_bytes(FLAT.as_bytes(), &RemergeOptions::default(), &mut sink).expect("merge");
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.columns, 7);
        assert_eq!(summary.merge_runs, 1);
        assert_eq!(sink.labels[0], "NameOfStation");
        assert_eq!(sink.merges[0].rows, 0..3);
        assert_eq!(sink.merges[0].columns, 0..6);
        assert_eq!(sink.rows[1][0], "");
        assert_eq!(sink.value(1, "PortID"), Some("2"));
        assert_eq!(sink.value(3, "IpAddress"), Some("10.0.0.9"));
    }

    #[test]
    fn differing_spanned_cells_split_the_run() {
        let csv = "Name,IP,Type\n,,ET200SP\n,,S7-1500\n";
        let mut sink = MemorySink::with_merge();
        let summary =
            remerge_bytes(csv.as_bytes(), &RemergeOptions::default(), &mut sink).expect("merge");
        assert_eq!(summary.merge_runs, 0);
        assert_eq!(sink.value(1, "Type"), Some("S7-1500"));
    }

    #[test]
    fn short_rows_are_padded_to_the_header() {
        let (labels, rows) = read_csv(b"a,b,c\n1\n1,2,3,4\n").expect("read");
        assert_eq!(labels.len(), 3);
        assert_eq!(rows, vec![vec!["1", "", ""], vec!["1", "2", "3"]]);
    }

    #[test]
    fn empty_input_is_a_parse_failure() {
        let mut sink = MemorySink::with_merge();
        let err =
            remerge_bytes(b"", &RemergeOptions::default(), &mut sink).expect_err("no header");
        assert!(matches!(err, ExportError::CsvInput(_)));
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(!sink.finished);
    }
}
