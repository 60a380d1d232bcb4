//! Output sinks for flattened tables.
//!
//! A sink receives the header once, every row in emission order, then the
//! merge runs if it declared support for spanning cells. Sinks that ignore
//! merges still receive fully duplicated rows.

pub mod csv;
pub mod xlsx;

use tracing::debug;

use crate::layout::GroupSpan;
use crate::merge::{blank_runs, fill_runs, Emission, MergeRun};
use crate::table::Table;
use crate::ExportError;

/// Header handed to a sink before any row.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    pub labels: &'a [String],
    /// Group titles above the labels; empty when the layout has none.
    pub groups: &'a [GroupSpan],
}

pub trait TableSink {
    fn header(&mut self, header: &Header<'_>) -> Result<(), ExportError>;

    fn row(&mut self, values: &[String]) -> Result<(), ExportError>;

    /// Whether [`TableSink::merge`] spans cells. Defaults to `false`.
    fn supports_merge(&self) -> bool {
        false
    }

    /// Span `values` over the run's rows and columns. Called after all rows.
    fn merge(&mut self, run: &MergeRun, values: &[String]) -> Result<(), ExportError> {
        let _ = (run, values);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError>;
}

/// Stream a table into a sink and report which emission mode was used.
///
/// Rows are spanned only when `merge` is requested and the sink supports it.
pub fn write_table<S>(table: &Table, sink: &mut S, merge: bool) -> Result<Emission, ExportError>
where
    S: TableSink + ?Sized,
{
    let rows = table.emitted_rows(Emission::Duplicated);
    write_rows(&table.header(), rows, table.runs(), sink, merge)
}

/// Stream fully populated rows and their runs into a sink.
///
/// In spanned mode every run is blanked below its first row and handed to
/// the sink with the first row's values.
pub fn write_rows<S>(
    header: &Header<'_>,
    mut rows: Vec<Vec<String>>,
    runs: &[MergeRun],
    sink: &mut S,
    merge: bool,
) -> Result<Emission, ExportError>
where
    S: TableSink + ?Sized,
{
    let emission = if merge && sink.supports_merge() {
        Emission::Spanned
    } else {
        Emission::Duplicated
    };
    if emission == Emission::Spanned {
        blank_runs(&mut rows, runs);
    }
    sink.header(header)?;
    for values in &rows {
        sink.row(values)?;
    }
    if emission == Emission::Spanned {
        for run in runs {
            let values = rows
                .get(run.first_row())
                .and_then(|row| row.get(run.columns.clone()))
                .unwrap_or(&[]);
            sink.merge(run, values)?;
        }
    }
    sink.finish()?;
    debug!(rows = rows.len(), runs = runs.len(), ?emission, "table written");
    Ok(emission)
}

/// Records everything it receives.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub labels: Vec<String>,
    pub groups: Vec<GroupSpan>,
    pub rows: Vec<Vec<String>>,
    pub merges: Vec<MergeRun>,
    pub finished: bool,
    merge_support: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that accepts merge runs.
    pub fn with_merge() -> Self {
        MemorySink {
            merge_support: true,
            ..Self::default()
        }
    }

    /// Rows with spanned cells copied back down their runs.
    pub fn duplicated_rows(&self) -> Vec<Vec<String>> {
        let mut rows = self.rows.clone();
        fill_runs(&mut rows, &self.merges);
        rows
    }

    /// Value at `row` under the first column labelled `label`.
    pub fn value(&self, row: usize, label: &str) -> Option<&str> {
        let column = self.labels.iter().position(|l| l == label)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

impl TableSink for MemorySink {
    fn header(&mut self, header: &Header<'_>) -> Result<(), ExportError> {
        self.labels = header.labels.to_vec();
        self.groups = header.groups.to_vec();
        Ok(())
    }

    fn row(&mut self, values: &[String]) -> Result<(), ExportError> {
        self.rows.push(values.to_vec());
        Ok(())
    }

    fn supports_merge(&self) -> bool {
        self.merge_support
    }

    fn merge(&mut self, run: &MergeRun, _values: &[String]) -> Result<(), ExportError> {
        self.merges.push(run.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Layout, LayoutOptions};
    use pnx_model::{extract, ExtractOptions};

    const TWO_DEVICES: &str = r#"
        <Export><DeviceCollection>
            <Device>
                <NameOfStation>sw-1</NameOfStation>
                <IpAddress>10.0.0.1</IpAddress>
                <Interfaces><PnInterface><PortList>
                    <Port><PortID>1</PortID></Port>
                    <Port><PortID>2</PortID></Port>
                    <Port><PortID>3</PortID></Port>
                </PortList></PnInterface></Interfaces>
            </Device>
            <Device><NameOfStation>io-1</NameOfStation></Device>
        </DeviceCollection></Export>
    "#;

    fn table(layout: &Layout) -> Table {
        let root = pnx_xml::parse(TWO_DEVICES).expect("parse");
        let inventory = extract(&root, &ExtractOptions::default()).expect("extract");
        Table::build(&inventory, layout).expect("flatten")
    }

    #[test]
    fn plain_sink_receives_duplicated_rows() {
        let table = table(&Layout::compact());
        let mut sink = MemorySink::new();
        let emission = write_table(&table, &mut sink, true).expect("write");
        assert_eq!(emission, Emission::Duplicated);
        assert!(sink.merges.is_empty());
        assert!(sink.finished);
        assert_eq!(sink.rows.len(), 4);
        assert!(sink.rows[1..].iter().all(|row| row[0] == "sw-1"));
    }

    #[test]
    fn merging_sink_receives_spanned_rows() {
        let table = table(&Layout::compact());
        let mut sink = MemorySink::with_merge();
        let emission = write_table(&table, &mut sink, true).expect("write");
        assert_eq!(emission, Emission::Spanned);
        assert_eq!(sink.merges.len(), 1);
        assert_eq!(sink.merges[0].rows, 1..4);
        assert_eq!(sink.rows[0][0], "io-1");
        assert_eq!(sink.rows[1][0], "sw-1");
        assert_eq!(sink.rows[2][0], "");
        assert_eq!(sink.value(2, "Port_ID"), Some("2"));
        assert_eq!(sink.duplicated_rows(), table.emitted_rows(Emission::Duplicated));
    }

    #[test]
    fn merging_can_be_disabled() {
        let table = table(&Layout::compact());
        let mut sink = MemorySink::with_merge();
        let emission = write_table(&table, &mut sink, false).expect("write");
        assert_eq!(emission, Emission::Duplicated);
        assert!(sink.merges.is_empty());
    }

    #[test]
    fn group_titles_reach_the_sink() {
        let table = table(&Layout::report(&LayoutOptions::default()));
        let mut sink = MemorySink::new();
        write_table(&table, &mut sink, false).expect("write");
        assert_eq!(sink.groups.len(), 4);
        assert_eq!(sink.labels.len(), 24);
    }
}
