//! Spreadsheet sink built on `rust_xlsxwriter`.
//!
//! The workbook is assembled in memory and written to the output on
//! [`TableSink::finish`].

use std::io::Write;

use rust_xlsxwriter::{ColNum, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet};

use super::{Header, TableSink};
use crate::merge::MergeRun;
use crate::ExportError;

pub const SHEET_NAME: &str = "Combined";

/// Single-sheet workbook with a bold, frozen header and vertically merged
/// parent cells.
pub struct XlsxSink<W: Write> {
    out: W,
    worksheet: Worksheet,
    title_format: Format,
    header_format: Format,
    merge_format: Format,
    next_row: RowNum,
    /// First row holding table data.
    data_start: RowNum,
    finished: bool,
}

impl<W: Write> XlsxSink<W> {
    pub fn new(out: W) -> Self {
        XlsxSink {
            out,
            worksheet: Worksheet::new(),
            title_format: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            header_format: Format::new().set_bold().set_border(FormatBorder::Thin),
            merge_format: Format::new().set_align(FormatAlign::VerticalCenter),
            next_row: 0,
            data_start: 0,
            finished: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn row_num(row: usize) -> Result<RowNum, ExportError> {
    RowNum::try_from(row).map_err(|_| ExportError::layout(format!("row {row} exceeds sheet limits")))
}

fn col_num(col: usize) -> Result<ColNum, ExportError> {
    ColNum::try_from(col)
        .map_err(|_| ExportError::layout(format!("column {col} exceeds sheet limits")))
}

impl<W: Write> TableSink for XlsxSink<W> {
    fn header(&mut self, header: &Header<'_>) -> Result<(), ExportError> {
        if !header.groups.is_empty() {
            let row = self.next_row;
            for span in header.groups {
                if span.columns.is_empty() {
                    continue;
                }
                let first = col_num(span.columns.start)?;
                let last = col_num(span.columns.end - 1)?;
                if first == last {
                    self.worksheet
                        .write_string_with_format(row, first, &span.title, &self.title_format)?;
                } else {
                    self.worksheet
                        .merge_range(row, first, row, last, &span.title, &self.title_format)?;
                }
            }
            self.next_row += 1;
        }
        for (idx, label) in header.labels.iter().enumerate() {
            self.worksheet.write_string_with_format(
                self.next_row,
                col_num(idx)?,
                label,
                &self.header_format,
            )?;
        }
        self.next_row += 1;
        self.data_start = self.next_row;
        Ok(())
    }

    fn row(&mut self, values: &[String]) -> Result<(), ExportError> {
        for (idx, value) in values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            self.worksheet
                .write_string(self.next_row, col_num(idx)?, value)?;
        }
        self.next_row += 1;
        Ok(())
    }

    fn supports_merge(&self) -> bool {
        true
    }

    fn merge(&mut self, run: &MergeRun, values: &[String]) -> Result<(), ExportError> {
        if run.row_count() < 2 {
            return Ok(());
        }
        let first = self.data_start + row_num(run.first_row())?;
        let last = self.data_start + row_num(run.last_row())?;
        for (offset, value) in values.iter().enumerate() {
            let col = col_num(run.columns.start + offset)?;
            self.worksheet
                .merge_range(first, col, last, col, value, &self.merge_format)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        if self.finished {
            return Ok(());
        }
        self.worksheet.set_name(SHEET_NAME)?;
        self.worksheet.set_freeze_panes(self.data_start, 0)?;
        self.worksheet.autofit();

        let mut workbook = Workbook::new();
        workbook.push_worksheet(std::mem::replace(&mut self.worksheet, Worksheet::new()));
        let bytes = workbook.save_to_buffer()?;
        self.out.write_all(&bytes)?;
        self.out.flush()?;
        self.finished = true;
        Ok(())
    }
}
