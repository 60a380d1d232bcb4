//! CSV sink built on the `csv` crate.

use std::io::Write;

use csv::{Writer, WriterBuilder};

use super::{Header, TableSink};
use crate::ExportError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the header, an optional group title row, then every row.
///
/// A UTF-8 byte order mark is emitted by default so spreadsheet programs
/// detect the encoding of non-ASCII labels.
pub struct CsvSink<W: Write> {
    state: State<W>,
    bom: bool,
}

enum State<W: Write> {
    /// Header not written yet.
    Pending(W),
    Writing(Writer<W>),
    /// A header write failed.
    Poisoned,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self::with_bom(inner, true)
    }

    pub fn with_bom(inner: W, bom: bool) -> Self {
        CsvSink {
            state: State::Pending(inner),
            bom,
        }
    }

    pub fn into_inner(self) -> Result<W, ExportError> {
        match self.state {
            State::Pending(inner) => Ok(inner),
            State::Writing(writer) => writer
                .into_inner()
                .map_err(|err| ExportError::Io(err.into_error())),
            State::Poisoned => Err(ExportError::layout("csv sink failed earlier")),
        }
    }

    fn writer(&mut self) -> Result<&mut Writer<W>, ExportError> {
        match &mut self.state {
            State::Writing(writer) => Ok(writer),
            _ => Err(ExportError::layout("csv row written before header")),
        }
    }
}

impl<W: Write> TableSink for CsvSink<W> {
    fn header(&mut self, header: &Header<'_>) -> Result<(), ExportError> {
        let mut inner = match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Pending(inner) => inner,
            _ => return Err(ExportError::layout("csv header written twice")),
        };
        if self.bom {
            inner.write_all(UTF8_BOM)?;
        }
        let mut writer = WriterBuilder::new().from_writer(inner);
        if !header.groups.is_empty() {
            let mut titles = vec![""; header.labels.len()];
            for span in header.groups {
                if let Some(slot) = titles.get_mut(span.columns.start) {
                    *slot = span.title.as_str();
                }
            }
            writer.write_record(&titles)?;
        }
        writer.write_record(header.labels)?;
        self.state = State::Writing(writer);
        Ok(())
    }

    fn row(&mut self, values: &[String]) -> Result<(), ExportError> {
        self.writer()?.write_record(values)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        match &mut self.state {
            State::Pending(inner) => inner.flush()?,
            State::Writing(writer) => writer.flush()?,
            State::Poisoned => return Err(ExportError::layout("csv sink failed earlier")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GroupSpan;

    fn labels() -> Vec<String> {
        vec!["Name".into(), "Port".into()]
    }

    #[test]
    fn writes_bom_header_and_rows() {
        let labels = labels();
        let mut sink = CsvSink::new(Vec::new());
        sink.header(&Header {
            labels: &labels,
            groups: &[],
        })
        .expect("header");
        sink.row(&["sw, 1".to_string(), String::new()]).expect("row");
        sink.finish().expect("finish");
        let bytes = sink.into_inner().expect("inner");
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).expect("utf8");
        assert_eq!(text, "Name,Port\n\"sw, 1\",\n");
    }

    #[test]
    fn bom_can_be_disabled() {
        let labels = labels();
        let mut sink = CsvSink::with_bom(Vec::new(), false);
        sink.header(&Header {
            labels: &labels,
            groups: &[],
        })
        .expect("header");
        sink.finish().expect("finish");
        assert_eq!(sink.into_inner().expect("inner"), b"Name,Port\n");
    }

    #[test]
    fn group_titles_precede_labels() {
        let labels = labels();
        let groups = [GroupSpan {
            title: "Ports".into(),
            columns: 1..2,
        }];
        let mut sink = CsvSink::with_bom(Vec::new(), false);
        sink.header(&Header {
            labels: &labels,
            groups: &groups,
        })
        .expect("header");
        sink.finish().expect("finish");
        let bytes = sink.into_inner().expect("inner");
        assert_eq!(bytes, b",Ports\nName,Port\n");
    }

    #[test]
    fn rows_require_a_header() {
        let mut sink = CsvSink::new(Vec::new());
        assert!(matches!(
            sink.row(&["x".to_string()]),
            Err(ExportError::Layout(_))
        ));
    }
}
