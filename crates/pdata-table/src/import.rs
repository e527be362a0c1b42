//! Streaming CSV/TSV ingestion and file loading.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use crate::error::{Result, TableError};
use crate::options::{ParseOptions, TableFormat};
use crate::table::Table;
use crate::tokenizer::{CsvError, Delimiter, LineSource, ReaderLines, RecordReader};

/// Row capacity reserved before the first record; doubles whenever it fills up.
const INITIAL_ROWS: usize = 10;

fn map_csv_error(err: CsvError, record: u64) -> TableError {
    match err {
        CsvError::UnterminatedQuote { line } => TableError::UnterminatedQuote { line },
        CsvError::InvalidUtf8 { line } => TableError::InvalidUtf8 { line },
        CsvError::Io(source) => TableError::Read { record, source },
    }
}

impl Table {
    /// Parse a table from `reader` in the format named by `options`.
    pub fn parse<R: BufRead>(mut reader: R, options: &ParseOptions) -> Result<Table> {
        match options.format {
            TableFormat::Csv => Self::parse_records(
                ReaderLines::new(reader, options.encoding),
                Delimiter::Comma,
                options.header,
            ),
            TableFormat::Tsv => Self::parse_records(
                ReaderLines::new(reader, options.encoding),
                Delimiter::Tab,
                options.header,
            ),
            TableFormat::Ods => {
                // The zip reader needs to seek.
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Self::read_ods(Cursor::new(bytes), options.header)
            }
            TableFormat::Bin => Self::load_binary(reader),
            TableFormat::Html => Err(TableError::InvalidOption("html".to_owned())),
        }
    }

    /// Parse CSV or TSV text that is already in memory.
    pub fn parse_str(text: &str, options: &ParseOptions) -> Result<Table> {
        match options.format {
            TableFormat::Csv => Self::parse_records(text.lines(), Delimiter::Comma, options.header),
            TableFormat::Tsv => Self::parse_records(text.lines(), Delimiter::Tab, options.header),
            _ => Self::parse(text.as_bytes(), options),
        }
    }

    /// Build a table from every record in `source`.
    ///
    /// With `header`, the first record supplies the column titles. Records shorter than the
    /// table are padded with missing values; longer records add string columns.
    pub fn parse_records<S: LineSource>(
        source: S,
        delimiter: Delimiter,
        header: bool,
    ) -> Result<Table> {
        let mut reader = RecordReader::new(source, delimiter);
        let mut table = Table::new();
        let mut header = header;
        let mut record: u64 = 0;
        let mut row = 0;

        loop {
            let fields = match reader.next_record() {
                Ok(Some(fields)) => fields,
                Ok(None) => break,
                Err(err) => return Err(map_csv_error(err, record + 1)),
            };
            record += 1;

            if header {
                table.set_column_titles(&fields);
                header = false;
                continue;
            }
            if row >= table.row_capacity() {
                table.reserve_rows((row * 2).max(INITIAL_ROWS));
            }
            table.set_row_strings(row, &fields);
            row += 1;
        }

        table.shrink_to_fit();
        log::debug!(
            "parsed {} rows and {} columns from {} lines",
            table.row_count(),
            table.column_count(),
            reader.lines_read()
        );
        Ok(table)
    }

    /// Load a table from a file.
    ///
    /// The format comes from the extension (`csv`, `tsv`, `ods`, `bin`) unless `options` names
    /// one; `options` may also contain `header` and an encoding.
    pub fn open(path: impl AsRef<Path>, options: Option<&str>) -> Result<Table> {
        let path = path.as_ref();
        let options = ParseOptions::for_path(path, options)?;
        let file = File::open(path)?;
        match options.format {
            TableFormat::Ods => Self::read_ods(file, options.header),
            _ => Self::parse(BufReader::new(file), &options),
        }
    }

    /// Load titles and types from a dictionary file, then the data itself.
    ///
    /// The dictionary is a table with `title` and `type` columns, one row per data column.
    pub fn open_with_dictionary(
        path: impl AsRef<Path>,
        options: Option<&str>,
        dictionary: &Table,
    ) -> Result<Table> {
        let mut table = Self::open(path, options)?;
        table.set_column_types(dictionary)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{self, Read};

    #[test]
    fn header_row_becomes_titles() {
        let table =
            Table::parse_str("name,age\nAda,36\nbob,25\n", &ParseOptions::csv().with_header(true))
                .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get_string(1, "name").unwrap().as_deref(), Some("bob"));
    }

    #[test]
    fn ragged_records_pad_and_grow() {
        let table = Table::parse_str("a\nb,c,d\ne,f\n", &ParseOptions::csv()).unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.get_string(0, 2usize).unwrap(), None);
        assert_eq!(table.get_string(1, 2usize).unwrap().as_deref(), Some("d"));
        assert_eq!(table.get_string(2, 2usize).unwrap(), None);
    }

    #[test]
    fn streaming_ingest_shrinks_to_row_count() {
        let text: String = (0..1000).map(|i| format!("{i}\n")).collect();
        let table = Table::parse(text.as_bytes(), &ParseOptions::csv()).unwrap();
        assert_eq!(table.row_count(), 1000);
        assert!(table.row_capacity() >= 1000);
        assert_eq!(table.get_string(999, 0usize).unwrap().as_deref(), Some("999"));
    }

    #[test]
    fn unterminated_quote_is_fatal() {
        let err = Table::parse_str("a,b\n\"open,c\n", &ParseOptions::csv()).unwrap_err();
        assert!(matches!(err, TableError::UnterminatedQuote { line: 2 }));
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream closed"));
            }
            self.served = true;
            let data = b"one\ntwo\n";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    #[test]
    fn io_failure_reports_the_record_number() {
        let reader = BufReader::new(FailingReader { served: false });
        let err = Table::parse(reader, &ParseOptions::csv()).unwrap_err();
        match err {
            TableError::Read { record, source } => {
                assert_eq!(record, 3);
                assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn html_cannot_be_parsed() {
        let opts = ParseOptions {
            format: TableFormat::Html,
            ..ParseOptions::default()
        };
        assert!(matches!(
            Table::parse_str("<table></table>", &opts),
            Err(TableError::InvalidOption(_))
        ));
    }
}
