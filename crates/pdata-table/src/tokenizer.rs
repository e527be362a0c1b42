//! Record framing for CSV and TSV text.
//!
//! TSV is one physical line per record, split on tabs, with no quoting. CSV supports quoted
//! fields (`""` escapes a quote) that may contain delimiters and newlines; when a quoted field
//! is still open at the end of a physical line, the next line is pulled from the source and
//! scanning continues where it left off. Each character is visited once.

use std::io::BufRead;
use std::mem;

use encoding_rs::WINDOWS_1252;
use thiserror::Error;

use crate::options::TextEncoding;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: u64 },
    #[error("invalid UTF-8 on line {line}")]
    InvalidUtf8 { line: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    /// Comma separated, with quoting.
    Comma,
    /// Tab separated, without quoting.
    Tab,
}

/// A pull-based source of physical lines, without their terminators.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<String>, CsvError>;
}

impl<'a> LineSource for std::str::Lines<'a> {
    fn next_line(&mut self) -> Result<Option<String>, CsvError> {
        Ok(self.next().map(str::to_owned))
    }
}

/// Lines read from a byte stream and decoded with a [`TextEncoding`].
pub struct ReaderLines<R> {
    reader: R,
    encoding: TextEncoding,
    buf: Vec<u8>,
    line: u64,
    fell_back: bool,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R, encoding: TextEncoding) -> Self {
        Self {
            reader,
            encoding,
            buf: Vec::new(),
            line: 0,
            fell_back: false,
        }
    }

    /// Whether any line needed the Windows-1252 fallback.
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    fn decode(&mut self) -> Result<String, CsvError> {
        let mut bytes = self.buf.as_slice();
        // Excel-exported files commonly start with a UTF-8 BOM.
        if self.line == 1 {
            bytes = bytes.strip_prefix(&[0xEF_u8, 0xBB, 0xBF]).unwrap_or(bytes);
        }

        match self.encoding {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| CsvError::InvalidUtf8 { line: self.line }),
            TextEncoding::Windows1252 => Ok(WINDOWS_1252.decode(bytes).0.into_owned()),
            TextEncoding::Auto => match std::str::from_utf8(bytes) {
                Ok(s) => Ok(s.to_owned()),
                Err(_) => {
                    if !self.fell_back {
                        log::warn!(
                            "line {} is not valid UTF-8; decoding as Windows-1252",
                            self.line
                        );
                        self.fell_back = true;
                    }
                    Ok(WINDOWS_1252.decode(bytes).0.into_owned())
                }
            },
        }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn next_line(&mut self) -> Result<Option<String>, CsvError> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        self.decode().map(Some)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Saw a `"` inside a quoted field; the next character decides what it meant.
    QuoteInQuoted,
}

/// Produces one field array per logical record.
pub struct RecordReader<S> {
    source: S,
    delimiter: Delimiter,
    lines_read: u64,
}

impl<S: LineSource> RecordReader<S> {
    pub fn new(source: S, delimiter: Delimiter) -> Self {
        Self {
            source,
            delimiter,
            lines_read: 0,
        }
    }

    /// Number of physical lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn next_record(&mut self) -> Result<Option<Vec<String>>, CsvError> {
        let Some(line) = self.pull_line()? else {
            return Ok(None);
        };
        match self.delimiter {
            Delimiter::Tab => Ok(Some(line.split('\t').map(str::to_owned).collect())),
            Delimiter::Comma => self.split_csv(line).map(Some),
        }
    }

    fn pull_line(&mut self) -> Result<Option<String>, CsvError> {
        let line = self.source.next_line()?;
        if line.is_some() {
            self.lines_read += 1;
        }
        Ok(line)
    }

    fn split_csv(&mut self, first: String) -> Result<Vec<String>, CsvError> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut state = State::FieldStart;
        let mut quote_line = self.lines_read;
        let mut line = first;

        loop {
            for ch in line.chars() {
                state = match (state, ch) {
                    (State::FieldStart, '"') => {
                        quote_line = self.lines_read;
                        State::Quoted
                    }
                    (State::FieldStart | State::Unquoted, ',') => {
                        fields.push(mem::take(&mut field));
                        State::FieldStart
                    }
                    // A stray quote in an unquoted field is kept literally.
                    (State::FieldStart | State::Unquoted, c) => {
                        field.push(c);
                        State::Unquoted
                    }
                    (State::Quoted, '"') => State::QuoteInQuoted,
                    (State::Quoted, c) => {
                        field.push(c);
                        State::Quoted
                    }
                    (State::QuoteInQuoted, '"') => {
                        field.push('"');
                        State::Quoted
                    }
                    (State::QuoteInQuoted, ',') => {
                        fields.push(mem::take(&mut field));
                        State::FieldStart
                    }
                    // Only a quote followed by a delimiter or end of line closes the field.
                    (State::QuoteInQuoted, c) => {
                        field.push('"');
                        field.push(c);
                        State::Quoted
                    }
                };
            }

            if state != State::Quoted {
                fields.push(field);
                return Ok(fields);
            }

            match self.pull_line()? {
                Some(next) => {
                    field.push('\n');
                    line = next;
                }
                None => return Err(CsvError::UnterminatedQuote { line: quote_line }),
            }
        }
    }
}

impl<S: LineSource> Iterator for RecordReader<S> {
    type Item = Result<Vec<String>, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Split CSV text holding a single logical record (which may span lines).
pub fn split_line_csv(text: &str) -> Result<Vec<String>, CsvError> {
    let mut reader = RecordReader::new(text.lines(), Delimiter::Comma);
    Ok(reader.next_record()?.unwrap_or_else(|| vec![String::new()]))
}

pub fn split_line_tsv(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_owned).collect()
}
