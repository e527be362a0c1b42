//! Private binary snapshot format.
//!
//! All integers are little-endian. Layout:
//!
//! ```text
//! u32  magic (0x9007AB1E)
//! u64  row count
//! u32  column count
//! u8   has titles; if 1, one optional string per column
//! u8   type tag per column
//!      dictionary per category column, in column order (u32 count, optional string per slot)
//!      missing values: optional string, i32, i64, f32, f64, i32 (category)
//!      cells, row-major, each encoded per its column's type
//! ```
//!
//! Strings are a `u32` byte length followed by UTF-8. Optional strings are prefixed with a
//! presence byte.

use std::io::{self, Read, Write};

use crate::category::CategoryDictionary;
use crate::column::ColumnData;
use crate::error::{Result, TableError};
use crate::table::Table;
use crate::types::{ColumnType, MissingValues};

pub const MAGIC: u32 = 0x9007_AB1E;

fn read_error(err: io::Error, context: &'static str) -> TableError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        TableError::Truncated { context }
    } else {
        TableError::Io(err)
    }
}

pub(crate) struct SnapshotReader<R> {
    inner: R,
}

impl<R: Read> SnapshotReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn take<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|err| read_error(err, context))?;
        Ok(buf)
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.take::<1>(context)?[0])
    }

    pub fn read_u32(&mut self, context: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(context)?))
    }

    pub fn read_i32(&mut self, context: &'static str) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take(context)?))
    }

    pub fn read_u64(&mut self, context: &'static str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(context)?))
    }

    pub fn read_i64(&mut self, context: &'static str) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(context)?))
    }

    pub fn read_f32(&mut self, context: &'static str) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take(context)?))
    }

    pub fn read_f64(&mut self, context: &'static str) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take(context)?))
    }

    pub fn read_str(&mut self, context: &'static str) -> Result<String> {
        let len = self.read_u32(context)? as usize;
        // Read through `take` so a corrupt length can't force a huge up-front allocation.
        let mut bytes = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut bytes)
            .map_err(|err| read_error(err, context))?;
        if bytes.len() != len {
            return Err(TableError::Truncated { context });
        }
        String::from_utf8(bytes)
            .map_err(|_| TableError::Corrupt(format!("{context} is not valid UTF-8")))
    }

    pub fn read_opt_str(&mut self, context: &'static str) -> Result<Option<String>> {
        match self.read_u8(context)? {
            0 => Ok(None),
            1 => self.read_str(context).map(Some),
            flag => Err(TableError::Corrupt(format!(
                "invalid presence flag {flag} for {context}"
            ))),
        }
    }
}

pub(crate) struct SnapshotWriter<W> {
    inner: W,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_all(&[v])?;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        let len = u32::try_from(s.len()).map_err(|_| {
            TableError::Corrupt(format!("string of {} bytes is too long to store", s.len()))
        })?;
        self.write_u32(len)?;
        self.inner.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn write_opt_str(&mut self, s: Option<&str>) -> Result<()> {
        match s {
            Some(s) => {
                self.write_u8(1)?;
                self.write_str(s)
            }
            None => self.write_u8(0),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

fn write_missing<W: Write>(out: &mut SnapshotWriter<W>, missing: &MissingValues) -> Result<()> {
    out.write_opt_str(missing.string.as_deref())?;
    out.write_i32(missing.int)?;
    out.write_i64(missing.long)?;
    out.write_f32(missing.float)?;
    out.write_f64(missing.double)?;
    out.write_i32(missing.category)
}

fn read_missing<R: Read>(input: &mut SnapshotReader<R>) -> Result<MissingValues> {
    Ok(MissingValues {
        string: input.read_opt_str("missing string")?,
        int: input.read_i32("missing int")?,
        long: input.read_i64("missing long")?,
        float: input.read_f32("missing float")?,
        double: input.read_f64("missing double")?,
        category: input.read_i32("missing category")?,
    })
}

fn write_cell<W: Write>(out: &mut SnapshotWriter<W>, column: &ColumnData, row: usize) -> Result<()> {
    match column {
        ColumnData::Str(v) => out.write_opt_str(v[row].as_deref()),
        ColumnData::Int(v) => out.write_i32(v[row]),
        ColumnData::Long(v) => out.write_i64(v[row]),
        ColumnData::Float(v) => out.write_f32(v[row]),
        ColumnData::Double(v) => out.write_f64(v[row]),
        ColumnData::Category { indices, .. } => out.write_i32(indices[row]),
    }
}

fn read_cell<R: Read>(input: &mut SnapshotReader<R>, column: &mut ColumnData) -> Result<()> {
    match column {
        ColumnData::Str(v) => v.push(input.read_opt_str("string cell")?),
        ColumnData::Int(v) => v.push(input.read_i32("int cell")?),
        ColumnData::Long(v) => v.push(input.read_i64("long cell")?),
        ColumnData::Float(v) => v.push(input.read_f32("float cell")?),
        ColumnData::Double(v) => v.push(input.read_f64("double cell")?),
        ColumnData::Category { indices, .. } => indices.push(input.read_i32("category cell")?),
    }
    Ok(())
}

impl Table {
    /// Write the table in the binary snapshot format.
    pub fn save_binary<W: Write>(&self, output: W) -> Result<()> {
        let mut out = SnapshotWriter::new(output);
        out.write_u32(MAGIC)?;
        out.write_u64(self.row_count as u64)?;
        let column_count = u32::try_from(self.columns.len()).map_err(|_| {
            TableError::Corrupt(format!("{} columns is too many to store", self.columns.len()))
        })?;
        out.write_u32(column_count)?;

        match &self.titles {
            Some(titles) => {
                out.write_u8(1)?;
                for title in titles {
                    out.write_opt_str(title.as_deref())?;
                }
            }
            None => out.write_u8(0)?,
        }
        for column in &self.columns {
            out.write_u8(column.column_type().tag())?;
        }
        for dictionary in self.columns.iter().filter_map(ColumnData::dictionary) {
            dictionary.write_snapshot(&mut out)?;
        }
        write_missing(&mut out, &self.missing)?;

        for row in 0..self.row_count {
            for column in &self.columns {
                write_cell(&mut out, column, row)?;
            }
        }
        out.flush()
    }

    /// Read a table written by [`Table::save_binary`].
    pub fn load_binary<R: Read>(input: R) -> Result<Table> {
        let mut input = SnapshotReader::new(input);
        let magic = input.read_u32("magic number")?;
        if magic != MAGIC {
            return Err(TableError::BadMagic {
                expected: MAGIC,
                found: magic,
            });
        }

        let row_count = usize::try_from(input.read_u64("row count")?)
            .map_err(|_| TableError::Corrupt("row count does not fit in memory".to_owned()))?;
        let column_count = input.read_u32("column count")? as usize;

        let titles = match input.read_u8("title flag")? {
            0 => None,
            1 => Some(
                (0..column_count)
                    .map(|_| input.read_opt_str("column title"))
                    .collect::<Result<Vec<_>>>()?,
            ),
            flag => {
                return Err(TableError::Corrupt(format!("invalid title flag {flag}")));
            }
        };

        let mut types = Vec::new();
        for _ in 0..column_count {
            let tag = input.read_u8("column type")?;
            let column_type = ColumnType::from_tag(tag)
                .ok_or_else(|| TableError::Corrupt(format!("unknown column type tag {tag}")))?;
            types.push(column_type);
        }

        let mut columns = Vec::with_capacity(types.len());
        for column_type in &types {
            let column = match column_type {
                ColumnType::Category => ColumnData::Category {
                    indices: Vec::new(),
                    dictionary: CategoryDictionary::read_snapshot(&mut input)?,
                },
                other => ColumnData::new(*other, 0, &MissingValues::default()),
            };
            columns.push(column);
        }
        let missing = read_missing(&mut input)?;

        for _ in 0..row_count {
            for column in &mut columns {
                read_cell(&mut input, column)?;
            }
        }

        log::debug!("loaded snapshot with {row_count} rows and {column_count} columns");
        Ok(Table::from_parts(row_count, columns, titles, missing))
    }
}
