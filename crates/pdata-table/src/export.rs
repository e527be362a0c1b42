//! Text writers and file saving.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use crate::error::Result;
use crate::options::{save_format, TableFormat};
use crate::table::Table;

fn write_entry_csv<W: Write>(out: &mut W, entry: Option<&str>) -> Result<()> {
    let Some(entry) = entry else {
        return Ok(());
    };
    if entry.contains('"') {
        write!(out, "\"{}\"", entry.replace('"', "\"\""))?;
    } else if entry.contains(|c| matches!(c, ',' | '\n' | '\r'))
        || entry.starts_with(' ')
        || entry.ends_with(' ')
    {
        write!(out, "\"{entry}\"")?;
    } else {
        out.write_all(entry.as_bytes())?;
    }
    Ok(())
}

fn write_entry_html<W: Write>(out: &mut W, entry: &str) -> Result<()> {
    for c in entry.chars() {
        match c {
            '<' => out.write_all(b"&lt;")?,
            '>' => out.write_all(b"&gt;")?,
            '&' => out.write_all(b"&amp;")?,
            '\'' => out.write_all(b"&apos;")?,
            '"' => out.write_all(b"&quot;")?,
            c if c.is_ascii() => out.write_all(&[c as u8])?,
            c => write!(out, "&#{};", c as u32)?,
        }
    }
    Ok(())
}

impl Table {
    fn text_rows(&self) -> impl Iterator<Item = Vec<Option<String>>> + '_ {
        self.rows().map(|row| {
            (0..self.column_count())
                .map(|col| self.columns[col].get_string(row.index(), &self.missing))
                .collect()
        })
    }

    /// Write CSV, preceded by a title row when the table has titles.
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        if let Some(titles) = &self.titles {
            write_record_csv(&mut out, titles.iter().map(Option::as_deref))?;
        }
        for cells in self.text_rows() {
            write_record_csv(&mut out, cells.iter().map(Option::as_deref))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write TSV. Entries are written as-is; tabs and newlines inside cells are not escaped.
    pub fn write_tsv<W: Write>(&self, mut out: W) -> Result<()> {
        if let Some(titles) = &self.titles {
            write_record_tsv(&mut out, titles.iter().map(Option::as_deref))?;
        }
        for cells in self.text_rows() {
            write_record_tsv(&mut out, cells.iter().map(Option::as_deref))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write a minimal HTML page holding the table.
    pub fn write_html<W: Write>(&self, mut out: W) -> Result<()> {
        writeln!(out, "<html>")?;
        writeln!(out, "<head>")?;
        writeln!(
            out,
            "  <meta http-equiv=\"content-type\" content=\"text/html;charset=utf-8\" />"
        )?;
        writeln!(out, "</head>")?;
        writeln!(out, "<body>")?;
        writeln!(out, "  <table>")?;
        if let Some(titles) = &self.titles {
            writeln!(out, "    <tr>")?;
            for title in titles {
                write!(out, "      <th>")?;
                write_entry_html(&mut out, title.as_deref().unwrap_or(""))?;
                writeln!(out, "</th>")?;
            }
            writeln!(out, "    </tr>")?;
        }
        for cells in self.text_rows() {
            writeln!(out, "    <tr>")?;
            for cell in &cells {
                write!(out, "      <td>")?;
                write_entry_html(&mut out, cell.as_deref().unwrap_or(""))?;
                writeln!(out, "</td>")?;
            }
            writeln!(out, "    </tr>")?;
        }
        writeln!(out, "  </table>")?;
        writeln!(out, "</body>")?;
        writeln!(out, "</html>")?;
        out.flush()?;
        Ok(())
    }

    /// Write the table in `format` to a stream.
    pub fn write_to<W: Write>(&self, mut out: W, format: TableFormat) -> Result<()> {
        match format {
            TableFormat::Csv => self.write_csv(out),
            TableFormat::Tsv => self.write_tsv(out),
            TableFormat::Html => self.write_html(out),
            TableFormat::Bin => self.save_binary(out),
            TableFormat::Ods => {
                // The zip writer needs to seek back to patch local headers.
                let mut buf = Cursor::new(Vec::new());
                self.write_ods(&mut buf)?;
                out.write_all(buf.get_ref())?;
                out.flush()?;
                Ok(())
            }
        }
    }

    /// Save to a file. The format comes from `options` if given, else from the extension.
    pub fn save(&self, path: impl AsRef<Path>, options: Option<&str>) -> Result<()> {
        let path = path.as_ref();
        let format = save_format(path, options)?;
        let file = File::create(path)?;
        match format {
            TableFormat::Ods => self.write_ods(file),
            other => self.write_to(BufWriter::new(file), other),
        }
    }
}

fn write_record_csv<'a, W: Write>(
    out: &mut W,
    entries: impl Iterator<Item = Option<&'a str>>,
) -> Result<()> {
    for (i, entry) in entries.enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        }
        write_entry_csv(out, entry)?;
    }
    out.write_all(b"\n")?;
    Ok(())
}

fn write_record_tsv<'a, W: Write>(
    out: &mut W,
    entries: impl Iterator<Item = Option<&'a str>>,
) -> Result<()> {
    for (i, entry) in entries.enumerate() {
        if i > 0 {
            out.write_all(b"\t")?;
        }
        out.write_all(entry.unwrap_or("").as_bytes())?;
    }
    out.write_all(b"\n")?;
    Ok(())
}
