//! OpenDocument spreadsheet (`.ods`) reading and writing.
//!
//! Only the first sheet is read, and cell formatting is ignored. Written files contain the
//! three parts a spreadsheet application needs to recognise the package: `mimetype` (stored,
//! first), `META-INF/manifest.xml` and `content.xml`.

use std::borrow::Cow;
use std::io::{Read, Seek, Write};

use roxmltree::Node;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::column::ColumnData;
use crate::error::{Result, TableError};
use crate::table::Table;

const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const TABLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
const TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";

const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

const MANIFEST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#;

fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(|c| matches!(c, '<' | '>' | '&' | '"' | '\'')) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn write_string_cell<W: Write>(out: &mut W, text: Option<&str>) -> Result<()> {
    let Some(text) = text else {
        out.write_all(b"<table:table-cell/>")?;
        return Ok(());
    };
    out.write_all(b"<table:table-cell office:value-type=\"string\">")?;
    // One paragraph per line.
    for line in text.split('\n') {
        write!(out, "<text:p>{}</text:p>", escape_xml(line))?;
    }
    out.write_all(b"</table:table-cell>")?;
    Ok(())
}

fn write_float_cell<W: Write>(out: &mut W, value: String) -> Result<()> {
    write!(
        out,
        "<table:table-cell office:value-type=\"float\" office:value=\"{value}\"><text:p>{value}</text:p></table:table-cell>"
    )?;
    Ok(())
}

impl Table {
    /// Write the table as a single-sheet OpenDocument spreadsheet.
    pub fn write_ods<W: Write + Seek>(&self, output: W) -> Result<()> {
        let mut zip = ZipWriter::new(output);
        let stored = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
        let deflated = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        // `mimetype` must be the first entry and uncompressed.
        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE.as_bytes())?;

        zip.start_file("META-INF/manifest.xml", deflated)?;
        zip.write_all(MANIFEST_XML.as_bytes())?;

        zip.start_file("content.xml", deflated)?;
        self.write_ods_content(&mut zip)?;

        zip.finish()?;
        Ok(())
    }

    fn write_ods_content<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(
            out,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="{OFFICE_NS}" xmlns:table="{TABLE_NS}" xmlns:text="{TEXT_NS}" office:version="1.2"><office:body><office:spreadsheet><table:table table:name="Sheet1">"#
        )?;

        if let Some(titles) = &self.titles {
            out.write_all(b"<table:table-row>")?;
            for title in titles {
                write_string_cell(out, title.as_deref())?;
            }
            out.write_all(b"</table:table-row>")?;
        }

        for row in 0..self.row_count {
            out.write_all(b"<table:table-row>")?;
            for column in &self.columns {
                match column {
                    ColumnData::Int(v) => write_float_cell(out, v[row].to_string())?,
                    ColumnData::Long(v) => write_float_cell(out, v[row].to_string())?,
                    ColumnData::Float(v) if !v[row].is_nan() => {
                        write_float_cell(out, v[row].to_string())?
                    }
                    ColumnData::Double(v) if !v[row].is_nan() => {
                        write_float_cell(out, v[row].to_string())?
                    }
                    _ => write_string_cell(out, column.get_text(row, &self.missing).as_deref())?,
                }
            }
            out.write_all(b"</table:table-row>")?;
        }

        out.write_all(b"</table:table></office:spreadsheet></office:body></office:document-content>\n")?;
        Ok(())
    }

    /// Read the first sheet of an OpenDocument spreadsheet.
    ///
    /// With `header`, the first non-empty row supplies the column titles.
    pub fn read_ods<R: Read + Seek>(reader: R, header: bool) -> Result<Table> {
        let mut archive = ZipArchive::new(reader)?;
        let mut xml = String::new();
        archive.by_name("content.xml")?.read_to_string(&mut xml)?;

        let doc = roxmltree::Document::parse(&xml)?;
        let sheet = doc
            .descendants()
            .find(|n| n.has_tag_name((TABLE_NS, "table")))
            .ok_or_else(|| TableError::InvalidDocument("content.xml has no sheet".to_owned()))?;

        let mut table = Table::new();
        let mut header = header;
        let mut row = 0;
        // Blank rows are only materialised when a non-blank row follows them.
        let mut blank_rows = 0;

        for row_node in sheet
            .descendants()
            .filter(|n| n.has_tag_name((TABLE_NS, "table-row")))
        {
            let repeat = repeat_count(row_node, "number-rows-repeated")?;
            let fields = row_fields(row_node)?;
            if fields.is_empty() {
                blank_rows += repeat;
                continue;
            }
            if header {
                table.set_column_titles(&fields);
                header = false;
                blank_rows = 0;
                continue;
            }
            for _ in 0..blank_rows {
                table.set_row_strings::<&str>(row, &[]);
                row += 1;
            }
            blank_rows = 0;
            for _ in 0..repeat {
                table.set_row_strings(row, &fields);
                row += 1;
            }
        }

        log::debug!(
            "read {} rows and {} columns from spreadsheet",
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }
}

fn repeat_count(node: Node<'_, '_>, attr: &str) -> Result<usize> {
    match node.attribute((TABLE_NS, attr)) {
        None => Ok(1),
        Some(value) => value.parse::<usize>().map_err(|_| {
            TableError::InvalidDocument(format!("invalid table:{attr} value '{value}'"))
        }),
    }
}

/// Text of each cell in a row, without trailing empty cells.
fn row_fields(row: Node<'_, '_>) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut blank_cells = 0;
    for cell in row.children().filter(|n| {
        n.has_tag_name((TABLE_NS, "table-cell")) || n.has_tag_name((TABLE_NS, "covered-table-cell"))
    }) {
        let repeat = repeat_count(cell, "number-columns-repeated")?;
        let text = cell_text(cell);
        if text.is_empty() {
            blank_cells += repeat;
            continue;
        }
        fields.resize(fields.len() + blank_cells, String::new());
        blank_cells = 0;
        for _ in 0..repeat {
            fields.push(text.clone());
        }
    }
    Ok(fields)
}

fn cell_text(cell: Node<'_, '_>) -> String {
    let value_attr = match cell.attribute((OFFICE_NS, "value-type")) {
        Some("float" | "percentage" | "currency") => Some("value"),
        Some("date") => Some("date-value"),
        Some("time") => Some("time-value"),
        Some("boolean") => Some("boolean-value"),
        _ => None,
    };
    if let Some(value) = value_attr.and_then(|attr| cell.attribute((OFFICE_NS, attr))) {
        return value.to_owned();
    }

    let mut text = String::new();
    for (i, p) in cell
        .children()
        .filter(|n| n.has_tag_name((TEXT_NS, "p")))
        .enumerate()
    {
        if i > 0 {
            text.push('\n');
        }
        append_paragraph(p, &mut text);
    }
    text
}

fn append_paragraph(node: Node<'_, '_>, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or(""));
        } else if child.has_tag_name((TEXT_NS, "s")) {
            let count = child
                .attribute((TEXT_NS, "c"))
                .and_then(|c| c.parse::<usize>().ok())
                .unwrap_or(1);
            out.extend(std::iter::repeat(' ').take(count));
        } else if child.has_tag_name((TEXT_NS, "tab")) {
            out.push('\t');
        } else if child.has_tag_name((TEXT_NS, "line-break")) {
            out.push('\n');
        } else {
            append_paragraph(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::types::{ColumnType, Value};

    fn sheet(rows: &str) -> Vec<u8> {
        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="{OFFICE_NS}" xmlns:table="{TABLE_NS}" xmlns:text="{TEXT_NS}"><office:body><office:spreadsheet><table:table table:name="S">{rows}</table:table></office:spreadsheet></office:body></office:document-content>"#
        );
        let mut buf = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buf);
        let options = FileOptions::<()>::default();
        zip.start_file("content.xml", options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
        zip.finish().unwrap();
        buf.into_inner()
    }

    #[test]
    fn repeated_cells_and_rows_expand_but_trailing_blanks_do_not() {
        let bytes = sheet(
            r#"<table:table-row table:number-rows-repeated="2">
                 <table:table-cell office:value-type="string"><text:p>x</text:p></table:table-cell>
                 <table:table-cell table:number-columns-repeated="2"/>
                 <table:table-cell office:value-type="float" office:value="1.5"><text:p>1,5</text:p></table:table-cell>
                 <table:table-cell table:number-columns-repeated="1000"/>
               </table:table-row>
               <table:table-row table:number-rows-repeated="1048000"><table:table-cell/></table:table-row>"#,
        );
        let table = Table::read_ods(Cursor::new(bytes), false).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.get_string(1, 3usize).unwrap().as_deref(), Some("1.5"));
        assert_eq!(table.get_string(1, 1usize).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn paragraphs_and_spaces_are_joined() {
        let bytes = sheet(
            r#"<table:table-row><table:table-cell><text:p>a<text:s text:c="2"/>b</text:p><text:p>c</text:p></table:table-cell></table:table-row>"#,
        );
        let table = Table::read_ods(Cursor::new(bytes), false).unwrap();
        assert_eq!(table.get_string(0, 0usize).unwrap().as_deref(), Some("a  b\nc"));
    }

    #[test]
    fn written_package_starts_with_stored_mimetype() {
        let mut table = Table::with_columns(&[("n", ColumnType::Int)]);
        table.add_row_values(&[Value::Int(3)]);
        let mut buf = Cursor::new(Vec::new());
        table.write_ods(&mut buf).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        drop(first);
        assert!(archive.by_name("META-INF/manifest.xml").is_ok());
    }

    #[test]
    fn missing_content_is_an_error() {
        let mut buf = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buf);
        zip.start_file("other.xml", FileOptions::<()>::default()).unwrap();
        zip.finish().unwrap();
        assert!(matches!(
            Table::read_ods(Cursor::new(buf.into_inner()), false),
            Err(TableError::Zip(_))
        ));
    }
}
