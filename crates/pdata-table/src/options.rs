use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, TableError};

/// On-disk representations a table can be loaded from or saved to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TableFormat {
    #[default]
    Csv,
    Tsv,
    /// Output only.
    Html,
    Ods,
    /// The private binary snapshot format.
    Bin,
}

impl TableFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Csv),
            "tsv" => Some(TableFormat::Tsv),
            "html" | "htm" => Some(TableFormat::Html),
            "ods" => Some(TableFormat::Ods),
            "bin" => Some(TableFormat::Bin),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// Decode as UTF-8; lines that aren't valid UTF-8 fall back to Windows-1252.
    ///
    /// This matches what spreadsheet exports on Windows usually need.
    #[default]
    Auto,
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    /// Decode as Windows-1252 (aka CP-1252).
    Windows1252,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub format: TableFormat,
    /// Treat the first record as column titles.
    pub header: bool,
    pub encoding: TextEncoding,
}

impl ParseOptions {
    pub fn csv() -> Self {
        Self::default()
    }

    pub fn tsv() -> Self {
        Self {
            format: TableFormat::Tsv,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Combine the extension of `path` with an explicit option string.
    ///
    /// Explicit options win: they are applied after the extension.
    pub fn for_path(path: &Path, options: Option<&str>) -> Result<Self> {
        let from_ext = TableFormat::from_extension(path)
            .filter(|f| !matches!(f, TableFormat::Html));
        match (from_ext, options) {
            (None, None) => Err(TableError::UnknownFormat {
                path: path.to_path_buf(),
            }),
            (Some(format), options) => {
                let mut parsed = match options {
                    Some(opts) => opts.parse::<ParseOptions>()?,
                    None => ParseOptions::default(),
                };
                if !options.is_some_and(mentions_format) {
                    parsed.format = format;
                }
                Ok(parsed)
            }
            (None, Some(opts)) => {
                if !mentions_format(opts) {
                    return Err(TableError::UnknownFormat {
                        path: path.to_path_buf(),
                    });
                }
                opts.parse()
            }
        }
    }
}

fn split_options(options: &str) -> impl Iterator<Item = &str> {
    options
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

fn mentions_format(options: &str) -> bool {
    split_options(options).any(|opt| {
        matches!(
            opt.to_ascii_lowercase().as_str(),
            "csv" | "tsv" | "ods" | "bin" | "html"
        )
    })
}

impl FromStr for ParseOptions {
    type Err = TableError;

    /// Parse an option string such as `"header, tsv"`.
    fn from_str(options: &str) -> Result<Self> {
        let mut out = ParseOptions::default();
        for opt in split_options(options) {
            match opt.to_ascii_lowercase().as_str() {
                "csv" => out.format = TableFormat::Csv,
                "tsv" => out.format = TableFormat::Tsv,
                "ods" => out.format = TableFormat::Ods,
                "bin" => out.format = TableFormat::Bin,
                "header" => out.header = true,
                // Quoted fields may always span lines.
                "newlines" => {}
                "utf8" | "utf-8" => out.encoding = TextEncoding::Utf8,
                "windows-1252" | "cp1252" => out.encoding = TextEncoding::Windows1252,
                _ => return Err(TableError::InvalidOption(opt.to_owned())),
            }
        }
        Ok(out)
    }
}

/// Resolve the output format for `save`: explicit options win over the extension.
pub fn save_format(path: &Path, options: Option<&str>) -> Result<TableFormat> {
    if let Some(options) = options {
        let mut format = None;
        for opt in split_options(options) {
            format = Some(match opt.to_ascii_lowercase().as_str() {
                "csv" => TableFormat::Csv,
                "tsv" => TableFormat::Tsv,
                "html" => TableFormat::Html,
                "ods" => TableFormat::Ods,
                "bin" => TableFormat::Bin,
                _ => return Err(TableError::InvalidOption(opt.to_owned())),
            });
        }
        if let Some(format) = format {
            return Ok(format);
        }
    }
    TableFormat::from_extension(path).ok_or_else(|| TableError::UnknownFormat {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_strings_accept_commas_and_spaces() {
        let opts: ParseOptions = "header, tsv newlines".parse().unwrap();
        assert_eq!(opts.format, TableFormat::Tsv);
        assert!(opts.header);
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(matches!(
            "header,fancy".parse::<ParseOptions>(),
            Err(TableError::InvalidOption(opt)) if opt == "fancy"
        ));
    }

    #[test]
    fn extension_supplies_format_and_options_add_header() {
        let opts = ParseOptions::for_path(Path::new("data/Cars.TSV"), Some("header")).unwrap();
        assert_eq!(opts.format, TableFormat::Tsv);
        assert!(opts.header);
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let opts = ParseOptions::for_path(Path::new("data.tsv"), Some("csv")).unwrap();
        assert_eq!(opts.format, TableFormat::Csv);
    }

    #[test]
    fn missing_extension_needs_options() {
        assert!(matches!(
            ParseOptions::for_path(Path::new("data.txt"), None),
            Err(TableError::UnknownFormat { .. })
        ));
        assert!(matches!(
            ParseOptions::for_path(Path::new("data.txt"), Some("header")),
            Err(TableError::UnknownFormat { .. })
        ));
        let opts = ParseOptions::for_path(Path::new("data.txt"), Some("tsv")).unwrap();
        assert_eq!(opts.format, TableFormat::Tsv);
    }

    #[test]
    fn save_format_prefers_options() {
        assert_eq!(
            save_format(Path::new("out.csv"), Some("html")).unwrap(),
            TableFormat::Html
        );
        assert_eq!(save_format(Path::new("out.ods"), None).unwrap(), TableFormat::Ods);
        assert!(save_format(Path::new("out"), None).is_err());
    }
}
