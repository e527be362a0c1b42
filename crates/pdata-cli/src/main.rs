use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdata_table::{ColumnSchema, Table};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "pdata")]
#[command(about = "Convert, inspect and sort tables stored as CSV, TSV, ODS or binary snapshots.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a table and save it in another format.
    Convert(ConvertArgs),
    /// Print row count, column count and schema as JSON.
    Info(InfoArgs),
    /// Sort a table by one column and save the result.
    Sort(SortArgs),
}

#[derive(Debug, Parser)]
struct ConvertArgs {
    input: PathBuf,

    /// Output path; the format comes from its extension unless `--output-options` names one.
    output: PathBuf,

    /// Load options, e.g. `header` or `tsv, header`.
    #[arg(long)]
    input_options: Option<String>,

    /// Save format (`csv`, `tsv`, `html`, `ods`, `bin`).
    #[arg(long)]
    output_options: Option<String>,
}

#[derive(Debug, Parser)]
struct InfoArgs {
    input: PathBuf,

    /// Load options, e.g. `header`.
    #[arg(long)]
    options: Option<String>,
}

#[derive(Debug, Parser)]
struct SortArgs {
    input: PathBuf,

    output: PathBuf,

    /// Column title, or a zero-based column index.
    #[arg(long)]
    column: String,

    /// Sort in descending order.
    #[arg(long)]
    reverse: bool,

    /// Load options, e.g. `header`.
    #[arg(long)]
    options: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoReport<'a> {
    path: &'a str,
    rows: usize,
    columns: usize,
    schema: Vec<ColumnSchema>,
}

fn load(path: &Path, options: Option<&str>) -> Result<Table> {
    Table::open(path, options).with_context(|| format!("load {}", path.display()))
}

fn save(table: &Table, path: &Path, options: Option<&str>) -> Result<()> {
    table
        .save(path, options)
        .with_context(|| format!("save {}", path.display()))
}

/// Titles win over indices, so a column titled `2` is found by name.
fn resolve_column(table: &Table, column: &str) -> Result<usize> {
    if let Some(idx) = table.find_column_index(column) {
        return Ok(idx);
    }
    match column.parse::<usize>() {
        Ok(idx) if idx < table.column_count() => Ok(idx),
        Ok(idx) => anyhow::bail!(
            "column {idx} is out of range; the table has {} columns",
            table.column_count()
        ),
        Err(_) => anyhow::bail!("no column titled '{column}'"),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert(args) => {
            let table = load(&args.input, args.input_options.as_deref())?;
            save(&table, &args.output, args.output_options.as_deref())
        }
        Command::Info(args) => {
            let table = load(&args.input, args.options.as_deref())?;
            let report = InfoReport {
                path: &args.input.to_string_lossy(),
                rows: table.row_count(),
                columns: table.column_count(),
                schema: table.schema(),
            };
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
            Ok(())
        }
        Command::Sort(args) => {
            let mut table = load(&args.input, args.options.as_deref())?;
            let column = resolve_column(&table, &args.column)?;
            table.sort(column, args.reverse)?;
            save(&table, &args.output, None)
        }
    }
}

fn main() -> Result<()> {
    run(Cli::parse())
}
