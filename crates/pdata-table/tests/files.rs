use pdata_table::{ColumnType, Table, TableError};
use pretty_assertions::assert_eq;

fn sample() -> Table {
    let mut table = Table::with_columns(&[
        ("city", ColumnType::String),
        ("population", ColumnType::Int),
        ("area", ColumnType::Double),
    ]);
    table.add_row_values(&["Lisbon".into(), 545_000.into(), 100.05f64.into()]);
    table.add_row_values(&["Porto, Norte".into(), 232_000.into(), 41.42f64.into()]);
    table
}

fn assert_sample_text(table: &Table) {
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_index("area").unwrap(), 2);
    assert_eq!(
        table.get_string(1, "city").unwrap().as_deref(),
        Some("Porto, Norte")
    );
    assert_eq!(table.get_int(0, "population").unwrap(), 545_000);
    assert_eq!(table.get_double(1, "area").unwrap(), 41.42);
}

#[test]
fn csv_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.csv");
    sample().save(&path, None).unwrap();

    let table = Table::open(&path, Some("header")).unwrap();
    assert_sample_text(&table);
}

#[test]
fn tsv_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.tsv");
    sample().save(&path, None).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("city\tpopulation\tarea\n"), "{text}");
    assert_sample_text(&Table::open(&path, Some("header")).unwrap());
}

#[test]
fn ods_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.ods");
    sample().save(&path, None).unwrap();

    let mut table = Table::open(&path, Some("header")).unwrap();
    table.set_column_type("population", ColumnType::Int).unwrap();
    assert_eq!(table.column_type("population").unwrap(), ColumnType::Int);
    assert_sample_text(&table);
}

#[test]
fn binary_file_keeps_types() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.bin");
    sample().save(&path, None).unwrap();

    let table = Table::open(&path, None).unwrap();
    assert_eq!(table.column_types(), sample().column_types());
    assert_sample_text(&table);
}

#[test]
fn html_is_export_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.html");
    sample().save(&path, None).unwrap();

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("<td>Porto, Norte</td>"));
    assert!(matches!(
        Table::open(&path, None),
        Err(TableError::UnknownFormat { .. })
    ));
}

#[test]
fn options_override_the_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.txt");
    sample().save(&path, Some("tsv")).unwrap();

    assert!(matches!(
        Table::open(&path, None),
        Err(TableError::UnknownFormat { .. })
    ));
    assert_sample_text(&Table::open(&path, Some("tsv, header")).unwrap());
}

#[test]
fn dictionary_file_assigns_titles_and_types() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    std::fs::write(&data, "1,red\n2,blue\n3,red\n").unwrap();

    let mut dictionary = Table::with_columns(&[("title", ColumnType::String), ("type", ColumnType::String)]);
    dictionary.add_row_values(&["id".into(), "int".into()]);
    dictionary.add_row_values(&["colour".into(), "category".into()]);

    let table = Table::open_with_dictionary(&data, None, &dictionary).unwrap();
    assert_eq!(table.schema()[0].name.as_deref(), Some("id"));
    assert_eq!(table.column_type("id").unwrap(), ColumnType::Int);
    assert_eq!(table.column_type("colour").unwrap(), ColumnType::Category);
    assert_eq!(table.get_int_column("colour").unwrap(), vec![0, 1, 0]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Table::open(dir.path().join("absent.csv"), None),
        Err(TableError::Io(_))
    ));
}
