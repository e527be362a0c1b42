use pdata_table::{ColumnType, ParseOptions, Table, TableError};
use pretty_assertions::assert_eq;

fn fruit() -> Table {
    Table::parse_str(
        "fruit\napple\npear\napple\n\nplum\n",
        &ParseOptions::csv().with_header(true),
    )
    .unwrap()
}

#[test]
fn converting_twice_changes_nothing() {
    let mut table = fruit();
    table.set_column_type("fruit", ColumnType::Category).unwrap();
    let labels = table.get_string_column("fruit").unwrap();
    let indices = table.get_int_column("fruit").unwrap();
    let dictionary_len = table.category_dictionary("fruit").unwrap().unwrap().len();

    table.set_column_type("fruit", ColumnType::Category).unwrap();
    assert_eq!(table.get_string_column("fruit").unwrap(), labels);
    assert_eq!(table.get_int_column("fruit").unwrap(), indices);
    assert_eq!(
        table.category_dictionary("fruit").unwrap().unwrap().len(),
        dictionary_len
    );
}

#[test]
fn indices_follow_first_appearance() {
    let mut table = fruit();
    table.set_column_type("fruit", ColumnType::Category).unwrap();
    assert_eq!(table.get_int_column("fruit").unwrap(), vec![0, 1, 0, 2, 3]);

    let dictionary = table.category_dictionary("fruit").unwrap().unwrap();
    assert_eq!(dictionary.label(1), Some("pear"));
    assert_eq!(dictionary.get("plum"), Some(3));
}

#[test]
fn category_round_trips_through_string() {
    let mut table = fruit();
    let before = table.get_string_column("fruit").unwrap();
    table.set_column_type("fruit", ColumnType::Category).unwrap();
    table.set_column_type("fruit", ColumnType::String).unwrap();
    assert_eq!(table.get_string_column("fruit").unwrap(), before);
}

#[test]
fn strict_int_writes_need_a_known_index() {
    let mut table = fruit();
    table.set_column_type("fruit", ColumnType::Category).unwrap();

    table.set_int(0, "fruit", 2).unwrap();
    assert_eq!(table.get_string(0, "fruit").unwrap().as_deref(), Some(""));

    let missing = table.missing_values().category;
    table.set_int(1, "fruit", missing).unwrap();
    assert_eq!(table.get_string(1, "fruit").unwrap(), None);

    assert!(matches!(
        table.set_int(2, "fruit", 40),
        Err(TableError::UnknownCategory { index: 40, .. })
    ));
}

#[test]
fn new_labels_extend_the_dictionary() {
    let mut table = Table::with_columns(&[("tag", ColumnType::Category)]);
    table.add_row_values(&["x".into()]);
    table.add_row_values(&["y".into()]);
    table.add_row_values(&["x".into()]);
    table.set_string(2, "tag", "z").unwrap();

    assert_eq!(table.get_int_column("tag").unwrap(), vec![0, 1, 2]);
    assert_eq!(table.unique("tag").unwrap(), vec!["x", "y", "z"]);
}

#[test]
fn dictionary_persists_as_lines() {
    let mut table = fruit();
    table.set_column_type("fruit", ColumnType::Category).unwrap();
    let dictionary = table.category_dictionary("fruit").unwrap().unwrap();

    let mut out = Vec::new();
    dictionary.write_to(&mut out).unwrap();
    let reread = pdata_table::CategoryDictionary::read_from(out.as_slice()).unwrap();
    assert_eq!(reread.len(), dictionary.len());
    assert_eq!(reread.get("pear"), dictionary.get("pear"));
}
