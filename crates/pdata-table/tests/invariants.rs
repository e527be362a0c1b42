use pdata_table::{ColumnType, Table, Value};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    AddColumn(ColumnType),
    RemoveColumn(usize),
    AddRow(Vec<i32>),
    InsertRow(usize, Vec<i32>),
    RemoveRow(usize),
    SetRowCount(usize),
    SetCell(usize, usize, i32),
    Convert(usize, ColumnType),
    Sort(usize, bool),
}

fn column_type() -> impl Strategy<Value = ColumnType> {
    proptest::sample::select(ColumnType::ALL.to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        column_type().prop_map(Op::AddColumn),
        (0usize..6).prop_map(Op::RemoveColumn),
        proptest::collection::vec(-3i32..3, 0..6).prop_map(Op::AddRow),
        (0usize..12, proptest::collection::vec(-3i32..3, 0..6))
            .prop_map(|(at, values)| Op::InsertRow(at, values)),
        (0usize..12).prop_map(Op::RemoveRow),
        (0usize..12).prop_map(Op::SetRowCount),
        (0usize..12, 0usize..6, -3i32..3).prop_map(|(r, c, v)| Op::SetCell(r, c, v)),
        (0usize..6, column_type()).prop_map(|(c, t)| Op::Convert(c, t)),
        (0usize..6, any::<bool>()).prop_map(|(c, rev)| Op::Sort(c, rev)),
    ]
}

fn apply(table: &mut Table, op: &Op) {
    let values = |v: &[i32]| v.iter().map(|&n| Value::from(n)).collect::<Vec<_>>();
    // Out-of-range indices are expected to fail cleanly; only the shape matters here.
    match op {
        Op::AddColumn(ty) => {
            table.add_column(None, *ty);
        }
        Op::RemoveColumn(col) => {
            let _ = table.remove_column(*col);
        }
        Op::AddRow(v) => {
            table.add_row_values(&values(v));
        }
        Op::InsertRow(at, v) => {
            let _ = table.insert_row(*at, &values(v));
        }
        Op::RemoveRow(row) => {
            let _ = table.remove_row(*row);
        }
        Op::SetRowCount(n) => table.set_row_count(*n),
        Op::SetCell(row, col, v) => {
            let _ = table.set_value(*row, *col, *v);
        }
        Op::Convert(col, ty) => {
            let _ = table.set_column_type(*col, *ty);
        }
        Op::Sort(col, reverse) => {
            let _ = table.sort(*col, *reverse);
        }
    }
}

fn assert_rectangular(table: &Table) {
    assert_eq!(table.column_types().len(), table.column_count());
    for col in 0..table.column_count() {
        assert_eq!(table.get_string_column(col).unwrap().len(), table.row_count());
        if table.row_count() > 0 {
            // Reads the last slot of the backing array directly.
            table.get_string(table.row_count() - 1, col).unwrap();
        }
    }
    let mut bytes = Vec::new();
    table.save_binary(&mut bytes).unwrap();
    let loaded = Table::load_binary(bytes.as_slice()).unwrap();
    assert_eq!(loaded.row_count(), table.row_count());
    assert_eq!(loaded.column_types(), table.column_types());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        .. ProptestConfig::default()
    })]

    #[test]
    fn every_column_tracks_the_row_count(ops in proptest::collection::vec(op(), 0..40)) {
        let mut table = Table::new();
        for op in &ops {
            apply(&mut table, op);
            assert_rectangular(&table);
        }
    }

    #[test]
    fn sort_moves_whole_rows(keys in proptest::collection::vec(-50i32..50, 0..40), reverse in any::<bool>()) {
        let mut table = Table::with_columns(&[
            ("key", ColumnType::Int),
            ("label", ColumnType::String),
            ("weight", ColumnType::Double),
        ]);
        for (i, &key) in keys.iter().enumerate() {
            table.add_row_values(&[key.into(), format!("row{i}").into(), (i as f64 * 0.5).into()]);
        }
        table.sort("key", reverse).unwrap();

        let mut seen = vec![false; keys.len()];
        let mut previous: Option<i32> = None;
        for row in table.rows() {
            let label = row.get_string("label").unwrap().unwrap();
            let original: usize = label.trim_start_matches("row").parse().unwrap();
            prop_assert!(!seen[original]);
            seen[original] = true;

            let key = row.get_int("key").unwrap();
            prop_assert_eq!(key, keys[original]);
            prop_assert_eq!(row.get_double("weight").unwrap(), original as f64 * 0.5);
            if let Some(prev) = previous {
                if reverse {
                    prop_assert!(prev >= key);
                } else {
                    prop_assert!(prev <= key);
                }
            }
            previous = Some(key);
        }
        prop_assert!(seen.into_iter().all(|s| s));
    }
}
