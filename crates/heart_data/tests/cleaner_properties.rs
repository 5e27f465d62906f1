use heartwise_data::{clean_dataset, RawTable};
use proptest::prelude::*;

const CATEGORICAL: [usize; 8] = [1, 2, 5, 6, 8, 10, 11, 12];

fn cell(column: usize) -> BoxedStrategy<Option<String>> {
    let value: BoxedStrategy<String> = if column == 13 {
        (0u8..5).prop_map(|t| t.to_string()).boxed()
    } else if CATEGORICAL.contains(&column) {
        prop_oneof![
            (0u8..8).prop_map(|v| format!("{v}.0")),
            prop::sample::select(vec!["fixed", "normal", "reversible"]).prop_map(String::from),
        ]
        .boxed()
    } else {
        (-50i32..400).prop_map(|v| (f64::from(v) / 10.0).to_string()).boxed()
    };
    prop_oneof![9 => value.prop_map(Some), 1 => Just(None)].boxed()
}

fn raw_row() -> impl Strategy<Value = Vec<Option<String>>> {
    (0..14).map(cell).collect::<Vec<_>>()
}

fn raw_table() -> impl Strategy<Value = RawTable> {
    prop::collection::vec(raw_row(), 0..40).prop_map(RawTable::new)
}

proptest! {
    #[test]
    fn cleaned_tables_are_complete(raw in raw_table()) {
        let clean = clean_dataset(&raw).unwrap();
        let complete = raw.rows.iter().filter(|r| r.iter().all(Option::is_some)).count();

        prop_assert_eq!(clean.len(), complete);
        prop_assert_eq!(clean.columns().len(), 14);
        for row in &clean.rows {
            prop_assert!(row.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn target_is_zero_only_for_zero(raw in raw_table()) {
        let clean = clean_dataset(&raw).unwrap();
        let expected: Vec<f64> = raw
            .rows
            .iter()
            .filter(|r| r.iter().all(Option::is_some))
            .map(|r| {
                let t: f64 = r[13].as_deref().unwrap().parse().unwrap();
                if t == 0.0 { 0.0 } else { 1.0 }
            })
            .collect();
        prop_assert_eq!(clean.column("target").unwrap(), expected);
    }

    #[test]
    fn cleaning_is_idempotent(raw in raw_table()) {
        let once = clean_dataset(&raw).unwrap();
        let twice = clean_dataset(&once.to_raw()).unwrap();
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn target_three_becomes_one() {
    let raw = RawTable::from_reader(
        "57,1,4,140,192,0,0,148,0,0.4,2,0,6,3\n".as_bytes(),
    )
    .unwrap();
    let clean = clean_dataset(&raw).unwrap();
    assert_eq!(clean.targets(), vec![1]);
}
