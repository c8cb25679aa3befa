mod common;

use common::tooth_growth;
use statframe::io::{read_csv_str, CsvReadOptions};
use statframe::{group_by, ungroup, Error, GroupKey, Value};

#[test]
fn test_groups_in_first_appearance_order() {
    let df = read_csv_str("x,y\n1,a\n2,b\n3,a\n", &CsvReadOptions::default()).unwrap();
    let partition = group_by(&df, &["y"]).unwrap();

    let keys: Vec<String> = partition.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["a", "b"]);

    let a = partition.get_by_str(&["a"]).unwrap();
    assert_eq!(
        a.column("x").unwrap().data().as_numeric().unwrap(),
        &[Some(1.0), Some(3.0)]
    );
    let b = partition.get(&GroupKey::from_strs(&["b"])).unwrap();
    assert_eq!(b.value(0, "x").unwrap(), Value::Numeric(2.0));
    assert_eq!(partition.row_indices(&GroupKey::from_strs(&["a"])).unwrap(), &[0, 2]);
}

#[test]
fn test_ungroup_restores_source_order() {
    let df = tooth_growth();
    let partition = df.group_by(&["supp", "dose"]).unwrap();
    assert_eq!(partition.len(), 6);
    assert!(partition.sizes().values().all(|&n| n == 2));

    let restored = ungroup(&partition).unwrap();
    assert_eq!(restored, df);

    // Concatenation keeps partition order instead
    let stacked = partition.concat().unwrap();
    assert_eq!(stacked.row_count(), df.row_count());
    assert_eq!(stacked.value(1, "len").unwrap(), Value::Numeric(11.5));
}

#[test]
fn test_group_means() {
    let df = tooth_growth();
    let partition = group_by(&df, &["supp"]).unwrap();
    let means = partition.mean("len").unwrap();
    let vc = means[&GroupKey::from_strs(&["VC"])].unwrap();
    assert!((vc - (4.2 + 16.5 + 23.6 + 11.5 + 16.5 + 18.5) / 6.0).abs() < 1e-12);

    assert!(matches!(
        partition.mean("supp"),
        Err(Error::ColumnTypeMismatch { .. })
    ));
}

#[test]
fn test_missing_keys_form_their_own_group() {
    let df = read_csv_str("k,v\na,1\n,2\na,3\nNA,4\n", &CsvReadOptions::default()).unwrap();
    let partition = group_by(&df, &["k"]).unwrap();
    assert_eq!(partition.len(), 2);
    let missing = GroupKey(vec![None]);
    assert_eq!(partition.row_indices(&missing).unwrap(), &[1, 3]);
    assert_eq!(missing.to_string(), "NA");
    assert_eq!(ungroup(&partition).unwrap(), df);
}

#[test]
fn test_invalid_keys() {
    let df = tooth_growth();
    assert!(matches!(group_by(&df, &[]), Err(Error::InvalidInput(_))));
    assert!(matches!(
        group_by(&df, &["nope"]),
        Err(Error::UnknownColumn(name)) if name == "nope"
    ));
}
