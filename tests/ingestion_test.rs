mod common;

use common::{init_logger, memory_fs};
use statframe::io::{
    read_csv, read_csv_str, write_csv, write_csv_string, CsvReadOptions, MemoryFileSystem,
};
use statframe::{ColumnType, Error, Value};

#[test]
fn test_infers_numeric_and_text() {
    init_logger();
    let df = read_csv_str("x,y\n1,a\n2,b\n3,a\n", &CsvReadOptions::default()).unwrap();

    assert_eq!(df.column_names(), vec!["x", "y"]);
    assert_eq!(df.column_type("x").unwrap(), ColumnType::Numeric);
    assert_eq!(df.column_type("y").unwrap(), ColumnType::Text);
    assert_eq!(
        df.column("x").unwrap().data().as_numeric().unwrap(),
        &[Some(1.0), Some(2.0), Some(3.0)]
    );
    assert_eq!(df.value(1, "y").unwrap(), Value::Text("b".to_string()));
}

#[test]
fn test_missing_tokens_and_all_missing_column() {
    let df = read_csv_str("a,b,c\n1,,NA\nNA,x,\n", &CsvReadOptions::default()).unwrap();
    assert_eq!(df.column_type("a").unwrap(), ColumnType::Numeric);
    assert!(df.value(1, "a").unwrap().is_missing());
    assert_eq!(df.column_type("b").unwrap(), ColumnType::Text);
    // Nothing present: numeric by default
    assert_eq!(df.column_type("c").unwrap(), ColumnType::Numeric);
    assert_eq!(df.column("c").unwrap().data().missing_count(), 2);
}

#[test]
fn test_malformed_row_reports_line() {
    let err = read_csv_str("a,b\n1,2\n3\n4,5\n", &CsvReadOptions::default()).unwrap_err();
    match err {
        Error::MalformedRow {
            line,
            expected,
            found,
        } => {
            assert_eq!(line, 3);
            assert_eq!(expected, 2);
            assert_eq!(found, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_header() {
    assert!(matches!(
        read_csv_str("a, a\n1,2\n", &CsvReadOptions::default()),
        Err(Error::DuplicateColumnName(name)) if name == "a"
    ));
}

#[test]
fn test_declared_types() {
    let options = CsvReadOptions::default()
        .with_column_type("code", ColumnType::Text)
        .with_column_type("grade", ColumnType::Categorical);
    let df = read_csv_str("code,grade\n007,b\n010,a\n", &options).unwrap();
    assert_eq!(df.value(0, "code").unwrap(), Value::Text("007".to_string()));
    let grade = df.column("grade").unwrap().data().as_categorical().unwrap();
    assert_eq!(grade.levels(), &["a", "b"]);

    let bad = CsvReadOptions::default().with_column_type("n", ColumnType::Numeric);
    assert!(matches!(
        read_csv_str("n\n1\nx\n", &bad),
        Err(Error::TypeCoercion { row: 1, .. })
    ));

    let unknown = CsvReadOptions::default().with_column_type("zzz", ColumnType::Numeric);
    assert!(matches!(
        read_csv_str("n\n1\n", &unknown),
        Err(Error::UnknownColumn(name)) if name == "zzz"
    ));
}

#[test]
fn test_tsv() {
    let df = read_csv_str("a\tb\n1\tx y\n", &CsvReadOptions::tsv()).unwrap();
    assert_eq!(df.value(0, "b").unwrap(), Value::Text("x y".to_string()));
}

#[test]
fn test_categorical_round_trip() {
    let mut df = read_csv_str("x,y\n1,a\n2,b\n3,a\n", &CsvReadOptions::default()).unwrap();
    let original = df.column("y").unwrap().clone();

    df.to_categorical("y").unwrap();
    assert_eq!(df.column_type("y").unwrap(), ColumnType::Categorical);
    // Already categorical: no-op
    df.to_categorical("y").unwrap();

    df.to_text("y").unwrap();
    assert_eq!(df.column("y").unwrap(), &original);
}

#[test]
fn test_coerce_leaves_column_untouched_on_failure() {
    let mut df = read_csv_str("v\n1\nabc\n3\n", &CsvReadOptions::default()).unwrap();
    let before = df.column("v").unwrap().clone();
    match df.coerce("v", ColumnType::Numeric).unwrap_err() {
        Error::TypeCoercion {
            column, row, value, ..
        } => {
            assert_eq!(column, "v");
            assert_eq!(row, 1);
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(df.column("v").unwrap(), &before);

    let mut dates = read_csv_str("d\n2024-01-05\n2024-02-10 08:30:00\n", &CsvReadOptions::default())
        .unwrap();
    dates.coerce("d", ColumnType::Temporal).unwrap();
    assert_eq!(dates.column_type("d").unwrap(), ColumnType::Temporal);
}

#[test]
fn test_read_through_provider_and_write_back() {
    let fs = memory_fs();
    let df = read_csv(&fs, "tooth_growth.csv", &CsvReadOptions::default()).unwrap();
    assert_eq!(df.row_count(), 12);
    assert!(matches!(
        read_csv(&fs, "absent.csv", &CsvReadOptions::default()),
        Err(Error::NotFound { name }) if name == "absent.csv"
    ));

    let mut out = MemoryFileSystem::new();
    let small = read_csv_str("a,b\n1,\n2,z\n", &CsvReadOptions::default()).unwrap();
    write_csv(&mut out, "clean.csv", &small, b',').unwrap();
    assert_eq!(out.get("clean.csv").unwrap(), b"a,b\n1,NA\n2,z\n");
    assert_eq!(write_csv_string(&small, b';').unwrap(), "a;b\n1;NA\n2;z\n");
}
