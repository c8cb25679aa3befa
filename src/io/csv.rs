use csv::{ReaderBuilder, Trim, WriterBuilder};
use indexmap::IndexMap;

use crate::column::{parse_numeric, Column, ColumnData, ColumnType};
use crate::dataframe::{first_duplicate, parse_column, DataFrame};
use crate::error::{Error, Result};
use crate::io::fs::FileSystem;

/// Token written for missing values
pub const NA_TOKEN: &str = "NA";

/// Settings for reading delimited text
#[derive(Debug, Clone, PartialEq)]
pub struct CsvReadOptions {
    /// Field separator
    pub delimiter: u8,
    /// Field values read as missing
    pub na_values: Vec<String>,
    /// Strip surrounding whitespace from header names and fields
    pub trim: bool,
    /// Declared types; these columns skip inference
    pub column_types: IndexMap<String, ColumnType>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        CsvReadOptions {
            delimiter: b',',
            na_values: vec![String::new(), NA_TOKEN.to_string()],
            trim: true,
            column_types: IndexMap::new(),
        }
    }
}

impl CsvReadOptions {
    /// Tab separated input
    pub fn tsv() -> Self {
        CsvReadOptions::default().with_delimiter(b'\t')
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_na_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.na_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.column_types.insert(column.into(), column_type);
        self
    }

    fn is_na(&self, field: &str) -> bool {
        self.na_values.iter().any(|na| na == field)
    }
}

/// Parse delimited text into a DataFrame.
///
/// The first line is the header. Every following record must have as many
/// fields as the header; the error carries the 1-based line number.
pub fn read_csv_str(text: &str, options: &CsvReadOptions) -> Result<DataFrame> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(if options.trim { Trim::All } else { Trim::None })
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Ok(DataFrame::new());
    }
    if let Some(name) = first_duplicate(headers.iter().map(String::as_str)) {
        return Err(Error::DuplicateColumnName(name.to_string()));
    }
    if let Some(name) = options.column_types.keys().find(|name| !headers.contains(*name)) {
        return Err(Error::UnknownColumn(name.clone()));
    }

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        let record = result?;
        if record.len() != headers.len() {
            let line = record.position().map_or(0, |p| p.line() as usize);
            return Err(Error::MalformedRow {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }
        for (values, field) in raw.iter_mut().zip(record.iter()) {
            values.push(if options.is_na(field) {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    let mut df = DataFrame::new();
    for (name, values) in headers.iter().zip(raw) {
        let data = match options.column_types.get(name) {
            Some(&declared) => {
                log::debug!("column '{}' declared as {}", name, declared);
                parse_column(name, &values, declared)?
            }
            None => infer_column(values),
        };
        df.add_column(Column::new(name.as_str(), data))?;
    }

    log::debug!(
        "read {} rows with schema [{}]",
        df.row_count(),
        df.schema()
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(df)
}

/// Read a named source through the file system provider
pub fn read_csv(fs: &dyn FileSystem, name: &str, options: &CsvReadOptions) -> Result<DataFrame> {
    let text = fs.read(name)?;
    read_csv_str(&text, options)
}

/// Numeric when every present value parses as a number, otherwise Text.
/// Never promotes to Categorical or Temporal.
fn infer_column(values: Vec<Option<String>>) -> ColumnData {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|v| match v {
            None => Some(None),
            Some(s) => parse_numeric(s).map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) => ColumnData::Numeric(numbers),
        None => ColumnData::Text(values),
    }
}

/// Render a DataFrame as delimited text with a header line
pub fn write_csv_string(df: &DataFrame, delimiter: u8) -> Result<String> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    wtr.write_record(df.column_names())?;
    for row in 0..df.row_count() {
        let record: Vec<String> = df
            .columns()
            .iter()
            .map(|c| {
                c.data()
                    .value(row)
                    .and_then(|v| v.render())
                    .unwrap_or_else(|| NA_TOKEN.to_string())
            })
            .collect();
        wtr.write_record(&record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|err| Error::InvalidInput(format!("failed to flush CSV output: {}", err)))?;
    String::from_utf8(bytes).map_err(|err| Error::InvalidInput(err.to_string()))
}

/// Write a DataFrame as the named artifact
pub fn write_csv(
    fs: &mut dyn FileSystem,
    name: &str,
    df: &DataFrame,
    delimiter: u8,
) -> Result<()> {
    let text = write_csv_string(df, delimiter)?;
    fs.write(name, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fs::MemoryFileSystem;

    #[test]
    fn test_inference() {
        let df = read_csv_str("x,y\n1,a\n2,b\n3,a\n", &CsvReadOptions::default()).unwrap();
        assert_eq!(df.column_type("x").unwrap(), ColumnType::Numeric);
        assert_eq!(df.column_type("y").unwrap(), ColumnType::Text);
        assert_eq!(
            df.column("x").unwrap().data().as_numeric().unwrap(),
            &[Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_word_column_stays_text() {
        let df = read_csv_str("name,v\nNan,NaN\nInf,Inf\ninfinity,-Inf\n", &CsvReadOptions::default())
            .unwrap();
        assert_eq!(df.column_type("name").unwrap(), ColumnType::Text);
        assert_eq!(df.column_type("v").unwrap(), ColumnType::Numeric);
        let v = df.column("v").unwrap().data().as_numeric().unwrap();
        assert!(v[0].unwrap().is_nan());
        assert_eq!(v[2], Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_na_tokens() {
        let df = read_csv_str("x,y\n1,NA\n,b\n", &CsvReadOptions::default()).unwrap();
        assert_eq!(df.column("x").unwrap().data().as_numeric().unwrap(), &[Some(1.0), None]);
        assert_eq!(df.column("y").unwrap().data().missing_count(), 1);
    }

    #[test]
    fn test_all_missing_is_numeric() {
        let df = read_csv_str("x,y\nNA,1\n,2\n", &CsvReadOptions::default()).unwrap();
        assert_eq!(df.column_type("x").unwrap(), ColumnType::Numeric);
    }

    #[test]
    fn test_malformed_row_line() {
        let err = read_csv_str("a,b\n1,2\n3\n", &CsvReadOptions::default()).unwrap_err();
        match err {
            Error::MalformedRow { line, expected, found } => {
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
        let opts = CsvReadOptions::default()
            .with_column_type("id", ColumnType::Text)
            .with_column_type("g", ColumnType::Categorical)
            .with_column_type("d", ColumnType::Temporal);
        let df = read_csv_str("id,g,d\n007,b,2024-01-01\n010,a,2024-01-02\n", &opts).unwrap();
        assert_eq!(df.value(0, "id").unwrap().to_string(), "007");
        assert_eq!(df.column_type("g").unwrap(), ColumnType::Categorical);
        assert_eq!(df.column_type("d").unwrap(), ColumnType::Temporal);

        let bad = CsvReadOptions::default().with_column_type("g", ColumnType::Numeric);
        assert!(matches!(
            read_csv_str("g\n1\nx\n", &bad),
            Err(Error::TypeCoercion { row: 1, .. })
        ));

        let missing = CsvReadOptions::default().with_column_type("z", ColumnType::Numeric);
        assert!(matches!(read_csv_str("g\n1\n", &missing), Err(Error::UnknownColumn(_))));
    }

    #[test]
    fn test_tsv_and_write_back() {
        let df = read_csv_str("x\ty\n1.5\tNA\n2\tq\n", &CsvReadOptions::tsv()).unwrap();
        let text = write_csv_string(&df, b',').unwrap();
        assert_eq!(text, "x,y\n1.5,NA\n2,q\n");

        let mut fs = MemoryFileSystem::new();
        write_csv(&mut fs, "out.csv", &df, b',').unwrap();
        let back = read_csv(&fs, "out.csv", &CsvReadOptions::default()).unwrap();
        assert_eq!(back, df);
    }

    #[test]
    fn test_header_only() {
        let df = read_csv_str("a,b\n", &CsvReadOptions::default()).unwrap();
        assert_eq!(df.column_count(), 2);
        assert_eq!(df.row_count(), 0);
    }
}
