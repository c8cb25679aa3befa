use std::collections::HashSet;
use std::fmt;

use crate::column::{Column, ColumnData, ColumnType, Value};
use crate::error::{Error, Result};

/// Rows shown by the `Display` rendering
const DISPLAY_ROWS: usize = 10;

/// Typed table: uniquely named columns of equal length.
///
/// Every constructor and mutator validates before committing, so a frame
/// with mismatched column lengths never exists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Create an empty DataFrame
    pub fn new() -> Self {
        DataFrame::default()
    }

    /// Create a DataFrame from columns, checking names and lengths
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut df = DataFrame::new();
        for column in columns {
            df.add_column(column)?;
        }
        Ok(df)
    }

    /// Append a column. The first column fixes the row count.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(column.name()) {
            return Err(Error::DuplicateColumnName(column.name().to_string()));
        }
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: self.row_count,
                found: column.len(),
            });
        }

        if self.columns.is_empty() {
            self.row_count = column.len();
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replace the column with the same name, keeping its position
    pub fn replace_column(&mut self, column: Column) -> Result<()> {
        let idx = self.column_index(column.name())?;
        if column.len() != self.row_count {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: self.row_count,
                found: column.len(),
            });
        }
        self.columns[idx] = column;
        Ok(())
    }

    /// Remove a column and return it
    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let idx = self.column_index(name)?;
        let column = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.row_count = 0;
        }
        Ok(column)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        Ok(self.column(name)?.column_type())
    }

    /// Name and type of every column, in order
    pub fn schema(&self) -> Vec<(&str, ColumnType)> {
        self.columns
            .iter()
            .map(|c| (c.name(), c.column_type()))
            .collect()
    }

    pub(crate) fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Swap in new storage for a column. The length must match.
    pub(crate) fn set_column_data(&mut self, name: &str, data: ColumnData) -> Result<()> {
        let idx = self.column_index(name)?;
        if data.len() != self.row_count {
            return Err(Error::LengthMismatch {
                column: name.to_string(),
                expected: self.row_count,
                found: data.len(),
            });
        }
        self.columns[idx].set_data(data);
        Ok(())
    }

    /// Single cell
    pub fn value(&self, row: usize, column: &str) -> Result<Value> {
        self.column(column)?
            .data()
            .value(row)
            .ok_or_else(|| self.row_out_of_range(row))
    }

    /// One row as values in column order
    pub fn row(&self, row: usize) -> Result<Vec<Value>> {
        if row >= self.row_count {
            return Err(self.row_out_of_range(row));
        }
        Ok(self
            .columns
            .iter()
            .map(|c| c.data().value(row).unwrap_or(Value::Missing))
            .collect())
    }

    fn row_out_of_range(&self, row: usize) -> Error {
        Error::InvalidInput(format!(
            "row {} is out of range for {} rows",
            row, self.row_count
        ))
    }

    /// New DataFrame with the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<DataFrame> {
        let columns = names
            .iter()
            .map(|name| self.column(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        DataFrame::from_columns(columns)
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> DataFrame {
        let rows: Vec<usize> = (0..n.min(self.row_count)).collect();
        self.take_unchecked(&rows)
    }

    /// New DataFrame holding the rows at the given positions, in that order
    pub fn take_rows(&self, rows: &[usize]) -> Result<DataFrame> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.row_count) {
            return Err(self.row_out_of_range(bad));
        }
        Ok(self.take_unchecked(rows))
    }

    pub(crate) fn take_unchecked(&self, rows: &[usize]) -> DataFrame {
        DataFrame {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name(), c.data().take(rows)))
                .collect(),
            row_count: rows.len(),
        }
    }

    /// Append the rows of a DataFrame with the same column names and types
    pub fn append(&mut self, other: &DataFrame) -> Result<()> {
        if self.columns.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        if other.columns.is_empty() {
            return Ok(());
        }

        if self.columns.len() != other.columns.len() {
            return Err(Error::InvalidInput(format!(
                "cannot append {} columns to {} columns",
                other.columns.len(),
                self.columns.len()
            )));
        }
        for (mine, theirs) in self.columns.iter().zip(&other.columns) {
            if mine.name() != theirs.name() {
                return Err(Error::UnknownColumn(theirs.name().to_string()));
            }
            if mine.column_type() != theirs.column_type() {
                return Err(Error::ColumnTypeMismatch {
                    column: theirs.name().to_string(),
                    expected: mine.column_type().to_string(),
                    found: theirs.column_type(),
                });
            }
        }

        for (mine, theirs) in self.columns.iter_mut().zip(&other.columns) {
            mine.data_mut().append(theirs.data());
        }
        self.row_count += other.row_count;
        Ok(())
    }

    /// Stack DataFrames vertically
    pub fn concat(frames: &[DataFrame]) -> Result<DataFrame> {
        let mut result = DataFrame::new();
        for frame in frames {
            result.append(frame)?;
        }
        Ok(result)
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DataFrame: {} rows x {} columns",
            self.row_count,
            self.columns.len()
        )?;
        if self.columns.is_empty() {
            return Ok(());
        }

        let shown = self.row_count.min(DISPLAY_ROWS);
        let mut cells: Vec<Vec<String>> = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let mut col_cells = vec![
                column.name().to_string(),
                format!("<{}>", column.column_type()),
            ];
            col_cells.extend(
                (0..shown).map(|row| column.data().value(row).unwrap_or(Value::Missing).to_string()),
            );
            cells.push(col_cells);
        }

        let widths: Vec<usize> = cells
            .iter()
            .map(|c| c.iter().map(|s| s.chars().count()).max().unwrap_or(0))
            .collect();

        for line in 0..shown + 2 {
            let rendered: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{:>w$}", c[line], w = w))
                .collect();
            writeln!(f, "{}", rendered.join("  "))?;
        }

        if self.row_count > shown {
            writeln!(f, "... {} more rows", self.row_count - shown)?;
        }
        Ok(())
    }
}

/// Column names must be unique; returns the first duplicate
pub(crate) fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}
