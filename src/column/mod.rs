//! Typed column storage
//!
//! A column's type is a runtime tag ([`ColumnType`]); its storage is the
//! matching [`ColumnData`] variant. `None` is the missing marker for every
//! type.

mod categorical;
mod parse;

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use categorical::{Categorical, LevelOrder};
pub use parse::{format_number, format_temporal, parse_numeric, parse_temporal};

/// Column type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Text,
    Categorical,
    Temporal,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Text => "text",
            ColumnType::Categorical => "categorical",
            ColumnType::Temporal => "temporal",
        };
        f.write_str(name)
    }
}

/// A single cell, resolved to a plain value. Categorical cells surface as
/// their level string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Numeric(f64),
    Text(String),
    Temporal(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text form of a present value, `None` for missing
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Numeric(v) => Some(format_number(*v)),
            Value::Text(s) => Some(s.clone()),
            Value::Temporal(t) => Some(format_temporal(t)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NA"),
        }
    }
}

/// Storage for one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Categorical(Categorical),
    Temporal(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Categorical(c) => c.len(),
            ColumnData::Temporal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Numeric(_) => ColumnType::Numeric,
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Categorical(_) => ColumnType::Categorical,
            ColumnData::Temporal(_) => ColumnType::Temporal,
        }
    }

    /// Whether the row holds the missing marker (out-of-range rows count as missing)
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Text(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Categorical(c) => c.get(row).is_none(),
            ColumnData::Temporal(v) => v.get(row).map_or(true, Option::is_none),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Cell value; `None` when `row` is out of range
    pub fn value(&self, row: usize) -> Option<Value> {
        if row >= self.len() {
            return None;
        }
        let value = match self {
            ColumnData::Numeric(v) => v[row].map_or(Value::Missing, Value::Numeric),
            ColumnData::Text(v) => v[row].clone().map_or(Value::Missing, Value::Text),
            ColumnData::Categorical(c) => c
                .get(row)
                .map_or(Value::Missing, |level| Value::Text(level.to_string())),
            ColumnData::Temporal(v) => v[row].map_or(Value::Missing, Value::Temporal),
        };
        Some(value)
    }

    /// Text form of every row, missing kept as `None`
    pub fn to_strings(&self) -> Vec<Option<String>> {
        match self {
            ColumnData::Numeric(v) => v.iter().map(|x| x.map(format_number)).collect(),
            ColumnData::Text(v) => v.clone(),
            ColumnData::Categorical(c) => c.to_strings(),
            ColumnData::Temporal(v) => v.iter().map(|t| t.as_ref().map(format_temporal)).collect(),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnData::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&Categorical> {
        match self {
            ColumnData::Categorical(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_temporal(&self) -> Option<&[Option<NaiveDateTime>]> {
        match self {
            ColumnData::Temporal(v) => Some(v),
            _ => None,
        }
    }

    /// Rows at the given positions. Positions must be in range.
    pub(crate) fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Categorical(c) => ColumnData::Categorical(c.take(rows)),
            ColumnData::Temporal(v) => ColumnData::Temporal(rows.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Append rows of the same type. Returns `false` (and leaves `self`
    /// untouched) when the types differ.
    pub(crate) fn append(&mut self, other: &ColumnData) -> bool {
        match (self, other) {
            (ColumnData::Numeric(a), ColumnData::Numeric(b)) => a.extend_from_slice(b),
            (ColumnData::Text(a), ColumnData::Text(b)) => a.extend(b.iter().cloned()),
            (ColumnData::Categorical(a), ColumnData::Categorical(b)) => a.append(b),
            (ColumnData::Temporal(a), ColumnData::Temporal(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    /// Numeric column without missing values
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Numeric(values.into_iter().map(Some).collect()))
    }

    pub fn numeric_opt(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    /// Text column without missing values
    pub fn text<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.iter().map(|s| Some(s.as_ref().to_string())).collect()),
        )
    }

    pub fn text_opt(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    /// Categorical column with sorted levels
    pub fn categorical<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        let values: Vec<Option<&str>> = values.iter().map(|s| Some(s.as_ref())).collect();
        Self::new(
            name,
            ColumnData::Categorical(Categorical::from_values(&values, LevelOrder::Sorted)),
        )
    }

    pub fn temporal(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnData::Temporal(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn data_mut(&mut self) -> &mut ColumnData {
        &mut self.data
    }

    pub(crate) fn set_data(&mut self, data: ColumnData) {
        self.data = data;
    }

    /// Fail with `ColumnTypeMismatch` unless the column has one of `allowed`
    pub(crate) fn expect_type(&self, allowed: &[ColumnType], expected: &str) -> Result<()> {
        if allowed.contains(&self.column_type()) {
            Ok(())
        } else {
            Err(Error::ColumnTypeMismatch {
                column: self.name.clone(),
                expected: expected.to_string(),
                found: self.column_type(),
            })
        }
    }
}
