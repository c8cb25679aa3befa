//! Explicit column type conversions
//!
//! Nothing here runs implicitly. A conversion either rewrites the whole
//! column or fails without touching it.

use crate::column::{
    parse_numeric, parse_temporal, Categorical, ColumnData, ColumnType, LevelOrder,
};
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};

impl DataFrame {
    /// Re-parse every value of `column` as `target`.
    ///
    /// Values are rendered to text and parsed into a fresh buffer; the column
    /// is replaced only when every non-missing value parsed. The error names
    /// the first unparsable value and its row.
    pub fn coerce(&mut self, column: &str, target: ColumnType) -> Result<()> {
        let current = self.column(column)?;
        if current.column_type() == target {
            return Ok(());
        }

        if target == ColumnType::Categorical {
            return self.to_categorical(column);
        }
        let data = parse_column(column, &current.data().to_strings(), target)?;

        log::debug!("coerced column '{}' to {}", column, target);
        self.set_column_data(column, data)
    }

    /// Convert a column to Categorical with sorted levels
    pub fn to_categorical(&mut self, column: &str) -> Result<()> {
        self.to_categorical_with(column, LevelOrder::Sorted)
    }

    /// Convert a column to Categorical with the given level ordering.
    /// A column that is already Categorical is left as is.
    pub fn to_categorical_with(&mut self, column: &str, order: LevelOrder) -> Result<()> {
        let current = self.column(column)?;
        if current.column_type() == ColumnType::Categorical {
            return Ok(());
        }

        let strings = current.data().to_strings();
        let categorical = Categorical::from_values(&strings, order);
        if categorical.level_count() == self.row_count() && self.row_count() > 1 {
            log::warn!(
                "column '{}' has one level per row; it may be an identifier rather than a factor",
                column
            );
        }
        log::debug!(
            "column '{}' converted to categorical with {} levels",
            column,
            categorical.level_count()
        );
        self.set_column_data(column, ColumnData::Categorical(categorical))
    }

    /// Convert a Categorical column back to Text, substituting each row's
    /// level string. Other column types are rendered as text.
    pub fn to_text(&mut self, column: &str) -> Result<()> {
        self.coerce(column, ColumnType::Text)
    }

    /// Make `reference` the first level of a Categorical column
    pub fn relevel(&mut self, column: &str, reference: &str) -> Result<()> {
        let current = self.column(column)?;
        current.expect_type(&[ColumnType::Categorical], "categorical")?;
        let Some(mut categorical) = current.data().as_categorical().cloned() else {
            return Ok(());
        };
        categorical.relevel(reference)?;
        self.set_column_data(column, ColumnData::Categorical(categorical))
    }
}

/// Build storage of type `target` from text values. Categorical levels are
/// sorted.
pub(crate) fn parse_column(
    column: &str,
    strings: &[Option<String>],
    target: ColumnType,
) -> Result<ColumnData> {
    let data = match target {
        ColumnType::Numeric => ColumnData::Numeric(parse_all(column, strings, target, parse_numeric)?),
        ColumnType::Temporal => {
            ColumnData::Temporal(parse_all(column, strings, target, parse_temporal)?)
        }
        ColumnType::Text => ColumnData::Text(strings.to_vec()),
        ColumnType::Categorical => {
            ColumnData::Categorical(Categorical::from_values(strings, LevelOrder::Sorted))
        }
    };
    Ok(data)
}

fn parse_all<T>(
    column: &str,
    strings: &[Option<String>],
    target: ColumnType,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    strings
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            None => Ok(None),
            Some(s) => parse(s).map(Some).ok_or_else(|| Error::TypeCoercion {
                column: column.to_string(),
                row,
                value: s.clone(),
                target,
            }),
        })
        .collect()
}
