//! Design matrix construction
//!
//! Turns a response column and a term list into a numeric matrix. Rows with
//! a missing or non-finite response or predictor are dropped; the count is
//! kept.

use crate::column::{ColumnData, ColumnType};
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::stats::formula::Term;
use crate::stats::regression::FitOptions;

// NaN and infinite numbers count as missing
fn is_usable(data: &ColumnData, row: usize) -> bool {
    match data {
        ColumnData::Numeric(values) => values
            .get(row)
            .copied()
            .flatten()
            .map_or(false, f64::is_finite),
        other => !other.is_missing(row),
    }
}

/// Name of the all-ones design column
pub const INTERCEPT: &str = "(Intercept)";

/// Numeric model matrix with provenance for every column
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    response_name: String,
    terms: Vec<Term>,
    column_names: Vec<String>,
    // Index into `terms`; None for the intercept
    column_terms: Vec<Option<usize>>,
    // Column-major values, one Vec per design column
    columns: Vec<Vec<f64>>,
    response: Vec<f64>,
    retained_rows: Vec<usize>,
    excluded_rows: usize,
}

impl DesignMatrix {
    pub fn response_name(&self) -> &str {
        &self.response_name
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_terms(&self) -> &[Option<usize>] {
        &self.column_terms
    }

    /// Term label a design column came from, `(Intercept)` for the intercept
    pub fn term_label(&self, column: usize) -> String {
        match self.column_terms.get(column).copied().flatten() {
            Some(t) => self.terms[t].label(),
            None => INTERCEPT.to_string(),
        }
    }

    pub fn has_intercept(&self) -> bool {
        self.column_terms.iter().any(Option::is_none)
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn column(&self, j: usize) -> Option<&[f64]> {
        self.columns.get(j).map(Vec::as_slice)
    }

    /// One observation across all design columns
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.nrows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[i]).collect())
    }

    pub fn response(&self) -> &[f64] {
        &self.response
    }

    /// Source row positions of the retained observations
    pub fn retained_rows(&self) -> &[usize] {
        &self.retained_rows
    }

    pub fn excluded_rows(&self) -> usize {
        self.excluded_rows
    }

    pub fn nrows(&self) -> usize {
        self.response.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }
}

/// Expansion of one predictor over the retained rows
struct Expansion {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

/// Build the design matrix for `response ~ terms`.
///
/// Numeric columns contribute one design column. Categorical columns
/// contribute one indicator per level except the reference level (the first
/// level unless `options.reference_levels` names another). Interactions
/// multiply every combination of their constituents' columns.
pub fn build_design_matrix(
    df: &DataFrame,
    response: &str,
    terms: &[Term],
    options: &FitOptions,
) -> Result<DesignMatrix> {
    let response_column = df.column(response)?;
    response_column.expect_type(&[ColumnType::Numeric], "numeric")?;

    // Validate every predictor before touching rows
    let mut predictors: Vec<&str> = Vec::new();
    for term in terms {
        for name in term.columns() {
            let column = df.column(name)?;
            column.expect_type(
                &[ColumnType::Numeric, ColumnType::Categorical],
                "numeric or categorical",
            )?;
            if let ColumnData::Categorical(c) = column.data() {
                if c.level_count() < 2 {
                    return Err(Error::SingularDesign {
                        term: term.label(),
                        column: name.to_string(),
                    });
                }
            }
            if !predictors.contains(&name) {
                predictors.push(name);
            }
        }
    }

    let retained_rows: Vec<usize> = (0..df.row_count())
        .filter(|&row| {
            is_usable(response_column.data(), row)
                && predictors
                    .iter()
                    .all(|name| df.column(name).map_or(false, |c| is_usable(c.data(), row)))
        })
        .collect();
    let excluded_rows = df.row_count() - retained_rows.len();
    if excluded_rows > 0 {
        log::info!(
            "excluded {} of {} rows with missing or non-finite values in '{}' or its predictors",
            excluded_rows,
            df.row_count(),
            response
        );
    }
    if retained_rows.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no complete rows to fit '{}'",
            response
        )));
    }

    let y: Vec<f64> = match response_column.data() {
        ColumnData::Numeric(values) => retained_rows
            .iter()
            .map(|&row| values[row].unwrap_or(f64::NAN))
            .collect(),
        _ => Vec::new(),
    };

    let n = retained_rows.len();
    let mut column_names = Vec::new();
    let mut column_terms = Vec::new();
    let mut columns = Vec::new();

    if options.intercept {
        column_names.push(INTERCEPT.to_string());
        column_terms.push(None);
        columns.push(vec![1.0; n]);
    }

    for (t, term) in terms.iter().enumerate() {
        let mut product: Option<Expansion> = None;
        for name in term.columns() {
            let expansion = expand_column(df, name, &retained_rows, options)?;
            product = Some(match product {
                None => expansion,
                Some(acc) => interact(&acc, &expansion),
            });
        }
        if let Some(expansion) = product {
            for (name, values) in expansion.names.into_iter().zip(expansion.columns) {
                column_names.push(name);
                column_terms.push(Some(t));
                columns.push(values);
            }
        }
    }

    if columns.is_empty() {
        return Err(Error::InvalidInput(
            "model has no design columns".to_string(),
        ));
    }

    log::debug!(
        "design matrix for '{}': {} rows x {} columns",
        response,
        n,
        columns.len()
    );

    Ok(DesignMatrix {
        response_name: response.to_string(),
        terms: terms.to_vec(),
        column_names,
        column_terms,
        columns,
        response: y,
        retained_rows,
        excluded_rows,
    })
}

fn expand_column(
    df: &DataFrame,
    name: &str,
    rows: &[usize],
    options: &FitOptions,
) -> Result<Expansion> {
    let column = df.column(name)?;
    match column.data() {
        ColumnData::Numeric(values) => Ok(Expansion {
            names: vec![name.to_string()],
            columns: vec![rows.iter().map(|&r| values[r].unwrap_or(f64::NAN)).collect()],
        }),
        ColumnData::Categorical(c) => {
            let reference = match options.reference_levels.get(name) {
                Some(level) => c.level_index(level).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "reference level '{}' is not a level of '{}'",
                        level, name
                    ))
                })?,
                None => 0,
            };
            let codes = c.codes();
            let mut names = Vec::new();
            let mut columns = Vec::new();
            for (level_idx, level) in c.levels().iter().enumerate() {
                if level_idx == reference {
                    continue;
                }
                names.push(format!("{}[{}]", name, level));
                columns.push(
                    rows.iter()
                        .map(|&r| {
                            if codes[r] == Some(level_idx as u32) {
                                1.0
                            } else {
                                0.0
                            }
                        })
                        .collect(),
                );
            }
            Ok(Expansion { names, columns })
        }
        _ => Err(Error::ColumnTypeMismatch {
            column: name.to_string(),
            expected: "numeric or categorical".to_string(),
            found: column.column_type(),
        }),
    }
}

/// Row-wise products of every pair of columns; the left factor varies fastest
fn interact(left: &Expansion, right: &Expansion) -> Expansion {
    let mut names = Vec::with_capacity(left.names.len() * right.names.len());
    let mut columns = Vec::with_capacity(names.capacity());
    for (rname, rcol) in right.names.iter().zip(&right.columns) {
        for (lname, lcol) in left.names.iter().zip(&left.columns) {
            names.push(format!("{}:{}", lname, rname));
            columns.push(lcol.iter().zip(rcol).map(|(a, b)| a * b).collect());
        }
    }
    Expansion { names, columns }
}
