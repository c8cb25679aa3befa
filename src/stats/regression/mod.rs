//! Linear model fitting

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::stats::design::{build_design_matrix, DesignMatrix};
use crate::stats::distributions::t_two_sided_p;
use crate::stats::formula::{Formula, Term};
use crate::stats::solver::{conjugate_gradient, Qr};

/// Coefficient solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Solver {
    /// Householder QR
    #[default]
    Qr,
    /// Conjugate gradient on the normal equations with an iteration budget
    ConjugateGradient { max_iterations: usize, tolerance: f64 },
}

/// Options for [`fit_with`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Include the all-ones column
    pub intercept: bool,
    /// Reference level per categorical column; the first level otherwise
    pub reference_levels: IndexMap<String, String>,
    pub solver: Solver,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            intercept: true,
            reference_levels: IndexMap::new(),
            solver: Solver::Qr,
        }
    }
}

impl FitOptions {
    pub fn with_intercept(mut self, intercept: bool) -> Self {
        self.intercept = intercept;
        self
    }

    pub fn with_reference_level(mut self, column: impl Into<String>, level: impl Into<String>) -> Self {
        self.reference_levels.insert(column.into(), level.into());
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }
}

/// One row of the coefficient table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientSummary {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Fitted ordinary least-squares model
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    response: String,
    terms: Vec<Term>,
    intercept: bool,
    column_names: Vec<String>,
    column_terms: Vec<Option<usize>>,
    coefficients: Vec<f64>,
    std_errors: Vec<f64>,
    response_values: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    retained_rows: Vec<usize>,
    excluded_rows: usize,
    df_model: usize,
    df_residual: usize,
    rss: f64,
    tss: f64,
    sigma: f64,
    r_squared: f64,
    adj_r_squared: f64,
    leverage: Vec<f64>,
    effects: Vec<f64>,
}

/// Fit `response ~ terms` with an intercept and first-level references
pub fn fit(df: &DataFrame, response: &str, terms: &[Term]) -> Result<LinearModel> {
    fit_with(df, response, terms, &FitOptions::default())
}

/// Fit a parsed formula. The formula's intercept flag applies.
pub fn fit_formula(df: &DataFrame, formula: &Formula) -> Result<LinearModel> {
    fit_formula_with(df, formula, &FitOptions::default())
}

/// Fit a parsed formula with options; the intercept is kept only when both
/// the formula and the options ask for it
pub fn fit_formula_with(df: &DataFrame, formula: &Formula, options: &FitOptions) -> Result<LinearModel> {
    let options = FitOptions {
        intercept: options.intercept && formula.intercept,
        ..options.clone()
    };
    fit_with(df, &formula.response, &formula.terms, &options)
}

/// Fit `response ~ terms`
pub fn fit_with(
    df: &DataFrame,
    response: &str,
    terms: &[Term],
    options: &FitOptions,
) -> Result<LinearModel> {
    let design = build_design_matrix(df, response, terms, options)?;
    LinearModel::from_design(design, &options.solver)
}

impl LinearModel {
    /// Fit a prepared design matrix
    pub fn from_design(design: DesignMatrix, solver: &Solver) -> Result<LinearModel> {
        if design.response().iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "response '{}' has non-finite values",
                design.response_name()
            )));
        }
        if let Some(j) = design
            .columns()
            .iter()
            .position(|column| column.iter().any(|v| !v.is_finite()))
        {
            return Err(Error::InvalidInput(format!(
                "design column '{}' has non-finite values",
                design.column_names()[j]
            )));
        }

        let qr = Qr::decompose(design.columns()).map_err(|column| Error::SingularDesign {
            term: design.term_label(column),
            column: design.column_names()[column].clone(),
        })?;

        let n = design.nrows();
        let p = design.ncols();
        let y = design.response();

        let effects = qr.qt_mul(y);
        let coefficients = match solver {
            Solver::Qr => qr.solve_r(&effects[..p]),
            Solver::ConjugateGradient {
                max_iterations,
                tolerance,
            } => {
                let (b, iterations) =
                    conjugate_gradient(design.columns(), y, *max_iterations, *tolerance)?;
                log::debug!("conjugate gradient converged in {} iterations", iterations);
                b
            }
        };

        let fitted: Vec<f64> = (0..n)
            .map(|i| {
                design
                    .columns()
                    .iter()
                    .zip(&coefficients)
                    .map(|(col, b)| col[i] * b)
                    .sum()
            })
            .collect();
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        let intercept = design.has_intercept();
        let df_residual = n - p;
        let df_model = p - usize::from(intercept);
        let rss: f64 = residuals.iter().map(|r| r * r).sum();
        let tss: f64 = if intercept {
            let mean = y.iter().sum::<f64>() / n as f64;
            y.iter().map(|v| (v - mean).powi(2)).sum()
        } else {
            y.iter().map(|v| v * v).sum()
        };

        let sigma = if df_residual > 0 {
            (rss / df_residual as f64).sqrt()
        } else {
            f64::NAN
        };
        let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
        let adj_r_squared = if df_residual > 0 {
            let k = (n - usize::from(intercept)) as f64;
            1.0 - (1.0 - r_squared) * k / df_residual as f64
        } else {
            f64::NAN
        };
        let std_errors = qr
            .unscaled_variances()
            .iter()
            .map(|v| sigma * v.sqrt())
            .collect();

        log::info!(
            "fitted '{}' on {} rows with {} design columns (R² = {:.4})",
            design.response_name(),
            n,
            p,
            r_squared
        );

        Ok(LinearModel {
            response: design.response_name().to_string(),
            terms: design.terms().to_vec(),
            intercept,
            column_names: design.column_names().to_vec(),
            column_terms: design.column_terms().to_vec(),
            coefficients,
            std_errors,
            response_values: y.to_vec(),
            fitted,
            residuals,
            retained_rows: design.retained_rows().to_vec(),
            excluded_rows: design.excluded_rows(),
            df_model,
            df_residual,
            rss,
            tss,
            sigma,
            r_squared,
            adj_r_squared,
            leverage: qr.leverage(),
            effects,
        })
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn has_intercept(&self) -> bool {
        self.intercept
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Term index per design column, `None` for the intercept
    pub fn column_terms(&self) -> &[Option<usize>] {
        &self.column_terms
    }

    pub fn coefficient_values(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    /// Estimate for a design column by name
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.column_names
            .iter()
            .position(|c| c == name)
            .map(|j| self.coefficients[j])
    }

    /// Coefficient table with standard errors and two-sided t tests
    pub fn coefficients(&self) -> Vec<CoefficientSummary> {
        let df = self.df_residual as f64;
        self.column_names
            .iter()
            .zip(&self.coefficients)
            .zip(&self.std_errors)
            .map(|((name, &estimate), &std_error)| {
                let t_value = estimate / std_error;
                CoefficientSummary {
                    name: name.clone(),
                    estimate,
                    std_error,
                    t_value,
                    p_value: t_two_sided_p(t_value, df),
                }
            })
            .collect()
    }

    /// Prediction for one row of design values
    pub fn predict_design(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(Error::InvalidInput(format!(
                "expected {} design values, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }
        Ok(row.iter().zip(&self.coefficients).map(|(x, b)| x * b).sum())
    }

    /// Response values of the retained rows
    pub fn response_values(&self) -> &[f64] {
        &self.response_values
    }

    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Source row positions of the observations used
    pub fn retained_rows(&self) -> &[usize] {
        &self.retained_rows
    }

    pub fn excluded_rows(&self) -> usize {
        self.excluded_rows
    }

    pub fn nobs(&self) -> usize {
        self.fitted.len()
    }

    pub fn df_model(&self) -> usize {
        self.df_model
    }

    pub fn df_residual(&self) -> usize {
        self.df_residual
    }

    /// Residual sum of squares
    pub fn rss(&self) -> f64 {
        self.rss
    }

    /// Total sum of squares (about the mean when there is an intercept)
    pub fn tss(&self) -> f64 {
        self.tss
    }

    /// Residual standard error; NaN with zero residual degrees of freedom
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    pub fn adj_r_squared(&self) -> f64 {
        self.adj_r_squared
    }

    /// Hat-matrix diagonal
    pub fn leverage(&self) -> &[f64] {
        &self.leverage
    }

    /// Qᵀy from the QR factorization
    pub fn effects(&self) -> &[f64] {
        &self.effects
    }
}

impl fmt::Display for LinearModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.terms.iter().map(Term::label).collect();
        let rhs = if labels.is_empty() {
            "1".to_string()
        } else {
            labels.join(" + ")
        };
        writeln!(f, "Linear model: {} ~ {}", self.response, rhs)?;
        writeln!(
            f,
            "{:<24} {:>12} {:>12} {:>9} {:>10}",
            "", "Estimate", "Std. Error", "t value", "Pr(>|t|)"
        )?;
        for c in self.coefficients() {
            writeln!(
                f,
                "{:<24} {:>12.5} {:>12.5} {:>9.3} {:>10.4}",
                c.name, c.estimate, c.std_error, c.t_value, c.p_value
            )?;
        }
        writeln!(
            f,
            "Residual standard error: {:.4} on {} degrees of freedom",
            self.sigma, self.df_residual
        )?;
        if self.excluded_rows > 0 {
            writeln!(f, "({} observations deleted due to missingness)", self.excluded_rows)?;
        }
        writeln!(
            f,
            "R-squared: {:.4}, Adjusted R-squared: {:.4}",
            self.r_squared, self.adj_r_squared
        )
    }
}
