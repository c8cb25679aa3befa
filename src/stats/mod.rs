//! Statistical modelling
//!
//! Linear models over a [`DataFrame`](crate::DataFrame): formula terms,
//! design matrix construction, least-squares solvers, sequential ANOVA and
//! residual diagnostics.

pub mod anova;
pub mod design;
pub mod diagnostics;
pub mod distributions;
pub mod formula;
pub mod regression;
pub mod solver;

pub use anova::{anova, AnovaRow, AnovaTable};
pub use design::{build_design_matrix, DesignMatrix, INTERCEPT};
pub use diagnostics::{diagnose, Diagnostics, NormalitySummary, QqPoint, ResidualPoint};
pub use formula::{Formula, Term};
pub use regression::{
    fit, fit_formula, fit_formula_with, fit_with, CoefficientSummary, FitOptions, LinearModel,
    Solver,
};
