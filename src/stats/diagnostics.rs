//! Residual diagnostics for fitted models

use serde::Serialize;

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::stats::distributions::normal_quantile;
use crate::stats::regression::LinearModel;

/// Leverage this close to one leaves the standardized residual undefined
const LEVERAGE_LIMIT: f64 = 1e-12;

/// One observation's residual information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualPoint {
    /// Row position in the fitted frame
    pub row: usize,
    pub fitted: f64,
    pub residual: f64,
    /// Internally studentized residual, NaN when undefined
    pub standardized: f64,
    pub leverage: f64,
}

/// Normal Q-Q pair of a theoretical quantile and a sorted standardized residual
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QqPoint {
    pub theoretical: f64,
    pub sample: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalitySummary {
    /// Correlation between sample and theoretical quantiles
    pub qq_correlation: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
    pub max_abs_standardized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub residuals: Vec<ResidualPoint>,
    pub qq: Vec<QqPoint>,
    pub summary: NormalitySummary,
}

/// Plotting positions (i - a) / (n + 1 - 2a)
fn ppoints(n: usize) -> Vec<f64> {
    let a = if n <= 10 { 3.0 / 8.0 } else { 0.5 };
    (1..=n)
        .map(|i| (i as f64 - a) / (n as f64 + 1.0 - 2.0 * a))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    sxy / (sxx * syy).sqrt()
}

/// Residuals, Q-Q pairs and normality summary for a fitted model
pub fn diagnose(model: &LinearModel) -> Diagnostics {
    let sigma = model.sigma();
    let residuals: Vec<ResidualPoint> = model
        .retained_rows()
        .iter()
        .zip(model.fitted_values())
        .zip(model.residuals())
        .zip(model.leverage())
        .map(|(((&row, &fitted), &residual), &leverage)| {
            let room = 1.0 - leverage;
            let standardized = if room <= LEVERAGE_LIMIT || sigma.is_nan() || sigma <= 0.0 {
                f64::NAN
            } else {
                residual / (sigma * room.sqrt())
            };
            ResidualPoint {
                row,
                fitted,
                residual,
                standardized,
                leverage,
            }
        })
        .collect();

    // Rows with undefined standardized residuals stay out of the Q-Q set
    let mut sorted: Vec<f64> = residuals
        .iter()
        .map(|r| r.standardized)
        .filter(|v| !v.is_nan())
        .collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let qq: Vec<QqPoint> = ppoints(sorted.len())
        .into_iter()
        .zip(&sorted)
        .map(|(p, &sample)| QqPoint {
            theoretical: normal_quantile(p),
            sample,
        })
        .collect();

    let theoretical: Vec<f64> = qq.iter().map(|q| q.theoretical).collect();
    let raw = model.residuals();
    let n = raw.len() as f64;
    let m = mean(raw);
    let m2 = raw.iter().map(|r| (r - m).powi(2)).sum::<f64>() / n;
    let m3 = raw.iter().map(|r| (r - m).powi(3)).sum::<f64>() / n;
    let m4 = raw.iter().map(|r| (r - m).powi(4)).sum::<f64>() / n;

    let max_abs_standardized = sorted.iter().map(|v| v.abs()).fold(f64::NAN, f64::max);

    let summary = NormalitySummary {
        qq_correlation: correlation(&theoretical, &sorted),
        skewness: m3 / m2.powf(1.5),
        excess_kurtosis: m4 / (m2 * m2) - 3.0,
        max_abs_standardized,
    };
    log::debug!(
        "residual diagnostics for '{}': qq correlation {:.4}",
        model.response(),
        summary.qq_correlation
    );

    Diagnostics {
        residuals,
        qq,
        summary,
    }
}

impl Diagnostics {
    /// Frame with row, fitted, residual, standardized and leverage columns,
    /// ready for charting residuals against fitted values
    pub fn residual_frame(&self) -> Result<DataFrame> {
        let numeric_opt = |name: &str, f: fn(&ResidualPoint) -> f64| {
            Column::numeric_opt(
                name,
                self.residuals
                    .iter()
                    .map(|r| Some(f(r)).filter(|v| !v.is_nan()))
                    .collect(),
            )
        };
        DataFrame::from_columns(vec![
            Column::numeric("row", self.residuals.iter().map(|r| r.row as f64).collect()),
            numeric_opt("fitted", |r| r.fitted),
            numeric_opt("residual", |r| r.residual),
            numeric_opt("standardized", |r| r.standardized),
            numeric_opt("leverage", |r| r.leverage),
        ])
    }

    /// Frame with theoretical and sample quantile columns
    pub fn qq_frame(&self) -> Result<DataFrame> {
        DataFrame::from_columns(vec![
            Column::numeric("theoretical", self.qq.iter().map(|q| q.theoretical).collect()),
            Column::numeric("sample", self.qq.iter().map(|q| q.sample).collect()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::formula::Term;
    use crate::stats::regression::fit;

    fn model() -> LinearModel {
        let df = DataFrame::from_columns(vec![
            Column::numeric("x", (1..=8).map(f64::from).collect()),
            Column::numeric("y", vec![1.2, 1.9, 3.3, 3.8, 5.1, 6.2, 6.8, 8.1]),
        ])
        .unwrap();
        fit(&df, "y", &[Term::column("x")]).unwrap()
    }

    #[test]
    fn test_ppoints() {
        let small = ppoints(4);
        assert!((small[0] - (1.0 - 0.375) / 4.25).abs() < 1e-12);
        let large = ppoints(20);
        assert!((large[0] - 0.5 / 20.0).abs() < 1e-12);
        assert!((large[19] - 19.5 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_diagnostics_shape() {
        let model = model();
        let diag = diagnose(&model);
        assert_eq!(diag.residuals.len(), 8);
        assert_eq!(diag.qq.len(), 8);
        // Sample quantiles ascend
        assert!(diag.qq.windows(2).all(|w| w[0].sample <= w[1].sample));
        assert!(diag.qq.windows(2).all(|w| w[0].theoretical < w[1].theoretical));
        assert!(diag.summary.qq_correlation > 0.0 && diag.summary.qq_correlation <= 1.0);
        let total_leverage: f64 = diag.residuals.iter().map(|r| r.leverage).sum();
        assert!((total_leverage - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_frames() {
        let diag = diagnose(&model());
        let frame = diag.residual_frame().unwrap();
        assert_eq!(
            frame.column_names(),
            vec!["row", "fitted", "residual", "standardized", "leverage"]
        );
        assert_eq!(frame.row_count(), 8);
        assert_eq!(diag.qq_frame().unwrap().row_count(), 8);
    }
}
