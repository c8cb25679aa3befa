//! Sequential (type I) analysis of variance
//!
//! Each term's sum of squares is the reduction in residual sum of squares
//! from adding it after the terms before it. With a QR fit that is the sum
//! of the squared effects belonging to the term's design columns.

use std::fmt;

use serde::Serialize;

use crate::stats::distributions::f_survival;
use crate::stats::regression::LinearModel;

/// One line of an ANOVA table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaRow {
    pub term: String,
    pub df: usize,
    pub sum_sq: f64,
    pub mean_sq: f64,
    /// `None` for the residual row or when there are no residual degrees of freedom
    pub f_value: Option<f64>,
    pub p_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaTable {
    pub response: String,
    pub rows: Vec<AnovaRow>,
    pub residual: AnovaRow,
}

impl AnovaTable {
    /// Row for a term label such as `a` or `a:b`
    pub fn row(&self, term: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.term == term)
    }

    /// Sum of the term sums of squares plus the residual
    pub fn total_sum_sq(&self) -> f64 {
        self.rows.iter().map(|r| r.sum_sq).sum::<f64>() + self.residual.sum_sq
    }
}

/// Type I ANOVA table for a fitted model
pub fn anova(model: &LinearModel) -> AnovaTable {
    let effects = model.effects();
    let df_residual = model.df_residual();
    let residual_ms = if df_residual > 0 {
        model.rss() / df_residual as f64
    } else {
        f64::NAN
    };

    let rows = model
        .terms()
        .iter()
        .enumerate()
        .map(|(t, term)| {
            let (df, sum_sq) = model
                .column_terms()
                .iter()
                .enumerate()
                .filter(|(_, owner)| **owner == Some(t))
                .fold((0usize, 0.0f64), |(df, ss), (j, _)| (df + 1, ss + effects[j] * effects[j]));
            let mean_sq = sum_sq / df as f64;
            let (f_value, p_value) = if df_residual > 0 {
                let f = mean_sq / residual_ms;
                (Some(f), Some(f_survival(f, df as f64, df_residual as f64)))
            } else {
                (None, None)
            };
            AnovaRow {
                term: term.label(),
                df,
                sum_sq,
                mean_sq,
                f_value,
                p_value,
            }
        })
        .collect();

    AnovaTable {
        response: model.response().to_string(),
        rows,
        residual: AnovaRow {
            term: "Residuals".to_string(),
            df: df_residual,
            sum_sq: model.rss(),
            mean_sq: residual_ms,
            f_value: None,
            p_value: None,
        },
    }
}

impl fmt::Display for AnovaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis of Variance Table")?;
        writeln!(f, "Response: {}", self.response)?;
        writeln!(
            f,
            "{:<16} {:>4} {:>12} {:>12} {:>9} {:>10}",
            "", "Df", "Sum Sq", "Mean Sq", "F value", "Pr(>F)"
        )?;
        for row in self.rows.iter().chain(std::iter::once(&self.residual)) {
            let f_text = row.f_value.map_or_else(String::new, |v| format!("{:.4}", v));
            let p_text = row.p_value.map_or_else(String::new, |v| format!("{:.4e}", v));
            writeln!(
                f,
                "{:<16} {:>4} {:>12.4} {:>12.4} {:>9} {:>10}",
                row.term, row.df, row.sum_sq, row.mean_sq, f_text, p_text
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::dataframe::DataFrame;
    use crate::stats::formula::Term;
    use crate::stats::regression::fit;

    #[test]
    fn test_one_way_matches_hand_computation() {
        // Group means 2, 5, 8; grand mean 5
        let mut df = DataFrame::from_columns(vec![
            Column::numeric("y", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]),
            Column::text("g", &["a", "a", "a", "b", "b", "b", "c", "c", "c"]),
        ])
        .unwrap();
        df.to_categorical("g").unwrap();
        let model = fit(&df, "y", &[Term::column("g")]).unwrap();
        let table = anova(&model);

        let g = table.row("g").unwrap();
        assert_eq!(g.df, 2);
        // 3 * (9 + 0 + 9)
        assert!((g.sum_sq - 54.0).abs() < 1e-9);
        assert_eq!(table.residual.df, 6);
        assert!((table.residual.sum_sq - 6.0).abs() < 1e-9);
        assert!((g.f_value.unwrap() - 27.0).abs() < 1e-9);
        assert!(g.p_value.unwrap() < 0.001);
        assert!((table.total_sum_sq() - model.tss()).abs() < 1e-9);
        assert!(table.to_string().contains("Residuals"));
    }
}
