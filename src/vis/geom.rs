//! Drawable layers derived from a chart specification
//!
//! Backends call into this module instead of reading columns themselves, so
//! every backend agrees on axis mapping, series splitting and box statistics.

use indexmap::IndexMap;

use crate::column::{ColumnData, ColumnType};
use crate::vis::spec::ChartSpec;

/// Points of one series (one color/group value, or the whole table)
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoints {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
}

/// Five-number summary of one discrete x value
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub label: String,
    /// Position on the x axis (category index)
    pub position: f64,
    pub count: usize,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Sample quantile with linear interpolation between order statistics.
/// `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Intercept and slope of the least-squares line, `None` when x has no spread
pub fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    if sxx <= f64::EPSILON * n {
        return None;
    }
    let slope = sxy / sxx;
    Some((mean_y - slope * mean_x, slope))
}

impl<'a> ChartSpec<'a> {
    /// Category labels when x is discrete: level order for Categorical,
    /// sorted distinct values for Text
    pub fn x_categories(&self) -> Option<Vec<String>> {
        let column = self.data().column(&self.bindings().x).ok()?;
        match column.data() {
            ColumnData::Categorical(c) => Some(c.levels().to_vec()),
            ColumnData::Text(values) => {
                let mut distinct: Vec<String> = values.iter().flatten().cloned().collect();
                distinct.sort();
                distinct.dedup();
                Some(distinct)
            }
            _ => None,
        }
    }

    /// x position of every row; discrete x maps to the category index
    pub(crate) fn x_positions(&self) -> Vec<Option<f64>> {
        let Ok(column) = self.data().column(&self.bindings().x) else {
            return Vec::new();
        };
        match (column.data(), self.x_categories()) {
            (ColumnData::Numeric(values), _) => values.clone(),
            (data, Some(categories)) => (0..data.len())
                .map(|row| {
                    let value = data.value(row)?.render()?;
                    categories.iter().position(|c| *c == value).map(|i| i as f64)
                })
                .collect(),
            (data, None) => vec![None; data.len()],
        }
    }

    pub(crate) fn y_values(&self) -> Vec<Option<f64>> {
        self.data()
            .column(&self.bindings().y)
            .ok()
            .and_then(|c| c.data().as_numeric().map(<[Option<f64>]>::to_vec))
            .unwrap_or_default()
    }

    /// Series label per row from the color and group channels
    fn series_labels(&self) -> Vec<Option<String>> {
        let channels: Vec<&ColumnData> = [&self.bindings().color, &self.bindings().group]
            .into_iter()
            .flatten()
            .filter_map(|name| self.data().column(name).ok().map(|c| c.data()))
            .collect();
        (0..self.data().row_count())
            .map(|row| {
                if channels.is_empty() {
                    return None;
                }
                let parts: Vec<String> = channels
                    .iter()
                    .map(|data| {
                        data.value(row)
                            .and_then(|v| v.render())
                            .unwrap_or_else(|| "NA".to_string())
                    })
                    .collect();
                Some(parts.join(", "))
            })
            .collect()
    }

    /// Rows with present x and y, split into series in first-appearance order
    pub fn series(&self) -> Vec<SeriesPoints> {
        let xs = self.x_positions();
        let ys = self.y_values();
        let labels = self.series_labels();

        let mut series: IndexMap<Option<String>, Vec<(f64, f64)>> = IndexMap::new();
        for (row, label) in labels.into_iter().enumerate() {
            if let (Some(Some(x)), Some(Some(y))) = (xs.get(row), ys.get(row)) {
                series.entry(label).or_default().push((*x, *y));
            }
        }
        series
            .into_iter()
            .map(|(label, points)| SeriesPoints { label, points })
            .collect()
    }

    /// Box statistics per category, skipping categories with no y values
    pub fn box_stats(&self) -> Vec<BoxStats> {
        let Some(categories) = self.x_categories() else {
            return Vec::new();
        };
        let xs = self.x_positions();
        let ys = self.y_values();

        let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); categories.len()];
        for (x, y) in xs.iter().zip(&ys) {
            if let (Some(x), Some(y)) = (x, y) {
                buckets[*x as usize].push(*y);
            }
        }

        categories
            .into_iter()
            .zip(buckets)
            .enumerate()
            .filter(|(_, (_, values))| !values.is_empty())
            .map(|(index, (label, mut values))| {
                values.sort_by(f64::total_cmp);
                let q1 = quantile(&values, 0.25);
                let median = quantile(&values, 0.5);
                let q3 = quantile(&values, 0.75);
                let reach = 1.5 * (q3 - q1);
                let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);
                let inside = values.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
                let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
                let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
                let outliers = values
                    .iter()
                    .copied()
                    .filter(|v| *v < lo_fence || *v > hi_fence)
                    .collect();
                BoxStats {
                    label,
                    position: index as f64,
                    count: values.len(),
                    lower_whisker,
                    q1,
                    median,
                    q3,
                    upper_whisker,
                    outliers,
                }
            })
            .collect()
    }

    /// Whether x is drawn as categories
    pub fn x_is_discrete(&self) -> bool {
        self.data()
            .column_type(&self.bindings().x)
            .map(|t| matches!(t, ColumnType::Categorical | ColumnType::Text))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::dataframe::DataFrame;
    use crate::vis::spec::{build_chart, ChannelBindings, ChartStyle, Geometry};

    #[test]
    fn test_quantile() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.5), 2.5);
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 4.0);
    }

    #[test]
    fn test_least_squares() {
        let (a, b) = least_squares(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!((a - 1.0).abs() < 1e-12);
        assert!((b - 2.0).abs() < 1e-12);
        assert!(least_squares(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }

    #[test]
    fn test_series_split_by_color() {
        let df = DataFrame::from_columns(vec![
            Column::numeric_opt("x", vec![Some(1.0), Some(2.0), None, Some(4.0)]),
            Column::numeric("y", vec![1.0, 2.0, 3.0, 4.0]),
            Column::text("g", &["b", "a", "a", "b"]),
        ])
        .unwrap();
        let spec = build_chart(
            &df,
            ChannelBindings::new("x", "y").with_color("g"),
            vec![Geometry::Point],
            ChartStyle::default(),
        )
        .unwrap();
        let series = spec.series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label.as_deref(), Some("b"));
        assert_eq!(series[0].points, vec![(1.0, 1.0), (4.0, 4.0)]);
        assert_eq!(series[1].points, vec![(2.0, 2.0)]);
    }

    #[test]
    fn test_box_stats() {
        let df = DataFrame::from_columns(vec![
            Column::categorical("g", &["a", "a", "a", "a", "a", "b"]),
            Column::numeric("y", vec![1.0, 2.0, 3.0, 4.0, 100.0, 7.0]),
        ])
        .unwrap();
        let spec = build_chart(
            &df,
            ChannelBindings::new("g", "y"),
            vec![Geometry::Boxplot],
            ChartStyle::default(),
        )
        .unwrap();
        let stats = spec.box_stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].median, 3.0);
        assert_eq!(stats[0].outliers, vec![100.0]);
        assert_eq!(stats[0].upper_whisker, 4.0);
        assert_eq!(stats[1].position, 1.0);
        assert_eq!(stats[1].count, 1);
    }
}
