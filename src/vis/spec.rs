//! Declarative chart specifications
//!
//! A [`ChartSpec`] borrows its table and records what to draw: channel
//! bindings, geometries and style. Drawing is left to a [`PlotBackend`].
//!
//! [`PlotBackend`]: crate::vis::PlotBackend

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnType, Value};
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::groupby::GroupPartition;

/// Mark drawn for each row or series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Point,
    Line,
    Boxplot,
    /// Least-squares line through each series
    Smooth,
}

/// Background and grid treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// White background with grid
    #[default]
    Classic,
    /// White background, no grid
    Minimal,
    /// Gray panel with white grid
    Gray,
}

/// Presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub theme: Theme,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    pub show_legend: bool,
    /// Series colors, cycled when there are more series than entries
    pub palette: Vec<(u8, u8, u8)>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        ChartStyle {
            title: None,
            x_label: None,
            y_label: None,
            theme: Theme::Classic,
            width: 800,
            height: 600,
            show_legend: true,
            palette: vec![
                (0, 123, 255),
                (255, 99, 71),
                (46, 204, 113),
                (255, 193, 7),
                (142, 68, 173),
                (52, 152, 219),
                (243, 156, 18),
                (211, 84, 0),
            ],
        }
    }
}

impl ChartStyle {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Palette entry for the `index`-th series
    pub fn color(&self, index: usize) -> (u8, u8, u8) {
        if self.palette.is_empty() {
            (0, 0, 0)
        } else {
            self.palette[index % self.palette.len()]
        }
    }
}

/// Column bound to each visual channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBindings {
    pub x: String,
    pub y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl ChannelBindings {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        ChannelBindings {
            x: x.into(),
            y: y.into(),
            color: None,
            group: None,
        }
    }

    pub fn with_color(mut self, column: impl Into<String>) -> Self {
        self.color = Some(column.into());
        self
    }

    pub fn with_group(mut self, column: impl Into<String>) -> Self {
        self.group = Some(column.into());
        self
    }

    /// Bound column names in channel order, without repeats
    pub fn columns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(4);
        let bound = [
            Some(self.x.as_str()),
            Some(self.y.as_str()),
            self.color.as_deref(),
            self.group.as_deref(),
        ];
        for name in bound.into_iter().flatten() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// A validated rendering request over a borrowed table
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec<'a> {
    data: &'a DataFrame,
    bindings: ChannelBindings,
    geometries: Vec<Geometry>,
    style: ChartStyle,
    facet: Option<String>,
}

#[derive(Serialize)]
struct ChartDocument<'s> {
    bindings: &'s ChannelBindings,
    geometries: &'s [Geometry],
    style: &'s ChartStyle,
    facet: Option<&'s str>,
    data: IndexMap<&'s str, Vec<Value>>,
}

const DISCRETE: &[ColumnType] = &[ColumnType::Categorical, ColumnType::Text];

/// Validate bindings against the table and assemble a chart specification
pub fn build_chart(
    df: &DataFrame,
    bindings: ChannelBindings,
    geometries: Vec<Geometry>,
    style: ChartStyle,
) -> Result<ChartSpec<'_>> {
    if geometries.is_empty() {
        return Err(Error::InvalidInput(
            "a chart needs at least one geometry".to_string(),
        ));
    }

    let x = df.column(&bindings.x)?;
    let y = df.column(&bindings.y)?;
    y.expect_type(&[ColumnType::Numeric], "numeric")?;

    let has = |g: Geometry| geometries.contains(&g);
    if has(Geometry::Boxplot) {
        if has(Geometry::Line) || has(Geometry::Smooth) {
            return Err(Error::InvalidInput(
                "boxplot cannot be combined with line or smooth geometries".to_string(),
            ));
        }
        x.expect_type(DISCRETE, "categorical or text")?;
    } else if has(Geometry::Line) || has(Geometry::Smooth) {
        x.expect_type(&[ColumnType::Numeric], "numeric")?;
    } else {
        x.expect_type(
            &[ColumnType::Numeric, ColumnType::Categorical, ColumnType::Text],
            "numeric, categorical or text",
        )?;
    }

    for name in [&bindings.color, &bindings.group].into_iter().flatten() {
        df.column(name)?.expect_type(DISCRETE, "categorical or text")?;
    }

    Ok(ChartSpec {
        data: df,
        bindings,
        geometries,
        style,
        facet: None,
    })
}

/// Point chart of two columns with axis labels taken from the column names
pub fn quick_look<'a>(df: &'a DataFrame, x: &str, y: &str) -> Result<ChartSpec<'a>> {
    let style = ChartStyle::default().with_labels(x, y);
    build_chart(df, ChannelBindings::new(x, y), vec![Geometry::Point], style)
}

/// One chart per group, in partition order, faceted by the group key
pub fn build_group_charts<'a>(
    partition: &'a GroupPartition,
    bindings: ChannelBindings,
    geometries: Vec<Geometry>,
    style: ChartStyle,
) -> Result<Vec<ChartSpec<'a>>> {
    partition
        .iter()
        .map(|(key, frame)| {
            let spec = build_chart(frame, bindings.clone(), geometries.clone(), style.clone())?;
            Ok(spec.with_facet(key.to_string()))
        })
        .collect()
}

impl<'a> ChartSpec<'a> {
    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = Some(facet.into());
        self
    }

    pub fn data(&self) -> &'a DataFrame {
        self.data
    }

    pub fn bindings(&self) -> &ChannelBindings {
        &self.bindings
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn has_geometry(&self, geometry: Geometry) -> bool {
        self.geometries.contains(&geometry)
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    pub fn facet(&self) -> Option<&str> {
        self.facet.as_deref()
    }

    /// Title, falling back to "y vs x" and the facet label
    pub fn display_title(&self) -> String {
        let base = self
            .style
            .title
            .clone()
            .unwrap_or_else(|| format!("{} vs {}", self.bindings.y, self.bindings.x));
        match &self.facet {
            Some(facet) => format!("{} [{}]", base, facet),
            None => base,
        }
    }

    pub fn x_label(&self) -> &str {
        self.style.x_label.as_deref().unwrap_or(&self.bindings.x)
    }

    pub fn y_label(&self) -> &str {
        self.style.y_label.as_deref().unwrap_or(&self.bindings.y)
    }

    /// Structured form for a backend. Bound columns are embedded in row order.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut data = IndexMap::new();
        for name in self.bindings.columns() {
            let column = self.data.column(name)?;
            let values = (0..column.len())
                .map(|row| column.data().value(row).unwrap_or(Value::Missing))
                .collect();
            data.insert(name, values);
        }

        let document = ChartDocument {
            bindings: &self.bindings,
            geometries: &self.geometries,
            style: &self.style,
            facet: self.facet.as_deref(),
            data,
        };
        Ok(serde_json::to_value(&document)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn frame() -> DataFrame {
        DataFrame::from_columns(vec![
            Column::numeric("x", vec![1.0, 2.0, 3.0]),
            Column::numeric("y", vec![2.0, 4.0, 5.0]),
            Column::text("g", &["a", "b", "a"]),
            Column::categorical("f", &["lo", "hi", "lo"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_unknown_column() {
        let df = frame();
        let err = build_chart(
            &df,
            ChannelBindings::new("x", "nope"),
            vec![Geometry::Point],
            ChartStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(name) if name == "nope"));
    }

    #[test]
    fn test_boxplot_needs_discrete_x() {
        let df = frame();
        let err = build_chart(
            &df,
            ChannelBindings::new("x", "y"),
            vec![Geometry::Boxplot],
            ChartStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ColumnTypeMismatch { column, .. } if column == "x"));

        assert!(build_chart(
            &df,
            ChannelBindings::new("f", "y"),
            vec![Geometry::Boxplot, Geometry::Point],
            ChartStyle::default(),
        )
        .is_ok());
    }

    #[test]
    fn test_color_must_be_discrete() {
        let df = frame();
        let err = build_chart(
            &df,
            ChannelBindings::new("x", "y").with_color("y"),
            vec![Geometry::Point],
            ChartStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ColumnTypeMismatch { .. }));
    }

    #[test]
    fn test_empty_geometry_list() {
        let df = frame();
        assert!(matches!(
            build_chart(&df, ChannelBindings::new("x", "y"), vec![], ChartStyle::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_json_is_deterministic() {
        let df = frame();
        let make = || {
            build_chart(
                &df,
                ChannelBindings::new("x", "y").with_color("g"),
                vec![Geometry::Point, Geometry::Smooth],
                ChartStyle::default().with_title("t"),
            )
            .unwrap()
        };
        let (a, b) = (make(), make());
        assert_eq!(a, b);
        assert_eq!(a.to_json_string().unwrap(), b.to_json_string().unwrap());

        let json = a.to_json().unwrap();
        assert_eq!(json["data"]["x"], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(json["data"]["g"], serde_json::json!(["a", "b", "a"]));
        assert_eq!(json["geometries"], serde_json::json!(["point", "smooth"]));
    }

    #[test]
    fn test_quick_look_labels() {
        let df = frame();
        let spec = quick_look(&df, "x", "y").unwrap();
        assert_eq!(spec.x_label(), "x");
        assert_eq!(spec.y_label(), "y");
        assert_eq!(spec.geometries(), &[Geometry::Point]);
    }
}
