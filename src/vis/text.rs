//! Terminal rendering of chart specifications
//!
//! Scatter, line and smooth layers share one character grid. Boxplots are
//! drawn as one horizontal row per category.

use crate::error::{Error, Result};
use crate::vis::backend::{OutputFormat, PlotBackend};
use crate::vis::geom::{least_squares, BoxStats, SeriesPoints};
use crate::vis::spec::{ChartSpec, Geometry};

const SERIES_MARKS: [char; 6] = ['*', 'o', '+', 'x', '#', '@'];
const LINE_MARK: char = '·';
const SMOOTH_MARK: char = '~';

/// Character-grid backend; produces UTF-8 text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBackend {
    // Plot area in characters and lines, at least 10 x 4
    width: usize,
    height: usize,
}

impl Default for TextBackend {
    fn default() -> Self {
        TextBackend {
            width: 60,
            height: 20,
        }
    }
}

impl TextBackend {
    pub fn new(width: usize, height: usize) -> Self {
        TextBackend {
            width: width.max(10),
            height: height.max(4),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Render to a string
    pub fn render_string(&self, spec: &ChartSpec<'_>) -> String {
        let mut output = String::new();
        output.push_str(&format!("{:^w$}\n\n", spec.display_title(), w = self.width + 8));

        if spec.has_geometry(Geometry::Boxplot) {
            output.push_str(&self.render_boxes(&spec.box_stats()));
        } else {
            output.push_str(&self.render_grid(spec));
        }
        output
    }

    fn render_grid(&self, spec: &ChartSpec<'_>) -> String {
        let series = spec.series();
        let all: Vec<(f64, f64)> = series.iter().flat_map(|s| s.points.iter().copied()).collect();
        if all.is_empty() {
            return String::from("No data to display\n");
        }

        let (width, height) = (self.width, self.height);
        let x_min = all.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let x_max = all.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let y_min = all.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let y_max = all.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let x_range = if (x_max - x_min).abs() < f64::EPSILON { 1.0 } else { x_max - x_min };
        let y_range = if (y_max - y_min).abs() < f64::EPSILON { 1.0 } else { y_max - y_min };

        let to_cell = |x: f64, y: f64| -> Option<(usize, usize)> {
            let px = ((x - x_min) / x_range * (width - 1) as f64).round();
            let py = ((y - y_min) / y_range * (height - 1) as f64).round();
            if px < 0.0 || py < 0.0 || px > (width - 1) as f64 || py > (height - 1) as f64 {
                return None;
            }
            Some((px as usize, py as usize))
        };

        let mut grid = vec![vec![' '; width]; height];
        let mut plot = |x: f64, y: f64, mark: char, overwrite: bool| {
            if let Some((px, py)) = to_cell(x, y) {
                if overwrite || grid[py][px] == ' ' {
                    grid[py][px] = mark;
                }
            }
        };

        // Connecting layers first so point marks stay visible on top
        for s in &series {
            if spec.has_geometry(Geometry::Line) {
                let mut sorted = s.points.clone();
                sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
                for pair in sorted.windows(2) {
                    trace_segment(pair[0], pair[1], x_range / (width - 1) as f64, |x, y| {
                        plot(x, y, LINE_MARK, false)
                    });
                }
            }
            if spec.has_geometry(Geometry::Smooth) {
                if let Some((a, b)) = least_squares(&s.points) {
                    let lo = s.points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
                    let hi = s.points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
                    trace_segment(
                        (lo, a + b * lo),
                        (hi, a + b * hi),
                        x_range / (width - 1) as f64,
                        |x, y| plot(x, y, SMOOTH_MARK, false),
                    );
                }
            }
        }
        for (i, s) in series.iter().enumerate() {
            if spec.has_geometry(Geometry::Point) || !spec.has_geometry(Geometry::Line) {
                for &(x, y) in &s.points {
                    plot(x, y, SERIES_MARKS[i % SERIES_MARKS.len()], true);
                }
            }
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", spec.y_label()));
        for row in (0..height).rev() {
            let y_val = y_min + (row as f64 / (height - 1) as f64) * y_range;
            output.push_str(&format!("{:>6.1} │", y_val));
            output.extend(grid[row].iter());
            output.push('\n');
        }
        output.push_str("       └");
        output.push_str(&"─".repeat(width));
        output.push('\n');

        match spec.x_categories() {
            Some(categories) => {
                output.push_str(&format!("        {}\n", categories.join("  ")));
            }
            None => {
                output.push_str(&format!(
                    "        {:<w$.1}{:>8.1}\n",
                    x_min,
                    x_max,
                    w = width.saturating_sub(8)
                ));
            }
        }
        output.push_str(&format!("{:^w$}\n", spec.x_label(), w = width + 8));

        if spec.style().show_legend && series.iter().any(|s| s.label.is_some()) {
            output.push_str(&legend(&series));
        }
        output
    }

    fn render_boxes(&self, stats: &[BoxStats]) -> String {
        if stats.is_empty() {
            return String::from("No data to display\n");
        }
        let extremes: Vec<f64> = stats
            .iter()
            .flat_map(|b| [b.lower_whisker, b.upper_whisker].into_iter().chain(b.outliers.iter().copied()))
            .collect();
        let lo = extremes.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = extremes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if (hi - lo).abs() < f64::EPSILON { 1.0 } else { hi - lo };
        let width = self.width;
        let col = |v: f64| {
            (((v - lo) / range) * (width - 1) as f64)
                .round()
                .clamp(0.0, (width - 1) as f64) as usize
        };
        let label_width = stats.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);

        let mut output = String::new();
        for b in stats {
            let mut line = vec![' '; width];
            for cell in line.iter_mut().take(col(b.upper_whisker) + 1).skip(col(b.lower_whisker)) {
                *cell = '─';
            }
            for cell in line.iter_mut().take(col(b.q3) + 1).skip(col(b.q1)) {
                *cell = '█';
            }
            line[col(b.median)] = '┃';
            for &o in &b.outliers {
                line[col(o)] = 'o';
            }
            output.push_str(&format!("{:>w$} │", b.label, w = label_width));
            output.extend(line);
            output.push_str(&format!("  median {:.2} (n={})\n", b.median, b.count));
        }
        output.push_str(&format!(
            "{:>w$} └{}\n{:>w$}  {:<v$.2}{:>8.2}\n",
            "",
            "─".repeat(width),
            "",
            lo,
            hi,
            w = label_width,
            v = width.saturating_sub(8)
        ));
        output
    }
}

fn legend(series: &[SeriesPoints]) -> String {
    let entries: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{} {}",
                SERIES_MARKS[i % SERIES_MARKS.len()],
                s.label.as_deref().unwrap_or("all")
            )
        })
        .collect();
    format!("Legend: {}\n", entries.join("  "))
}

/// Walk a segment in steps no wider than one cell
fn trace_segment(from: (f64, f64), to: (f64, f64), step: f64, mut visit: impl FnMut(f64, f64)) {
    let steps = if step > 0.0 {
        (((to.0 - from.0).abs() / step).ceil() as usize).max(1)
    } else {
        1
    };
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        visit(from.0 + t * (to.0 - from.0), from.1 + t * (to.1 - from.1));
    }
}

impl PlotBackend for TextBackend {
    fn render(&self, spec: &ChartSpec<'_>, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Text => Ok(self.render_string(spec).into_bytes()),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::dataframe::DataFrame;
    use crate::vis::spec::{build_chart, quick_look, ChannelBindings, ChartStyle};

    fn frame() -> DataFrame {
        DataFrame::from_columns(vec![
            Column::numeric("x", vec![1.0, 2.0, 3.0, 4.0]),
            Column::numeric("y", vec![1.0, 3.0, 2.0, 5.0]),
            Column::categorical("g", &["a", "b", "a", "b"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_scatter_text() {
        let df = frame();
        let spec = quick_look(&df, "x", "y").unwrap();
        let text = TextBackend::default().render_string(&spec);
        assert!(text.contains("y vs x"));
        assert_eq!(text.matches('*').count(), 4);
    }

    #[test]
    fn test_legend_lists_series() {
        let df = frame();
        let spec = build_chart(
            &df,
            ChannelBindings::new("x", "y").with_color("g"),
            vec![Geometry::Point, Geometry::Smooth],
            ChartStyle::default(),
        )
        .unwrap();
        let text = TextBackend::new(40, 10).render_string(&spec);
        assert!(text.contains("Legend: * a  o b"));
    }

    #[test]
    fn test_boxplot_rows() {
        let df = frame();
        let spec = build_chart(
            &df,
            ChannelBindings::new("g", "y"),
            vec![Geometry::Boxplot],
            ChartStyle::default().with_title("by group"),
        )
        .unwrap();
        let text = TextBackend::default().render_string(&spec);
        assert!(text.contains("by group"));
        assert!(text.contains("a │"));
        assert!(text.contains("(n=2)"));
    }

    #[test]
    fn test_size_clamped() {
        let backend = TextBackend::new(0, 0);
        assert_eq!((backend.width(), backend.height()), (10, 4));
        let df = frame();
        let spec = quick_look(&df, "x", "y").unwrap();
        assert_eq!(backend.render_string(&spec).matches('*').count(), 4);
    }

    #[test]
    fn test_svg_unsupported() {
        let df = frame();
        let spec = quick_look(&df, "x", "y").unwrap();
        assert!(matches!(
            TextBackend::default().render(&spec, OutputFormat::Svg),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
