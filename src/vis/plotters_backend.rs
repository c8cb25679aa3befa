//! SVG rendering through `plotters`
//!
//! The drawing area writes into an in-memory string, so nothing touches the
//! file system until [`save_chart`](crate::vis::save_chart) hands the bytes
//! to a provider.

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::vis::backend::{OutputFormat, PlotBackend};
use crate::vis::geom::least_squares;
use crate::vis::spec::{ChartSpec, Geometry, Theme};

/// `plotters` adapter producing SVG documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlottersBackend;

impl PlottersBackend {
    pub fn new() -> Self {
        PlottersBackend
    }

    /// Render to an SVG document
    pub fn render_svg(&self, spec: &ChartSpec<'_>) -> Result<String> {
        let style = spec.style();
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, (style.width, style.height))
                .into_drawing_area();
            draw(&root, spec)?;
            root.present()?;
        }
        Ok(buffer)
    }
}

impl PlotBackend for PlottersBackend {
    fn render(&self, spec: &ChartSpec<'_>, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Svg => Ok(self.render_svg(spec)?.into_bytes()),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

fn rgb(color: (u8, u8, u8)) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Axis range with a 5% margin; a degenerate range is widened to one unit
fn padded(min: f64, max: f64) -> std::ops::Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span.abs() < f64::EPSILON {
        return (min - 0.5)..(max + 0.5);
    }
    (min - span * 0.05)..(max + span * 0.05)
}

fn draw(root: &DrawingArea<SVGBackend<'_>, Shift>, spec: &ChartSpec<'_>) -> Result<()> {
    let style = spec.style();
    let background = match style.theme {
        Theme::Gray => RGBColor(235, 235, 235),
        Theme::Classic | Theme::Minimal => WHITE,
    };
    root.fill(&WHITE)?;

    let series = spec.series();
    let boxes = if spec.has_geometry(Geometry::Boxplot) {
        spec.box_stats()
    } else {
        Vec::new()
    };
    let categories = spec.x_categories();

    let ys = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.1))
        .chain(boxes.iter().flat_map(|b| [b.lower_whisker, b.upper_whisker]))
        .chain(boxes.iter().flat_map(|b| b.outliers.iter().copied()));
    let (y_min, y_max) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let x_range = match &categories {
        Some(c) => -0.5..(c.len() as f64 - 0.5).max(0.5),
        None => {
            let (lo, hi) = series
                .iter()
                .flat_map(|s| s.points.iter().map(|p| p.0))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            padded(lo, hi)
        }
    };

    let title = spec.display_title();
    let mut chart = ChartBuilder::on(root)
        .caption(&title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, padded(y_min, y_max))?;

    chart.plotting_area().fill(&background)?;

    let category_label = |v: &f64| -> String {
        match &categories {
            Some(c) => {
                let nearest = v.round();
                if (v - nearest).abs() < 1e-6 && nearest >= 0.0 {
                    c.get(nearest as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            }
            None => format!("{:.1}", v),
        }
    };

    let value_label = |v: &f64| format!("{:.1}", v);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(spec.x_label())
            .y_desc(spec.y_label())
            .x_label_formatter(&category_label)
            .y_label_formatter(&value_label);
        if let Some(c) = &categories {
            mesh.x_labels(c.len().max(1));
        }
        match style.theme {
            Theme::Minimal => {
                mesh.disable_mesh();
            }
            Theme::Gray => {
                mesh.light_line_style(WHITE.stroke_width(1))
                    .bold_line_style(WHITE.stroke_width(1));
            }
            Theme::Classic => {}
        }
        mesh.draw()?;
    }

    for (i, b) in boxes.iter().enumerate() {
        let color = rgb(style.color(i));
        let (left, right) = (b.position - 0.3, b.position + 0.3);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(left, b.q1), (right, b.q3)],
                color.mix(0.3).filled(),
            )))?;
        chart
            .draw_series([
                Rectangle::new([(left, b.q1), (right, b.q3)], color.stroke_width(1)),
            ])?;
        let segments = vec![
            vec![(left, b.median), (right, b.median)],
            vec![(b.position, b.q3), (b.position, b.upper_whisker)],
            vec![(b.position, b.q1), (b.position, b.lower_whisker)],
        ];
        chart
            .draw_series(segments.into_iter().map(|p| PathElement::new(p, BLACK.stroke_width(2))))?;
        chart
            .draw_series(
                b.outliers
                    .iter()
                    .map(|&o| Circle::new((b.position, o), 3, BLACK.stroke_width(1))),
            )?;
    }

    for (i, s) in series.iter().enumerate() {
        let color = rgb(style.color(i));
        let label = s.label.clone().unwrap_or_else(|| spec.bindings().y.clone());
        let mut labelled = false;

        if spec.has_geometry(Geometry::Line) {
            let mut sorted = s.points.clone();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
            let drawn = chart
                .draw_series(LineSeries::new(sorted, color))?;
            if !labelled {
                drawn
                    .label(label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                labelled = true;
            }
        }
        if spec.has_geometry(Geometry::Point) {
            let drawn = chart
                .draw_series(s.points.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))?;
            if !labelled {
                drawn
                    .label(label.clone())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
                labelled = true;
            }
        }
        if spec.has_geometry(Geometry::Smooth) {
            if let Some((a, b)) = least_squares(&s.points) {
                let lo = s.points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
                let hi = s.points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
                let drawn = chart
                    .draw_series(LineSeries::new(
                        vec![(lo, a + b * lo), (hi, a + b * hi)],
                        color.stroke_width(2),
                    ))?;
                if !labelled {
                    drawn
                        .label(label)
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                }
            }
        }
    }

    let labelled_series = series.iter().any(|s| s.label.is_some());
    if style.show_legend && labelled_series && !spec.has_geometry(Geometry::Boxplot) {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }
    Ok(())
}
