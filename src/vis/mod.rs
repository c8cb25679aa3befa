//! Chart specifications and rendering backends
//!
//! The chart builder validates bindings and produces a [`ChartSpec`]. Image
//! bytes come only from a [`PlotBackend`]:
//!
//! - [`TextBackend`] draws into a character grid for quick terminal checks
//! - `PlottersBackend` (feature `visualization`) renders SVG through `plotters`

pub mod backend;
pub mod geom;
#[cfg(feature = "visualization")]
pub mod plotters_backend;
pub mod spec;
pub mod text;

pub use self::backend::{save_chart, OutputFormat, PlotBackend};
pub use self::geom::{BoxStats, SeriesPoints};
#[cfg(feature = "visualization")]
pub use self::plotters_backend::PlottersBackend;
pub use self::spec::{
    build_chart, build_group_charts, quick_look, ChannelBindings, ChartSpec, ChartStyle, Geometry,
    Theme,
};
pub use self::text::TextBackend;
