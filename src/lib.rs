//! # statframe
//!
//! Tabular wrangling and exploratory analysis: read delimited text into a
//! typed [`DataFrame`], convert columns between types, partition rows by key
//! columns, describe charts for a plotting backend, and fit linear models
//! with ANOVA tables and residual diagnostics.
//!
//! ```no_run
//! use statframe::io::{read_csv, CsvReadOptions, LocalFileSystem};
//! use statframe::stats::{anova, diagnose, fit_formula, Formula};
//!
//! # fn main() -> statframe::Result<()> {
//! let fs = LocalFileSystem::new("data");
//! let mut df = read_csv(&fs, "tooth_growth.csv", &CsvReadOptions::default())?;
//! df.to_categorical("supp")?;
//! df.coerce("dose", statframe::ColumnType::Categorical)?;
//!
//! let model = fit_formula(&df, &Formula::parse("len ~ supp * dose")?)?;
//! println!("{}", anova(&model));
//! println!("{:?}", diagnose(&model).summary);
//! # Ok(())
//! # }
//! ```

pub mod column;
pub mod config;
pub mod dataframe;
pub mod error;
pub mod groupby;
pub mod io;
pub mod stats;
pub mod vis;

// Re-export commonly used types
pub use column::{Categorical, Column, ColumnData, ColumnType, LevelOrder, Value};
pub use config::PipelineConfig;
pub use dataframe::DataFrame;
pub use error::{Error, Result, StatFrameError};
pub use groupby::{group_by, ungroup, GroupKey, GroupPartition};
pub use stats::{anova, diagnose, fit, fit_formula, fit_with, FitOptions, Formula, LinearModel, Term};
pub use vis::{build_chart, ChannelBindings, ChartSpec, ChartStyle, Geometry, OutputFormat, PlotBackend};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
