//! Pipeline configuration
//!
//! One serde document bundles the ingestion, model and chart settings. It
//! can be written as TOML, YAML or JSON:
//!
//! ```toml
//! [csv]
//! delimiter = ";"
//! na_values = ["", "NA", "-"]
//!
//! [csv.column_types]
//! supp = "categorical"
//!
//! [fit]
//! intercept = true
//! solver = "qr"
//!
//! [fit.reference_levels]
//! supp = "VC"
//!
//! [chart]
//! theme = "minimal"
//! width = 640
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::column::ColumnType;
use crate::error::{Error, Result};
use crate::io::{CsvReadOptions, FileSystem, NA_TOKEN};
use crate::stats::{FitOptions, Solver};
use crate::vis::ChartStyle;

/// Ingestion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSettings {
    /// Single-character field separator
    pub delimiter: String,
    pub na_values: Vec<String>,
    pub trim: bool,
    pub column_types: IndexMap<String, ColumnType>,
}

impl Default for CsvSettings {
    fn default() -> Self {
        CsvSettings {
            delimiter: ",".to_string(),
            na_values: vec![String::new(), NA_TOKEN.to_string()],
            trim: true,
            column_types: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    Qr,
    ConjugateGradient,
}

/// Model fitting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    pub intercept: bool,
    pub solver: SolverKind,
    /// Iteration budget for the conjugate gradient solver
    pub max_iterations: usize,
    pub tolerance: f64,
    pub reference_levels: IndexMap<String, String>,
}

impl Default for FitSettings {
    fn default() -> Self {
        FitSettings {
            intercept: true,
            solver: SolverKind::Qr,
            max_iterations: 1000,
            tolerance: 1e-10,
            reference_levels: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub csv: CsvSettings,
    pub fit: FitSettings,
    pub chart: ChartStyle,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(text)
            .map_err(|e| Error::Config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(text)
            .map_err(|e| Error::Config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the provider, choosing the format by file extension
    pub fn load(fs: &dyn FileSystem, name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let text = fs.read(name)?;
        log::debug!("loading pipeline configuration from {}", name);
        match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(Error::Config(format!(
                "cannot tell the format of '{}'; use .toml, .yaml or .json",
                name
            ))),
        }
    }

    /// Serialize as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        self.delimiter()?;
        if self.fit.solver == SolverKind::ConjugateGradient {
            if self.fit.max_iterations == 0 {
                return Err(Error::Config(
                    "max_iterations must be positive".to_string(),
                ));
            }
            if !(self.fit.tolerance.is_finite() && self.fit.tolerance > 0.0) {
                return Err(Error::Config(
                    "tolerance must be a positive number".to_string(),
                ));
            }
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(Error::Config("chart size must be non-zero".to_string()));
        }
        Ok(())
    }

    fn delimiter(&self) -> Result<u8> {
        match self.csv.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(Error::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.csv.delimiter
            ))),
        }
    }

    /// Reader options for [`read_csv`](crate::io::read_csv)
    pub fn csv_options(&self) -> Result<CsvReadOptions> {
        let mut options = CsvReadOptions::default()
            .with_delimiter(self.delimiter()?)
            .with_na_values(self.csv.na_values.iter().cloned())
            .with_trim(self.csv.trim);
        for (column, column_type) in &self.csv.column_types {
            options = options.with_column_type(column.clone(), *column_type);
        }
        Ok(options)
    }

    /// Options for [`fit_with`](crate::stats::fit_with)
    pub fn fit_options(&self) -> FitOptions {
        let solver = match self.fit.solver {
            SolverKind::Qr => Solver::Qr,
            SolverKind::ConjugateGradient => Solver::ConjugateGradient {
                max_iterations: self.fit.max_iterations,
                tolerance: self.fit.tolerance,
            },
        };
        let mut options = FitOptions::default()
            .with_intercept(self.fit.intercept)
            .with_solver(solver);
        for (column, level) in &self.fit.reference_levels {
            options = options.with_reference_level(column.clone(), level.clone());
        }
        options
    }
}
