use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::fs::FileSystem;
use crate::vis::spec::ChartSpec;

/// Artifact format requested from a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// UTF-8 terminal rendering
    Text,
    Svg,
    Png,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        };
        f.write_str(name)
    }
}

/// Turns a chart specification into artifact bytes
pub trait PlotBackend {
    /// Render `spec` in `format`; unsupported formats fail with `UnsupportedFormat`
    fn render(&self, spec: &ChartSpec<'_>, format: OutputFormat) -> Result<Vec<u8>>;
}

/// Render a chart and write it as the named artifact
pub fn save_chart(
    backend: &dyn PlotBackend,
    spec: &ChartSpec<'_>,
    format: OutputFormat,
    fs: &mut dyn FileSystem,
    name: &str,
) -> Result<()> {
    let bytes = backend.render(spec, format)?;
    log::debug!("rendered '{}' as {} ({} bytes)", spec.display_title(), format, bytes.len());
    fs.write(name, &bytes)
}
