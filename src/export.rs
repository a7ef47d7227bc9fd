use std::fmt;
use std::path::Path;

use error_stack::{Report, ResultExt};
use tracing::info;

use crate::error::ExportError;
use crate::render::bitmap::BitmapRenderer;
use crate::render::{Chart, RenderedChart};

/// File format chosen from the output path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// The rendered chart rows.
    Text,
    /// Title, axis labels and the full dataset.
    Json,
    /// Raster image of the chart.
    Png,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, Report<ExportError>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "png" => Ok(Self::Png),
            _ => Err(Report::new(ExportError::UnsupportedFormat { extension })
                .attach(format!("path: {}", path.display()))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Png => write!(f, "png"),
        }
    }
}

/// Writes a chart somewhere the user asked for.
pub trait ChartExporter: Send + Sync {
    fn export(
        &self,
        chart: &Chart,
        rendered: &RenderedChart,
        path: &Path,
    ) -> Result<(), Report<ExportError>>;
}

/// Writes to the local filesystem, format chosen by extension.
pub struct FileExporter {
    image: BitmapRenderer,
}

impl FileExporter {
    pub fn new(image: BitmapRenderer) -> Self {
        Self { image }
    }
}

impl ChartExporter for FileExporter {
    fn export(
        &self,
        chart: &Chart,
        rendered: &RenderedChart,
        path: &Path,
    ) -> Result<(), Report<ExportError>> {
        let format = ExportFormat::from_path(path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .change_context(ExportError::Write)
                .attach_with(|| format!("cannot create directory: {}", parent.display()))?;
        }

        match format {
            ExportFormat::Text => write_file(path, rendered.to_text() + "\n")?,
            ExportFormat::Json => {
                let json =
                    serde_json::to_string_pretty(chart).change_context(ExportError::Serialize)?;
                write_file(path, json)?;
            }
            ExportFormat::Png => self
                .image
                .save(chart, path)
                .change_context(ExportError::Render)?,
        }

        info!(path = %path.display(), format = %format, "chart exported");
        Ok(())
    }
}

fn write_file(path: &Path, contents: String) -> Result<(), Report<ExportError>> {
    std::fs::write(path, contents)
        .change_context(ExportError::Write)
        .attach_with(|| format!("path: {}", path.display()))
}
