use std::path::Path;

use error_stack::{Report, ResultExt, bail};
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use crate::config::{MIN_IMAGE_HEIGHT, MIN_IMAGE_WIDTH};
use crate::error::RenderError;
use crate::model::LineKind;
use crate::render::{Bounds, Chart, date_label};

const FONT_FAMILY: &str = "sans-serif";
const FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Draws the chart as a PNG image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapRenderer {
    width: u32,
    height: u32,
}

impl BitmapRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render `chart` and write it to `path`. The file is only created once
    /// the chart has been checked for drawable points.
    pub fn save(&self, chart: &Chart, path: &Path) -> Result<(), Report<RenderError>> {
        if self.width < MIN_IMAGE_WIDTH || self.height < MIN_IMAGE_HEIGHT {
            bail!(RenderError::AreaTooSmall {
                width: self.width,
                height: self.height,
            });
        }

        let data = chart.plot_data();
        let Some(bounds) = Bounds::of(&data) else {
            bail!(RenderError::EmptyDataset);
        };

        register_font(FONT_FAMILY, FontStyle::Normal, FONT)
            .map_err(|_| Report::new(RenderError::Font))?;

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).change_context(RenderError::Draw)?;

        let mut plot = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT_FAMILY, 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(64)
            .build_cartesian_2d(bounds.x_min..bounds.x_max, bounds.y_min..bounds.y_max)
            .change_context(RenderError::Draw)?;

        plot.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_labels(6)
            .x_label_formatter(&|x| date_label(*x))
            .y_label_formatter(&|y| format!("{y:.2}"))
            .draw()
            .change_context(RenderError::Draw)?;

        for (i, (line, points)) in chart.dataset.lines().iter().zip(&data).enumerate() {
            let style = line_style(i, line.kind);
            plot.draw_series(LineSeries::new(points.iter().copied(), style))
                .change_context(RenderError::Draw)?
                .label(line.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        plot.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .change_context(RenderError::Draw)?;

        root.present()
            .change_context(RenderError::Draw)
            .attach_with(|| format!("path: {}", path.display()))?;
        Ok(())
    }
}

fn line_style(index: usize, kind: LineKind) -> ShapeStyle {
    let color = Palette99::pick(index).to_rgba();
    match kind {
        LineKind::Price { .. } => color.stroke_width(2),
        LineKind::MovingAverage { .. } => color.stroke_width(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChartDataset, ChartLine, ChartPoint, PriceField, Symbol};
    use crate::source::fixture::day;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn chart(values: &[f64], average: &[f64]) -> Chart {
        let symbol = Symbol::parse("AAPL").unwrap();
        let points = |values: &[f64], offset: usize| {
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| ChartPoint {
                    date: day(i + offset),
                    value,
                })
                .collect::<Vec<_>>()
        };
        let lines = vec![
            ChartLine {
                symbol: symbol.clone(),
                label: "AAPL Close".into(),
                kind: LineKind::Price {
                    field: PriceField::Close,
                },
                points: points(values, 0),
            },
            ChartLine {
                symbol: symbol.clone(),
                label: "AAPL MA20".into(),
                kind: LineKind::MovingAverage { window: 20 },
                points: points(average, 19),
            },
        ];
        Chart::new(&[symbol], ChartDataset::new(lines, Vec::new()).unwrap())
    }

    #[test]
    fn writes_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();

        BitmapRenderer::new(640, 320)
            .save(&chart(&values, &values[19..]), &path)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn empty_average_line_still_draws() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.png");

        BitmapRenderer::new(640, 320)
            .save(&chart(&[42.0], &[]), &path)
            .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn no_points_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");

        let err = BitmapRenderer::new(640, 320)
            .save(&chart(&[], &[]), &path)
            .unwrap_err();

        assert!(matches!(err.current_context(), RenderError::EmptyDataset));
        assert!(!path.exists());
    }

    #[test]
    fn tiny_image_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = BitmapRenderer::new(50, 50)
            .save(&chart(&[1.0], &[]), &dir.path().join("tiny.png"))
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            RenderError::AreaTooSmall { .. }
        ));
    }
}
