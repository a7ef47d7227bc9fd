use error_stack::{Report, bail};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{
    Axis, Block, Borders, Chart as ChartWidget, Dataset, GraphType, LegendPosition, Widget,
};

use crate::config::{MIN_CHART_HEIGHT, MIN_CHART_WIDTH};
use crate::error::RenderError;
use crate::model::LineKind;
use crate::render::{Bounds, Chart, ChartRenderer, RenderedChart, date_label};

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

/// Draws the chart into an off-screen character-cell buffer.
pub struct TerminalRenderer {
    width: u16,
    height: u16,
}

impl TerminalRenderer {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl ChartRenderer for TerminalRenderer {
    fn render(&self, chart: &Chart) -> Result<RenderedChart, Report<RenderError>> {
        if self.width < MIN_CHART_WIDTH || self.height < MIN_CHART_HEIGHT {
            bail!(RenderError::AreaTooSmall {
                width: self.width.into(),
                height: self.height.into(),
            });
        }

        let lines = chart.dataset.lines();
        let data = chart.plot_data();

        let Some(bounds) = Bounds::of(&data) else {
            bail!(RenderError::EmptyDataset);
        };

        let datasets: Vec<Dataset> = lines
            .iter()
            .zip(&data)
            .enumerate()
            .map(|(i, (line, points))| {
                Dataset::default()
                    .name(line.label.clone())
                    .marker(marker_for(line.kind))
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                    .data(points)
            })
            .collect();

        let (x_labels, y_labels) = axis_labels(&bounds);
        let widget = ChartWidget::new(datasets)
            .block(
                Block::default()
                    .title(format!(" {} ", chart.title))
                    .borders(Borders::ALL),
            )
            .x_axis(
                Axis::default()
                    .title(chart.x_label.as_str())
                    .bounds([bounds.x_min, bounds.x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title(chart.y_label.as_str())
                    .bounds([bounds.y_min, bounds.y_max])
                    .labels(y_labels),
            )
            .legend_position(Some(LegendPosition::TopLeft))
            .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));

        let area = Rect::new(0, 0, self.width, self.height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        Ok(RenderedChart::new(buffer_rows(&buf)))
    }
}

fn marker_for(kind: LineKind) -> Marker {
    match kind {
        LineKind::Price { .. } => Marker::Braille,
        LineKind::MovingAverage { .. } => Marker::Dot,
    }
}

fn buffer_rows(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            let row: String = (area.left()..area.right())
                .filter_map(|x| buf.cell((x, y)).map(|cell| cell.symbol()))
                .collect();
            row.trim_end().to_owned()
        })
        .collect()
}

fn axis_labels(bounds: &Bounds) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
    let x = [bounds.x_min, (bounds.x_min + bounds.x_max) / 2.0, bounds.x_max]
        .into_iter()
        .map(|x| Span::raw(date_label(x)))
        .collect();
    let y = [bounds.y_min, (bounds.y_min + bounds.y_max) / 2.0, bounds.y_max]
        .into_iter()
        .map(|y| Span::raw(format!("{y:.2}")))
        .collect();
    (x, y)
}
