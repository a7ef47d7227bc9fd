pub mod bitmap;
pub mod terminal;

use chrono::{Datelike, NaiveDate};
use error_stack::Report;
use serde::Serialize;

use crate::error::RenderError;
use crate::model::{ChartDataset, DATE_FORMAT, Symbol};

pub const X_AXIS_LABEL: &str = "Date";
pub const Y_AXIS_LABEL: &str = "Price (USD)";

const Y_PADDING_RATIO: f64 = 0.05;

/// A dataset plus the presentation text around it.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub dataset: ChartDataset,
}

impl Chart {
    pub fn new(symbols: &[Symbol], dataset: ChartDataset) -> Self {
        Self {
            title: chart_title(symbols),
            x_label: X_AXIS_LABEL.into(),
            y_label: Y_AXIS_LABEL.into(),
            dataset,
        }
    }

    /// Every line as `(x, price)` pairs, x being days since the common era.
    fn plot_data(&self) -> Vec<Vec<(f64, f64)>> {
        self.dataset
            .lines()
            .iter()
            .map(|line| {
                line.points
                    .iter()
                    .map(|p| (x_coord(p.date), p.value))
                    .collect()
            })
            .collect()
    }
}

pub fn chart_title(symbols: &[Symbol]) -> String {
    let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
    format!("Stock Price Comparison: {}", names.join(", "))
}

/// Output of a renderer: rows of text, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    rows: Vec<String>,
}

impl RenderedChart {
    pub fn new(rows: Vec<String>) -> Self {
        Self { rows }
    }

    pub fn to_text(&self) -> String {
        self.rows.join("\n")
    }
}

/// Turns a chart into something a user can look at.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &Chart) -> Result<RenderedChart, Report<RenderError>>;
}

fn x_coord(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn date_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Axis bounds over every plotted point.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Bounds {
    fn of(data: &[Vec<(f64, f64)>]) -> Option<Self> {
        let mut points = data.iter().flatten();
        let &(x0, y0) = points.next()?;
        let mut bounds = Self {
            x_min: x0,
            x_max: x0,
            y_min: y0,
            y_max: y0,
        };
        for &(x, y) in points {
            bounds.x_min = bounds.x_min.min(x);
            bounds.x_max = bounds.x_max.max(x);
            bounds.y_min = bounds.y_min.min(y);
            bounds.y_max = bounds.y_max.max(y);
        }

        if bounds.x_max - bounds.x_min < 1.0 {
            bounds.x_max = bounds.x_min + 1.0;
        }

        let y_range = bounds.y_max - bounds.y_min;
        let pad = if y_range > 0.0 {
            y_range * Y_PADDING_RATIO
        } else {
            bounds.y_max.abs().max(1.0) * Y_PADDING_RATIO
        };
        bounds.y_min -= pad;
        bounds.y_max += pad;

        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixture::day;

    #[test]
    fn title_joins_symbols_in_order() {
        let symbols: Vec<Symbol> = ["MSFT", "AAPL", "MSFT"]
            .iter()
            .map(|s| Symbol::parse(s).unwrap())
            .collect();
        assert_eq!(
            chart_title(&symbols),
            "Stock Price Comparison: MSFT, AAPL, MSFT"
        );
    }

    #[test]
    fn rendered_chart_text_joins_rows() {
        let rendered = RenderedChart::new(vec!["a".into(), "b".into()]);
        assert_eq!(rendered.to_text(), "a\nb");
    }

    #[test]
    fn bounds_pad_the_price_axis() {
        let bounds = Bounds::of(&[vec![(1.0, 10.0), (3.0, 20.0)], vec![(2.0, 15.0)]]).unwrap();
        assert_eq!(bounds.x_min, 1.0);
        assert_eq!(bounds.x_max, 3.0);
        assert!((bounds.y_min - 9.5).abs() < 1e-9);
        assert!((bounds.y_max - 20.5).abs() < 1e-9);
        assert!(Bounds::of(&[Vec::new()]).is_none());
    }

    #[test]
    fn single_point_bounds_are_widened() {
        let bounds = Bounds::of(&[vec![(5.0, 100.0)]]).unwrap();
        assert_eq!(bounds.x_max - bounds.x_min, 1.0);
        assert!(bounds.y_min < 100.0 && bounds.y_max > 100.0);
    }

    #[test]
    fn date_labels_round_trip_through_axis_coordinates() {
        assert_eq!(date_label(x_coord(day(0))), "2023-01-02");
        assert_eq!(date_label(x_coord(day(30))), "2023-02-01");
    }
}
