use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Date format accepted for range bounds (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string into a calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Ticker identifier: trimmed, upper-cased, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize a raw token. Returns `None` when nothing is left after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Requested date range.
///
/// Bounds are kept as the strings the user typed. Whether they parse, and
/// whether `start <= end`, is left to the market-data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Which source column a price series was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PriceField {
    #[serde(rename = "Adj Close")]
    AdjClose,
    #[serde(rename = "Close")]
    Close,
}

impl PriceField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdjClose => "Adj Close",
            Self::Close => "Close",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daily row as delivered by a market-data source, before any cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub close: f64,
    pub adjusted_close: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Daily prices for one symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: Symbol,
    field: PriceField,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, field: PriceField, points: Vec<PricePoint>) -> Self {
        debug_assert!(
            points.windows(2).all(|w| w[0].date < w[1].date),
            "price points must be strictly increasing by date"
        );
        Self {
            symbol,
            field,
            points,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn field(&self) -> PriceField {
        self.field
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AveragePoint {
    pub date: NaiveDate,
    /// `None` until the window has filled.
    pub value: Option<f64>,
}

/// Rolling mean over a price series, aligned to the series' dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverageSeries {
    symbol: Symbol,
    window: usize,
    points: Vec<AveragePoint>,
}

impl MovingAverageSeries {
    pub fn new(symbol: Symbol, window: usize, points: Vec<AveragePoint>) -> Self {
        Self {
            symbol,
            window,
            points,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn points(&self) -> &[AveragePoint] {
        &self.points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    Price { field: PriceField },
    MovingAverage { window: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A labeled, renderable line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLine {
    pub symbol: Symbol,
    pub label: String,
    pub kind: LineKind,
    pub points: Vec<ChartPoint>,
}

impl ChartLine {
    /// Raw price line, labeled `"{symbol} {field}"`.
    pub fn from_price_series(series: &PriceSeries) -> Self {
        Self {
            symbol: series.symbol().clone(),
            label: format!("{} {}", series.symbol(), series.field()),
            kind: LineKind::Price {
                field: series.field(),
            },
            points: series
                .points()
                .iter()
                .map(|p| ChartPoint {
                    date: p.date,
                    value: p.price,
                })
                .collect(),
        }
    }

    /// Moving-average line, labeled `"{symbol} MA{window}"`. Undefined
    /// positions are left out.
    pub fn from_moving_average(series: &MovingAverageSeries) -> Self {
        Self {
            symbol: series.symbol().clone(),
            label: format!("{} MA{}", series.symbol(), series.window()),
            kind: LineKind::MovingAverage {
                window: series.window(),
            },
            points: series
                .points()
                .iter()
                .filter_map(|p| {
                    p.value.map(|value| ChartPoint {
                        date: p.date,
                        value,
                    })
                })
                .collect(),
        }
    }
}

/// Why a symbol contributed no lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum WarningReason {
    NoData,
    Unavailable { message: String },
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "no data"),
            Self::Unavailable { message } => write!(f, "source unavailable: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolWarning {
    pub symbol: Symbol,
    #[serde(flatten)]
    pub reason: WarningReason,
}

impl fmt::Display for SymbolWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol, self.reason)
    }
}

/// Everything a renderer needs: ordered lines plus per-symbol warnings.
///
/// Always holds at least one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    lines: Vec<ChartLine>,
    warnings: Vec<SymbolWarning>,
}

impl ChartDataset {
    /// Returns `None` when `lines` is empty.
    pub fn new(lines: Vec<ChartLine>, warnings: Vec<SymbolWarning>) -> Option<Self> {
        if lines.is_empty() {
            return None;
        }
        Some(Self { lines, warnings })
    }

    pub fn lines(&self) -> &[ChartLine] {
        &self.lines
    }

    pub fn warnings(&self) -> &[SymbolWarning] {
        &self.warnings
    }

    pub fn labels(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.label.as_str()).collect()
    }
}
