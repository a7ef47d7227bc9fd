use tracing::{debug, warn};

use crate::model::{DateRange, PriceField, PricePoint, PriceRow, PriceSeries, Symbol, WarningReason};
use crate::source::MarketDataSource;

/// Result of fetching one symbol. Never an error: source failures are
/// folded into `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Series(PriceSeries),
    Empty(WarningReason),
}

/// Fetch one symbol's daily series from `source`.
pub async fn fetch(
    source: &dyn MarketDataSource,
    symbol: &Symbol,
    range: &DateRange,
) -> FetchOutcome {
    match source.get(symbol.as_str(), &range.start, &range.end).await {
        Ok(rows) => match build_series(symbol, rows) {
            Some(series) => FetchOutcome::Series(series),
            None => {
                debug!(symbol = %symbol, range = %range, "source returned no usable rows");
                FetchOutcome::Empty(WarningReason::NoData)
            }
        },
        Err(report) => {
            warn!(
                symbol = %symbol,
                source = source.name(),
                error = ?report,
                "fetch failed, treating symbol as empty"
            );
            FetchOutcome::Empty(WarningReason::Unavailable {
                message: report.current_context().to_string(),
            })
        }
    }
}

/// Clean raw rows into a strictly date-ordered series.
///
/// The adjusted close is used only if every row has one; otherwise the whole
/// series falls back to the raw close.
pub fn build_series(symbol: &Symbol, mut rows: Vec<PriceRow>) -> Option<PriceSeries> {
    // stable sort: the first row seen for a date wins
    rows.sort_by_key(|r| r.date);
    rows.dedup_by_key(|r| r.date);

    let field = if !rows.is_empty() && rows.iter().all(|r| r.adjusted_close.is_some()) {
        PriceField::AdjClose
    } else {
        PriceField::Close
    };

    let points: Vec<PricePoint> = rows
        .iter()
        .filter_map(|r| {
            let price = match field {
                PriceField::AdjClose => r.adjusted_close?,
                PriceField::Close => r.close,
            };
            price.is_finite().then_some(PricePoint {
                date: r.date,
                price,
            })
        })
        .collect();

    if points.is_empty() {
        return None;
    }

    Some(PriceSeries::new(symbol.clone(), field, points))
}
