use std::sync::Arc;

use error_stack::Report;
use futures::{StreamExt, stream};
use tracing::{info, warn};

use crate::error::{IndicatorError, PipelineError};
use crate::indicator::ma::Sma;
use crate::model::{ChartDataset, ChartLine, DateRange, Symbol, SymbolWarning};
use crate::retrieval::{self, FetchOutcome};
use crate::source::MarketDataSource;

/// Moving-average windows drawn when the caller opts in.
pub const DEFAULT_MA_WINDOWS: [usize; 2] = [20, 50];

/// Builds a [`ChartDataset`] from a list of symbols.
///
/// Fetches run concurrently up to `max_concurrent`, but lines are always
/// assembled in input order: each symbol's price line, then its averages.
pub struct Composer {
    source: Arc<dyn MarketDataSource>,
    averages: Vec<Sma>,
    max_concurrent: usize,
}

impl Composer {
    /// One moving average per entry in `windows`, one fetch at a time.
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        windows: &[usize],
    ) -> Result<Self, Report<IndicatorError>> {
        let averages = windows
            .iter()
            .map(|&window| Sma::new(window))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            source,
            averages,
            max_concurrent: 1,
        })
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub async fn compose(
        &self,
        symbols: &[Symbol],
        range: &DateRange,
        show_moving_averages: bool,
    ) -> Result<ChartDataset, Report<PipelineError>> {
        // `buffered` yields in input order regardless of completion order
        let outcomes: Vec<FetchOutcome> = stream::iter(symbols)
            .map(|symbol| retrieval::fetch(self.source.as_ref(), symbol, range))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut lines = Vec::new();
        let mut warnings = Vec::new();

        for (symbol, outcome) in symbols.iter().zip(outcomes) {
            match outcome {
                FetchOutcome::Empty(reason) => {
                    warn!(symbol = %symbol, reason = %reason, "no data for symbol");
                    warnings.push(SymbolWarning {
                        symbol: symbol.clone(),
                        reason,
                    });
                }
                FetchOutcome::Series(series) => {
                    info!(
                        symbol = %symbol,
                        rows = series.points().len(),
                        field = %series.field(),
                        "price series retrieved"
                    );
                    lines.push(ChartLine::from_price_series(&series));
                    if show_moving_averages {
                        lines.extend(
                            self.averages
                                .iter()
                                .map(|sma| ChartLine::from_moving_average(&sma.calculate(&series))),
                        );
                    }
                }
            }
        }

        info!(
            symbols = symbols.len(),
            lines = lines.len(),
            warnings = warnings.len(),
            "dataset composed"
        );

        let skipped = warnings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        ChartDataset::new(lines, warnings).ok_or_else(|| {
            Report::new(PipelineError::AggregateFailure {
                attempted: symbols.len(),
            })
            .attach(format!("skipped: {skipped}"))
        })
    }
}
