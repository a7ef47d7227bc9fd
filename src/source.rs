#[cfg(test)]
pub mod fixture;
pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::SourceError;
use crate::model::PriceRow;

/// External provider of historical daily prices.
///
/// Treated as unreliable: callers must turn any error into a per-symbol
/// warning rather than abort. Uses `BoxFuture` so the trait stays
/// object-safe (`dyn MarketDataSource`).
pub trait MarketDataSource: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Fetch daily rows for `symbol` between the raw `start` and `end` date
    /// strings. Rows may arrive unsorted; an unusable range yields no rows.
    fn get(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
    ) -> BoxFuture<'_, Result<Vec<PriceRow>, Report<SourceError>>>;
}
