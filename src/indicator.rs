pub mod ma;

use crate::model::PriceSeries;

/// Extract prices from a series, oldest first.
pub fn prices(series: &PriceSeries) -> Vec<f64> {
    series.points().iter().map(|p| p.price).collect()
}
