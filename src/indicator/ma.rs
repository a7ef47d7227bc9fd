use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::prices;
use crate::model::{AveragePoint, MovingAverageSeries, PriceSeries};

/// Simple Moving Average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sma {
    window: usize,
}

impl Sma {
    pub fn new(window: usize) -> Result<Self, Report<IndicatorError>> {
        if window == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "window must be > 0".into(),
            });
        }
        Ok(Self { window })
    }

    /// Trailing means, one slot per input price. The first `window - 1`
    /// slots are `None`, as is every slot when there are fewer prices than
    /// the window.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut values = vec![None; prices.len().min(self.window - 1)];
        values.extend(
            prices
                .windows(self.window)
                .map(|w| Some(w.iter().sum::<f64>() / self.window as f64)),
        );
        values
    }

    pub fn calculate(&self, series: &PriceSeries) -> MovingAverageSeries {
        let values = self.calculate_prices(&prices(series));
        let points = series
            .points()
            .iter()
            .zip(values)
            .map(|(p, value)| AveragePoint {
                date: p.date,
                value,
            })
            .collect();
        MovingAverageSeries::new(series.symbol().clone(), self.window, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PriceField, PricePoint, Symbol};
    use crate::source::fixture::day;

    fn moving_average(series: &PriceSeries, window: usize) -> MovingAverageSeries {
        Sma::new(window).unwrap().calculate(series)
    }

    fn defined_len(ma: &MovingAverageSeries) -> usize {
        ma.points().iter().filter(|p| p.value.is_some()).count()
    }

    fn series_from_prices(prices: &[f64]) -> PriceSeries {
        PriceSeries::new(
            Symbol::parse("TEST").unwrap(),
            PriceField::Close,
            prices
                .iter()
                .enumerate()
                .map(|(i, &price)| PricePoint {
                    date: day(i),
                    price,
                })
                .collect(),
        )
    }

    #[test]
    fn sma_window_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_known_value() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate_prices(&[1.0, 2.0, 3.0, 4.0]);
        // (1+2+3)/3 = 2.0, (2+3+4)/3 = 3.0
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert!((values[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((values[3].unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn sma_flat_prices() {
        let ma = moving_average(&series_from_prices(&[10.0; 5]), 3);
        assert_eq!(defined_len(&ma), 3);
        for p in ma.points().iter().filter_map(|p| p.value) {
            assert!((p - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn window_one_is_identity() {
        let prices = [3.0, 1.5, 8.25];
        let values = Sma::new(1).unwrap().calculate_prices(&prices);
        assert_eq!(values, vec![Some(3.0), Some(1.5), Some(8.25)]);
    }

    #[test]
    fn shorter_series_is_all_undefined() {
        let ma = moving_average(&series_from_prices(&[1.0; 4]), 5);
        assert_eq!(ma.points().len(), 4);
        assert_eq!(defined_len(&ma), 0);
    }

    #[test]
    fn defined_count_and_values_match_trailing_slices() {
        let prices: Vec<f64> = (0..60).map(|i| ((i * 37) % 11) as f64 + 0.25 * i as f64).collect();
        let series = series_from_prices(&prices);
        for window in [1, 2, 7, 20, 50, 60] {
            let ma = moving_average(&series, window);
            assert_eq!(ma.points().len(), prices.len());
            assert_eq!(defined_len(&ma), prices.len() - window + 1, "window {window}");
            for (i, point) in ma.points().iter().enumerate() {
                assert_eq!(point.date, day(i));
                if i + 1 < window {
                    assert_eq!(point.value, None, "window {window} index {i}");
                } else {
                    let slice = &prices[i + 1 - window..=i];
                    let expected = slice.iter().sum::<f64>() / window as f64;
                    assert!((point.value.unwrap() - expected).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn result_carries_symbol_and_window() {
        let ma = moving_average(&series_from_prices(&[1.0, 2.0]), 2);
        assert_eq!(ma.symbol().as_str(), "TEST");
        assert_eq!(ma.window(), 2);
    }
}
